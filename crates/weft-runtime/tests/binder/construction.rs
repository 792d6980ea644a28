use weft_runtime::{Backend, BindError, BindMode, BinderOptions, ErrorKind};
use weft_sdk::{HostError, Value};

use crate::harness::{fixture, Recorder, Sealed};

#[test]
fn test_default_and_overloaded_constructors() {
    let fx = fixture();
    for binder in fx.binders() {
        let plain = binder.create_instance(fx.recorder, &[]).unwrap();
        assert_eq!(plain.downcast_ref::<Recorder>().unwrap().recorded, None);

        let seeded = binder.create_instance(fx.recorder, &[Value::Int(4)]).unwrap();
        assert_eq!(seeded.downcast_ref::<Recorder>().unwrap().recorded, Some(4));
    }
}

#[test]
fn test_no_matching_constructor() {
    let fx = fixture();
    for binder in fx.binders() {
        let err = binder
            .create_instance(fx.recorder, &[Value::str("four")])
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::MissingConstructor));
    }
}

#[test]
fn test_unresolved_type() {
    let fx = fixture();
    for binder in fx.binders() {
        let err = binder.create_instance(fx.unknown, &[]).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::UnresolvedType));
    }
}

#[test]
fn test_private_default_constructor_is_reachable() {
    let fx = fixture();
    for binder in fx.binders() {
        let sealed = binder.create_instance(fx.sealed, &[]).unwrap();
        assert_eq!(sealed.downcast_ref::<Sealed>().unwrap().value, 0);
    }
}

#[test]
fn test_internal_constructor_needs_owner_rights() {
    let fx = fixture();
    for binder in fx.binders() {
        let result = binder.create_instance(fx.sealed, &[Value::Int(9)]);
        match binder.backend() {
            Backend::Reflective => {
                assert_eq!(result.unwrap_err().kind(), Some(ErrorKind::MissingConstructor));
            }
            Backend::Compiling => {
                let sealed = result.unwrap();
                assert_eq!(sealed.downcast_ref::<Sealed>().unwrap().value, 9);
            }
        }
    }
}

#[test]
fn test_panicking_constructor_is_wrapped() {
    let fx = fixture();
    for binder in fx.binders() {
        let err = binder.create_instance(fx.exploding, &[]).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Construction));
        assert!(matches!(err.cause(), Some(HostError::Panic(msg)) if msg.contains("exploded")));
    }
}

#[test]
fn test_factory_method() {
    let fx = fixture();
    for binder in fx.binders() {
        let made = binder
            .create_with_factory_method(fx.recorder, "Create", &[Value::Int(12)])
            .unwrap();
        assert_eq!(made.downcast_ref::<Recorder>().unwrap().recorded, Some(12));
    }
}

#[test]
fn test_factory_with_trailing_arguments() {
    let fx = fixture();
    for binder in fx.binders() {
        let sum = binder
            .create_with_factory_method(
                fx.recorder,
                "Sum",
                &[Value::Int(1), Value::Int(2), Value::Int(3)],
            )
            .unwrap();
        assert_eq!(sum, Value::Int(6));
    }
}

#[test]
fn test_factory_failures() {
    let fx = fixture();
    for binder in fx.binders() {
        let missing = binder
            .create_with_factory_method(fx.recorder, "Fabricate", &[])
            .unwrap_err();
        assert_eq!(missing.kind(), Some(ErrorKind::MissingFactoryMethod));

        let null = binder
            .create_with_factory_method(fx.recorder, "Nothing", &[])
            .unwrap_err();
        assert_eq!(null.kind(), Some(ErrorKind::FactoryReturnedNull));

        let broken = binder
            .create_with_factory_method(fx.recorder, "Broken", &[])
            .unwrap_err();
        assert_eq!(broken.kind(), Some(ErrorKind::MethodInvocation));
        assert_eq!(broken.cause(), Some(&HostError::Failed("factory broke".to_string())));
    }
}

#[test]
fn test_errors_carry_mode_and_subject() {
    let fx = fixture();
    for binder in fx.binders() {
        let err = binder
            .create_instance(fx.recorder, &[Value::Bool(true)])
            .unwrap_err();
        assert_eq!(err.mode(), Some(binder.mode()));
        match err {
            BindError::Wrapped(wrapped) => assert_eq!(wrapped.subject, "app.Recorder"),
            other => panic!("expected a wrapped error, got {:?}", other),
        }
    }
}

#[test]
fn test_graph_building_reports_writing_and_serializing_reports_reading() {
    let fx = fixture();
    let fragile = fx.member(fx.recorder, "Fragile");

    for builder in fx.binders_with(BinderOptions::default()) {
        assert_eq!(builder.mode(), BindMode::Write);
        let err = builder.create_instance(fx.exploding, &[]).unwrap_err();
        assert_eq!(err.mode(), Some(BindMode::Write));
        assert!(err.to_string().contains("while writing"));
    }

    for serializer in fx.binders_with(BinderOptions::new(BindMode::Read)) {
        let recorder = serializer.create_instance(fx.recorder, &[]).unwrap();
        let err = serializer.should_serialize(&recorder, &fragile).unwrap_err();
        assert_eq!(err.mode(), Some(BindMode::Read));
        assert!(err.to_string().contains("while reading"));
    }
}
