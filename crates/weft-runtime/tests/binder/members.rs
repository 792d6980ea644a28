use std::sync::Arc;

use weft_runtime::{Backend, BindError, ErrorKind};
use weft_schema::{MemberDescriptor, ShouldSerialize};
use weft_sdk::{HostError, SourceLocation, Value};

use crate::harness::{fixture, Recorder};

#[test]
fn test_get_and_set_property() {
    let fx = fixture();
    let title = fx.member(fx.recorder, "Title");
    for binder in fx.binders() {
        let recorder = binder.create_instance(fx.recorder, &[]).unwrap();
        binder.set_value(&recorder, &title, &Value::str("Main")).unwrap();
        assert_eq!(binder.get_value(&recorder, &title, true).unwrap(), Value::str("Main"));
        assert_eq!(*recorder.downcast_ref::<Recorder>().unwrap().title.lock(), "Main");
    }
}

#[test]
fn test_set_rejects_wrong_value_type() {
    let fx = fixture();
    let title = fx.member(fx.recorder, "Title");
    for binder in fx.binders() {
        let recorder = binder.create_instance(fx.recorder, &[]).unwrap();
        let err = binder.set_value(&recorder, &title, &Value::Int(3)).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::SetValue));
        assert!(matches!(err.cause(), Some(HostError::InvalidCast { .. })));
    }
}

#[test]
fn test_write_only_member() {
    let fx = fixture();
    let secret = fx.member(fx.recorder, "Secret");
    for binder in fx.binders() {
        let recorder = binder.create_instance(fx.recorder, &[]).unwrap();
        binder.set_value(&recorder, &secret, &Value::str("hunter2")).unwrap();

        assert_eq!(binder.get_value(&recorder, &secret, false).unwrap(), Value::Null);

        let err = binder.get_value(&recorder, &secret, true).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::GetValue));
        assert!(matches!(err.cause(), Some(HostError::NotSupported(_))));
    }
}

#[test]
fn test_read_only_member() {
    let fx = fixture();
    let recorded = fx.member(fx.recorder, "Recorded");
    for binder in fx.binders() {
        let recorder = binder.create_instance(fx.recorder, &[Value::Int(2)]).unwrap();
        assert_eq!(binder.get_value(&recorder, &recorded, true).unwrap(), Value::Int(2));

        let err = binder.set_value(&recorder, &recorded, &Value::Int(5)).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotSupported));
    }
}

#[test]
fn test_getter_failure_is_wrapped_once() {
    let fx = fixture();
    let fragile = fx.member(fx.recorder, "Fragile");
    for binder in fx.binders() {
        let recorder = binder.create_instance(fx.recorder, &[]).unwrap();
        let err = binder.get_value(&recorder, &fragile, true).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::GetValue));
        assert_eq!(err.cause(), Some(&HostError::Failed("getter broke".to_string())));
    }
}

#[test]
fn test_critical_failure_passes_through() {
    let fx = fixture();
    let depth = fx.member(fx.recorder, "Depth");
    for binder in fx.binders() {
        let recorder = binder.create_instance(fx.recorder, &[]).unwrap();
        let err = binder.get_value(&recorder, &depth, true).unwrap_err();
        assert_eq!(err, BindError::Critical(HostError::StackOverflow));
        assert_eq!(err.kind(), None);
    }
}

#[test]
fn test_protected_member_through_owner_type() {
    let fx = fixture();
    let tag = fx.member(fx.control, "Tag");
    for binder in fx.binders() {
        let window = fx.new_window(binder.as_ref());
        let result = binder.get_value(&window, &tag, true);
        match binder.backend() {
            Backend::Reflective => {
                let err = result.unwrap_err();
                assert_eq!(err.kind(), Some(ErrorKind::GetValue));
                assert!(matches!(err.cause(), Some(HostError::AccessDenied(_))));
            }
            Backend::Compiling => {
                assert_eq!(result.unwrap(), Value::str("root"));
                binder.set_value(&window, &tag, &Value::str("renamed")).unwrap();
                assert_eq!(binder.get_value(&window, &tag, true).unwrap(), Value::str("renamed"));
            }
        }
    }
}

#[test]
fn test_directive_builds_value_type() {
    let fx = fixture();
    let directive = MemberDescriptor::directive("Template", fx.recorder);
    for binder in fx.binders() {
        let recorder = binder.create_instance(fx.recorder, &[]).unwrap();
        let built = binder.get_value(&recorder, &directive, true).unwrap();
        assert!(built.downcast_ref::<Recorder>().is_some());
        assert!(!built.same(&recorder));

        binder.set_value(&recorder, &directive, &Value::Int(1)).unwrap();
    }
}

#[test]
fn test_should_serialize() {
    let fx = fixture();
    let title = fx.member(fx.recorder, "Title");
    let recorded = fx.member(fx.recorder, "Recorded");
    let fragile = fx.member(fx.recorder, "Fragile");
    for binder in fx.binders() {
        let recorder = binder.create_instance(fx.recorder, &[]).unwrap();
        assert_eq!(binder.should_serialize(&recorder, &title).unwrap(), ShouldSerialize::No);

        binder.set_value(&recorder, &title, &Value::str("Main")).unwrap();
        assert_eq!(binder.should_serialize(&recorder, &title).unwrap(), ShouldSerialize::Yes);

        assert_eq!(
            binder.should_serialize(&recorder, &recorded).unwrap(),
            ShouldSerialize::Default
        );

        let err = binder.should_serialize(&recorder, &fragile).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::GetValue));
    }
}

#[test]
fn test_errors_carry_line_info() {
    let fx = fixture();
    let fragile = fx.member(fx.recorder, "Fragile");
    for binder in fx.binders() {
        let recorder = binder.create_instance(fx.recorder, &[]).unwrap();

        let err = binder.get_value(&recorder, &fragile, true).unwrap_err();
        assert_eq!(err.location(), None);

        binder.set_line_info(Some(Arc::new(SourceLocation::new(3, 7))));
        let err = binder.get_value(&recorder, &fragile, true).unwrap_err();
        assert_eq!(err.location(), Some(SourceLocation::new(3, 7)));
        assert!(err.to_string().contains("line 3, position 7"));

        binder.set_line_info(None);
        let err = binder.get_value(&recorder, &fragile, true).unwrap_err();
        assert_eq!(err.location(), None);
    }
}

#[test]
fn test_set_of_retrieved_value_is_idempotent() {
    let fx = fixture();
    let title = fx.member(fx.recorder, "Title");
    for binder in fx.binders() {
        let recorder = binder.create_instance(fx.recorder, &[]).unwrap();
        for initial in ["", "Main", "Ünïcode title"] {
            binder.set_value(&recorder, &title, &Value::str(initial)).unwrap();
            let read = binder.get_value(&recorder, &title, true).unwrap();
            binder.set_value(&recorder, &title, &read).unwrap();
            assert_eq!(binder.get_value(&recorder, &title, true).unwrap(), read);
        }
    }
}
