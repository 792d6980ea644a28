use std::sync::Arc;

use weft_runtime::{BindMode, BinderOptions, ErrorKind, RuntimeBinderExt};
use weft_schema::TypeConverterDescriptor;
use weft_sdk::{ContentSource, HostError, NodeList, ParamType, ServiceContext, Value};

use crate::harness::{
    absent_loader, broken_converter, failing_loader, fixture, hex, list_loader, shared_cache, shy,
    RecordingSource,
};

#[test]
fn test_create_from_value() {
    let fx = fixture();
    let ctx = ServiceContext::new();
    let hex_member = fx.member(fx.recorder, "Hex");
    for binder in fx.binders() {
        let converted = binder
            .create_from_value(&ctx, &hex(), &Value::str("0xff"), Some(&hex_member))
            .unwrap();
        assert_eq!(converted, Value::Int(255));

        // Declined by can_convert_from: passed through untouched
        let kept = binder.create_from_value(&ctx, &hex(), &Value::Int(7), None).unwrap();
        assert_eq!(kept, Value::Int(7));

        let err = binder
            .create_from_value(&ctx, &hex(), &Value::str("zz"), Some(&hex_member))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::TypeConverter));
        assert!(matches!(err.cause(), Some(HostError::Argument(_))));
    }
}

#[test]
fn test_builtin_converters_pass_through() {
    let fx = fixture();
    let ctx = ServiceContext::new();
    for binder in fx.binders() {
        for converter in [TypeConverterDescriptor::String, TypeConverterDescriptor::Object] {
            let value = binder
                .create_from_value(&ctx, &converter, &Value::str("as is"), None)
                .unwrap();
            assert_eq!(value, Value::str("as is"));
            assert!(binder.converter_instance(&converter).unwrap().is_none());
        }
    }
}

#[test]
fn test_legacy_string_bypass() {
    let fx = fixture();
    let ctx = ServiceContext::new();

    for binder in fx.binders() {
        let kept = binder.create_from_value(&ctx, &shy(), &Value::str("abc"), None).unwrap();
        assert_eq!(kept, Value::str("abc"));
    }

    let legacy = BinderOptions::new(BindMode::Read).ignore_can_convert_for_strings(true);
    for binder in fx.binders_with(legacy) {
        let forced = binder.create_from_value(&ctx, &shy(), &Value::str("abc"), None).unwrap();
        assert_eq!(forced, Value::str("ABC"));

        // Only text is forced through
        let kept = binder.create_from_value(&ctx, &shy(), &Value::Int(3), None).unwrap();
        assert_eq!(kept, Value::Int(3));
    }
}

#[test]
fn test_explicit_conversions() {
    let fx = fixture();
    let ctx = ServiceContext::new();
    for binder in fx.binders() {
        assert_eq!(binder.convert_to_string(&ctx, &hex(), &Value::Int(255)).unwrap(), "0xff");

        let text: String = binder.convert_to_value(&ctx, &hex(), &Value::Int(16)).unwrap();
        assert_eq!(text, "0x10");

        let as_any = binder
            .convert_to_value_as(&ctx, &hex(), &Value::Int(16), &ParamType::Any)
            .unwrap();
        assert_eq!(as_any, Value::str("0x10"));

        let err = binder
            .convert_to_value::<i64>(&ctx, &hex(), &Value::Int(16))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::TypeConverter));
        assert!(matches!(err.cause(), Some(HostError::NotSupported(_))));

        let err = binder
            .convert_to_string(&ctx, &TypeConverterDescriptor::String, &Value::Int(1))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::TypeConverter));
    }
}

#[test]
fn test_hex_round_trip_for_non_negative_values() {
    let fx = fixture();
    let ctx = ServiceContext::new();
    for binder in fx.binders() {
        for n in [0i64, 1, 255, 4096, i64::MAX] {
            let text = binder.convert_to_string(&ctx, &hex(), &Value::Int(n)).unwrap();
            let back = binder.create_from_value(&ctx, &hex(), &Value::str(&text), None).unwrap();
            assert_eq!(back, Value::Int(n));
        }
    }
}

#[test]
fn test_converter_instances_are_cached() {
    let fx = fixture();
    let cache = shared_cache();
    let options = BinderOptions::new(BindMode::Read).with_converter_cache(Arc::clone(&cache));
    let binders = fx.binders_with(options);

    let first = binders[0].converter_instance(&hex()).unwrap().unwrap();
    let again = binders[0].converter_instance(&hex()).unwrap().unwrap();
    let other = binders[1].converter_instance(&hex()).unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert!(Arc::ptr_eq(&first, &other));
    assert_eq!(cache.count(), 1);

    let loader = binders[1].deferring_loader_instance(&list_loader()).unwrap();
    assert!(loader.is_some());
    assert_eq!(cache.count(), 2);
}

#[test]
fn test_converter_creation_failure() {
    let fx = fixture();
    for binder in fx.binders() {
        let err = binder.converter_instance(&broken_converter()).err().unwrap();
        assert_eq!(err.kind(), Some(ErrorKind::TypeConverter));
        assert_eq!(
            err.cause(),
            Some(&HostError::Failed("converter factory failed".to_string()))
        );
    }
}

#[test]
fn test_deferred_load_and_save() {
    let fx = fixture();
    let ctx = ServiceContext::new();
    let nodes = vec![Value::Int(1), Value::str("two")];
    for binder in fx.binders() {
        let mut source = NodeList::new(nodes.clone());
        let loaded = binder.deferred_load(&ctx, &list_loader(), &mut source).unwrap();
        assert_eq!(loaded, Value::list(nodes.clone()));

        let mut saved = binder.deferred_save(&ctx, &list_loader(), &loaded).unwrap();
        assert_eq!(saved.read().unwrap(), Some(Value::Int(1)));
        assert_eq!(saved.read().unwrap(), Some(Value::str("two")));
        assert_eq!(saved.read().unwrap(), None);
    }
}

#[test]
fn test_failed_load_resets_positioned_source() {
    let fx = fixture();
    let ctx = ServiceContext::new();
    for binder in fx.binders() {
        let mut source = RecordingSource::new(vec![Value::Int(1), Value::Int(2)]);
        let err = binder.deferred_load(&ctx, &failing_loader(), &mut source).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::DeferredLoad));
        assert_eq!(source.resets(), 1);

        // Replays from the first node
        assert_eq!(source.read().unwrap(), Some(Value::Int(1)));
    }
}

#[test]
fn test_missing_loader_instance() {
    let fx = fixture();
    let ctx = ServiceContext::new();
    for binder in fx.binders() {
        let mut source = RecordingSource::new(vec![Value::Int(1)]);
        let err = binder.deferred_load(&ctx, &absent_loader(), &mut source).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::DeferringLoaderInstanceNull));
        // Never positioned, so nothing to reset
        assert_eq!(source.resets(), 0);

        let err = binder
            .deferred_save(&ctx, &absent_loader(), &Value::Null)
            .err().unwrap();
        assert_eq!(err.kind(), Some(ErrorKind::DeferringLoaderInstanceNull));

        let err = binder
            .deferred_save(&ctx, &failing_loader(), &Value::Null)
            .err().unwrap();
        assert_eq!(err.kind(), Some(ErrorKind::DeferredSave));
    }
}
