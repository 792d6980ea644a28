use parking_lot::Mutex;
use weft_runtime::ErrorKind;
use weft_sdk::{HostError, Value};

use crate::harness::{fixture, Control, Frame, Recorder};

fn plain_control(tag: &str) -> Value {
    Value::object(Control {
        tag: Mutex::new(tag.to_string()),
    })
}

#[test]
fn test_derived_object_binds_base_constructor_parameter() {
    let fx = fixture();
    let content = fx.member(fx.frame, "Content");
    let content_tag = fx.member(fx.frame, "ContentTag");
    for binder in fx.binders() {
        let window = fx.new_window(binder.as_ref());
        let frame = binder.create_instance(fx.frame, &[window.clone()]).unwrap();

        assert_eq!(binder.get_value(&frame, &content_tag, true).unwrap(), Value::str("root"));
        assert!(binder.get_value(&frame, &content, true).unwrap().same(&window));
    }
}

#[test]
fn test_derived_object_binds_base_factory_parameter() {
    let fx = fixture();
    let content_tag = fx.member(fx.frame, "ContentTag");
    for binder in fx.binders() {
        let window = fx.new_window(binder.as_ref());
        let frame = binder
            .create_with_factory_method(fx.frame, "Around", &[window])
            .unwrap();
        assert!(frame.downcast_ref::<Frame>().is_some());
        assert_eq!(binder.get_value(&frame, &content_tag, true).unwrap(), Value::str("root"));
    }
}

#[test]
fn test_derived_object_binds_base_setter() {
    let fx = fixture();
    let content = fx.member(fx.frame, "Content");
    let content_tag = fx.member(fx.frame, "ContentTag");
    for binder in fx.binders() {
        let frame = binder.create_instance(fx.frame, &[]).unwrap();
        let window = fx.new_window(binder.as_ref());

        binder.set_value(&frame, &content, &window).unwrap();
        assert!(binder.get_value(&frame, &content, true).unwrap().same(&window));
        assert_eq!(binder.get_value(&frame, &content_tag, true).unwrap(), Value::str("root"));

        binder.set_value(&frame, &content, &plain_control("plain")).unwrap();
        assert_eq!(binder.get_value(&frame, &content_tag, true).unwrap(), Value::str("plain"));

        binder.set_value(&frame, &content, &Value::Null).unwrap();
        assert_eq!(binder.get_value(&frame, &content, true).unwrap(), Value::Null);
    }
}

#[test]
fn test_most_derived_add_overload_wins() {
    let fx = fixture();
    for binder in fx.binders() {
        let frame = binder.create_instance(fx.frame, &[]).unwrap();
        let window = fx.new_window(binder.as_ref());

        binder.add(&frame, fx.frame, &window).unwrap();
        binder.add(&frame, fx.frame, &plain_control("plain")).unwrap();

        let children = frame.downcast_ref::<Frame>().unwrap().children.lock().clone();
        assert_eq!(children, vec!["window:root".to_string(), "control:plain".to_string()]);
    }
}

#[test]
fn test_unrelated_object_is_rejected() {
    let fx = fixture();
    let content = fx.member(fx.frame, "Content");
    for binder in fx.binders() {
        let stranger = Value::object(Recorder::default());

        let err = binder.create_instance(fx.frame, &[stranger.clone()]).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::MissingConstructor));

        let frame = binder.create_instance(fx.frame, &[]).unwrap();
        let err = binder.set_value(&frame, &content, &stranger).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::SetValue));
        assert!(matches!(err.cause(), Some(HostError::InvalidCast { .. })));

        let err = binder.add(&frame, fx.frame, &stranger).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::AddCollection));
    }
}
