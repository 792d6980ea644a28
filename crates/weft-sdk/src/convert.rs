//! Traits for moving Rust values in and out of [`Value`].
//!
//! `FromValue` is the "unbox/cast to the exact parameter type" step of an
//! invocation and `IntoValue` is the "box the result" step. Registered host
//! closures only ever see concrete Rust types; the erased wrappers built in
//! `weft-schema` call these traits at the boundary.

use std::any::Any;
use std::sync::Arc;

use crate::error::{HostError, HostResult};
use crate::types::ParamType;
use crate::value::{ObjectRef, Value};
use crate::view::{ObjectView, Ref};

/// Convert a [`Value`] into a Rust value.
pub trait FromValue: Sized {
    /// Declared parameter type, used by overload resolution
    fn param_type() -> ParamType;

    /// Extract the Rust value
    fn from_value(value: &Value) -> HostResult<Self>;
}

/// Convert a Rust value into a [`Value`].
pub trait IntoValue {
    /// Box the value
    fn into_value(self) -> Value;
}

fn mismatch(expected: &str, got: &Value) -> HostError {
    HostError::InvalidCast {
        expected: expected.to_string(),
        got: got.type_name().to_string(),
    }
}

// ============================================================================
// Primitives
// ============================================================================

impl FromValue for Value {
    fn param_type() -> ParamType {
        ParamType::Any
    }

    fn from_value(value: &Value) -> HostResult<Self> {
        Ok(value.clone())
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Null
    }
}

impl FromValue for bool {
    fn param_type() -> ParamType {
        ParamType::Bool
    }

    fn from_value(value: &Value) -> HostResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for i64 {
    fn param_type() -> ParamType {
        ParamType::Int
    }

    fn from_value(value: &Value) -> HostResult<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            other => Err(mismatch("int", other)),
        }
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl FromValue for i32 {
    fn param_type() -> ParamType {
        ParamType::Int
    }

    fn from_value(value: &Value) -> HostResult<Self> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide)
            .map_err(|_| HostError::Argument(format!("{} out of range for i32", wide)))
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl FromValue for u32 {
    fn param_type() -> ParamType {
        ParamType::Int
    }

    fn from_value(value: &Value) -> HostResult<Self> {
        let wide = i64::from_value(value)?;
        u32::try_from(wide)
            .map_err(|_| HostError::Argument(format!("{} out of range for u32", wide)))
    }
}

impl IntoValue for u32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl FromValue for f64 {
    fn param_type() -> ParamType {
        ParamType::Float
    }

    fn from_value(value: &Value) -> HostResult<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(mismatch("float", other)),
        }
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for String {
    fn param_type() -> ParamType {
        ParamType::Str
    }

    fn from_value(value: &Value) -> HostResult<Self> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(mismatch("string", other)),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(Arc::from(self))
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::str(self)
    }
}

// ============================================================================
// Objects
// ============================================================================

impl FromValue for ObjectRef {
    fn param_type() -> ParamType {
        ParamType::Any
    }

    fn from_value(value: &Value) -> HostResult<Self> {
        match value {
            Value::Object(obj) => Ok(Arc::clone(obj)),
            other => Err(mismatch("object", other)),
        }
    }
}

impl IntoValue for ObjectRef {
    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

impl<T: Any + Send + Sync> FromValue for Arc<T> {
    fn param_type() -> ParamType {
        ParamType::object::<T>()
    }

    fn from_value(value: &Value) -> HostResult<Self> {
        value
            .downcast_arc::<T>()
            .ok_or_else(|| mismatch(std::any::type_name::<T>(), value))
    }
}

impl<T: Any + Send + Sync> IntoValue for Arc<T> {
    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

/// Binds `T` or a registered subtype. The binder hands a subtype over as an
/// [`ObjectView`] of its `T` part.
impl<T: Any + Send + Sync> FromValue for Ref<T> {
    fn param_type() -> ParamType {
        ParamType::view::<T>()
    }

    fn from_value(value: &Value) -> HostResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| mismatch(std::any::type_name::<T>(), value))?;
        let view = match obj.downcast_ref::<ObjectView>() {
            Some(erased) => erased.downcast::<T>(),
            None => Ref::exact(Arc::clone(obj)),
        };
        view.ok_or_else(|| mismatch(std::any::type_name::<T>(), value))
    }
}

/// Boxes the whole object, not just the viewed part
impl<T: ?Sized + 'static> IntoValue for Ref<T> {
    fn into_value(self) -> Value {
        Value::Object(self.into_owner())
    }
}

// ============================================================================
// Containers
// ============================================================================

impl<T: FromValue> FromValue for Option<T> {
    fn param_type() -> ParamType {
        match T::param_type() {
            ParamType::Any => ParamType::Any,
            inner => ParamType::Optional(Box::new(inner)),
        }
    }

    fn from_value(value: &Value) -> HostResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn param_type() -> ParamType {
        ParamType::List(Box::new(T::param_type()))
    }

    fn from_value(value: &Value) -> HostResult<Self> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            other => Err(mismatch("list", other)),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::list(self.into_iter().map(IntoValue::into_value).collect())
    }
}

/// Trailing variable-arity argument list.
///
/// A host parameter of type `Rest<T>` binds either a single list argument or
/// any number of trailing `T` arguments, which the overload binder packs into
/// a list before the call.
#[derive(Debug, Clone, PartialEq)]
pub struct Rest<T>(pub Vec<T>);

impl<T: FromValue> FromValue for Rest<T> {
    fn param_type() -> ParamType {
        ParamType::Rest(Box::new(T::param_type()))
    }

    fn from_value(value: &Value) -> HostResult<Self> {
        Vec::<T>::from_value(value).map(Rest)
    }
}
