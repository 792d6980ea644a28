//! Value: the dynamic representation of everything that crosses the binder
//!
//! Primitives are stored inline, text is shared, and host objects are
//! reference-counted `dyn Any` handles. Host objects follow reference
//! semantics: cloning a `Value::Object` clones the handle, not the object, so
//! host types keep their mutable state behind interior mutability.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Shared handle to an arbitrary host object.
pub type ObjectRef = Arc<dyn Any + Send + Sync>;

/// Coarse classification of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// No value
    Null,
    /// Boolean
    Bool,
    /// Signed integer
    Int,
    /// Floating point
    Float,
    /// Text
    Str,
    /// Ordered list of values
    List,
    /// Host object
    Object,
}

/// Dynamic value handled by the binder
#[derive(Clone, Default)]
pub enum Value {
    /// Absent / null value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Signed 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// Shared text
    Str(Arc<str>),
    /// Ordered list (rest-array arguments, collection snapshots)
    List(Arc<Vec<Value>>),
    /// Host object
    Object(ObjectRef),
}

impl Value {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a text value
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Wrap a host object
    pub fn object<T: Any + Send + Sync>(obj: T) -> Self {
        Value::Object(Arc::new(obj))
    }

    /// Wrap an already shared host object
    pub fn from_arc<T: Any + Send + Sync>(obj: Arc<T>) -> Self {
        Value::Object(obj)
    }

    /// Create a list value
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Classify the value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Check for null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check for textual values
    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    /// Borrow the text, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Read an integer, if any
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Borrow list items, if any
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Borrow the object handle, if any
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrow the host object as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        let obj = self.as_object()?;
        let any: &(dyn Any + Send + Sync) = &**obj;
        any.downcast_ref::<T>()
    }

    /// Clone the host object handle as `Arc<T>`
    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let obj = self.as_object()?;
        Arc::clone(obj).downcast::<T>().ok()
    }

    /// Runtime type id of the host object (never of the handle)
    pub fn object_type_id(&self) -> Option<TypeId> {
        let obj = self.as_object()?;
        let any: &(dyn Any + Send + Sync) = &**obj;
        Some(any.type_id())
    }

    /// Short type description used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// Identity comparison for objects, structural for everything else
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(obj) => write!(f, "Object({:p})", Arc::as_ptr(obj)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => write!(f, "[{} items]", items.len()),
            Value::Object(_) => write!(f, "<object>"),
        }
    }
}

// ============================================================================
// Key/value pairs
// ============================================================================

/// Boxed key/value pair, the element type of generic dictionary iterators
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValuePair {
    /// Entry key
    pub key: Value,
    /// Entry value
    pub value: Value,
}

impl KeyValuePair {
    /// Create a pair
    pub fn new(key: Value, value: Value) -> Self {
        Self { key, value }
    }

    /// Box the pair into a `Value::Object`
    pub fn into_value(self) -> Value {
        Value::object(self)
    }
}
