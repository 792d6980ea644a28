//! Parameter types: the static shape a host parameter expects
//!
//! Overload resolution and the compiling binder's argument checks both work
//! on `ParamType`, so it carries exactly the information needed to decide
//! whether a [`Value`] fits a parameter and which of two parameters is the
//! more specific one.

use std::any::TypeId;
use std::fmt;

use crate::value::Value;

/// Subtype relation between host object types
pub trait TypeRelation {
    /// Whether an object of concrete type `from` may be viewed as `to`
    fn is_subtype(&self, from: TypeId, to: TypeId) -> bool;
}

/// Relation where a type is only related to itself
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTypes;

impl TypeRelation for ExactTypes {
    fn is_subtype(&self, from: TypeId, to: TypeId) -> bool {
        from == to
    }
}

/// Declared type of a host parameter or member value
#[derive(Clone, PartialEq, Eq)]
pub enum ParamType {
    /// Accepts anything (including null)
    Any,
    /// Boolean
    Bool,
    /// Integer
    Int,
    /// Float (also accepts integers)
    Float,
    /// Text
    Str,
    /// Host object of exactly this concrete type
    Object {
        /// Concrete type id
        type_id: TypeId,
        /// Rust type name for diagnostics
        name: &'static str,
    },
    /// Host object of this type or of any registered subtype, passed as a
    /// view of its base part
    View {
        /// Type id of the viewed base
        type_id: TypeId,
        /// Rust type name for diagnostics
        name: &'static str,
    },
    /// Null or the inner type
    Optional(Box<ParamType>),
    /// List whose elements all fit the inner type
    List(Box<ParamType>),
    /// Trailing variable-arity parameter
    Rest(Box<ParamType>),
}

impl ParamType {
    /// Parameter type for host objects of type `T`
    pub fn object<T: 'static>() -> Self {
        ParamType::Object {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Parameter type for views of `T` or its subtypes
    pub fn view<T: 'static + ?Sized>() -> Self {
        ParamType::View {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Type id of the object this parameter expects, if it expects one
    pub fn object_type_id(&self) -> Option<TypeId> {
        match self {
            ParamType::Object { type_id, .. } | ParamType::View { type_id, .. } => Some(*type_id),
            ParamType::Optional(inner) => inner.object_type_id(),
            _ => None,
        }
    }

    /// Check whether `value` may be passed for this parameter, relating
    /// object types by identity only
    pub fn accepts(&self, value: &Value) -> bool {
        self.accepts_in(value, &ExactTypes)
    }

    /// Check whether `value` may be passed for this parameter under `types`
    pub fn accepts_in(&self, value: &Value, types: &dyn TypeRelation) -> bool {
        match (self, value) {
            (ParamType::Any, _) => true,
            (ParamType::Bool, Value::Bool(_)) => true,
            (ParamType::Int, Value::Int(_)) => true,
            (ParamType::Float, Value::Float(_) | Value::Int(_)) => true,
            (ParamType::Str, Value::Str(_)) => true,
            (ParamType::Object { type_id, .. }, Value::Object(_)) => {
                value.object_type_id() == Some(*type_id)
            }
            (ParamType::View { type_id, .. }, Value::Object(_)) => value
                .object_type_id()
                .is_some_and(|concrete| types.is_subtype(concrete, *type_id)),
            (ParamType::Optional(_), Value::Null) => true,
            (ParamType::Optional(inner), v) => inner.accepts_in(v, types),
            (ParamType::List(elem) | ParamType::Rest(elem), Value::List(items)) => {
                items.iter().all(|item| elem.accepts_in(item, types))
            }
            _ => false,
        }
    }

    /// Element type of a trailing rest parameter
    pub fn rest_element(&self) -> Option<&ParamType> {
        match self {
            ParamType::Rest(elem) => Some(elem),
            _ => None,
        }
    }

    /// `true` when every value this type accepts is also accepted by `other`,
    /// i.e. `self` is at least as specific as `other`.
    pub fn at_least_as_specific_as(&self, other: &ParamType) -> bool {
        self.at_least_as_specific_in(other, &ExactTypes)
    }

    /// Specificity with object types related by `types`: a view of a derived
    /// type is more specific than a view of its base
    pub fn at_least_as_specific_in(&self, other: &ParamType, types: &dyn TypeRelation) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (_, ParamType::Any) => true,
            (ParamType::Any, _) => false,
            (ParamType::Int, ParamType::Float) => true,
            (
                ParamType::Object { type_id: a, .. } | ParamType::View { type_id: a, .. },
                ParamType::View { type_id: b, .. },
            ) => types.is_subtype(*a, *b),
            (ParamType::Optional(a), ParamType::Optional(b)) => a.at_least_as_specific_in(b, types),
            (a, ParamType::Optional(b)) => a.at_least_as_specific_in(b, types),
            (ParamType::List(a), ParamType::List(b))
            | (ParamType::Rest(a), ParamType::Rest(b))
            | (ParamType::List(a), ParamType::Rest(b))
            | (ParamType::Rest(a), ParamType::List(b)) => a.at_least_as_specific_in(b, types),
            _ => false,
        }
    }
}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Any => write!(f, "any"),
            ParamType::Bool => write!(f, "bool"),
            ParamType::Int => write!(f, "int"),
            ParamType::Float => write!(f, "float"),
            ParamType::Str => write!(f, "string"),
            ParamType::Object { name, .. } | ParamType::View { name, .. } => write!(f, "{}", name),
            ParamType::Optional(inner) => write!(f, "{}?", inner),
            ParamType::List(inner) => write!(f, "{}[]", inner),
            ParamType::Rest(inner) => write!(f, "...{}", inner),
        }
    }
}
