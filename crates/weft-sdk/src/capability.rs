//! Capability traits: optional behavior a host type can opt into
//!
//! A host type advertises a capability by implementing the trait here and
//! registering it on its type descriptor (see `weft-schema`'s `TypeBuilder`).
//! The binder never probes objects for traits at runtime; it only calls what
//! was registered.

use crate::context::ServiceContext;
use crate::content::ContentSource;
use crate::error::{HostError, HostResult};
use crate::types::ParamType;
use crate::value::{Value, ValueKind};

// ============================================================================
// Value converters
// ============================================================================

/// Pluggable value transformer (e.g. parses text into a richer value)
pub trait TypeConverter: Send + Sync {
    /// Whether a value of kind `source` can be converted
    fn can_convert_from(&self, ctx: &ServiceContext, source: ValueKind) -> bool;

    /// Convert a source value into the converter's value type
    fn convert_from(&self, ctx: &ServiceContext, value: &Value) -> HostResult<Value>;

    /// Convert a value of the converter's type into `target`
    fn convert_to(
        &self,
        ctx: &ServiceContext,
        value: &Value,
        target: &ParamType,
    ) -> HostResult<Value> {
        match target {
            ParamType::Str | ParamType::Any => self.convert_to_string(ctx, value).map(Value::str),
            other => Err(HostError::NotSupported(format!(
                "conversion of {} to {}",
                value.type_name(),
                other
            ))),
        }
    }

    /// Render a value of the converter's type as text
    fn convert_to_string(&self, _ctx: &ServiceContext, value: &Value) -> HostResult<String> {
        Ok(value.to_string())
    }
}

/// Loads and saves deferred document subtrees
pub trait DeferringLoader: Send + Sync {
    /// Build the deferred subtree from `content`
    fn load(&self, content: &mut dyn ContentSource, ctx: &ServiceContext) -> HostResult<Value>;

    /// Turn a previously loaded value back into replayable content
    fn save(&self, value: &Value, ctx: &ServiceContext) -> HostResult<Box<dyn ContentSource>>;
}

// ============================================================================
// Lifecycle hooks
// ============================================================================

/// Explicit init session bracketing bulk property assignment
pub trait SupportInitialize: Send + Sync {
    /// Called before the first property assignment
    fn begin_init(&self) -> HostResult<()>;

    /// Called after the last property assignment
    fn end_init(&self) -> HostResult<()>;
}

/// Root objects that wire named elements generated from markup
pub trait ComponentConnector: Send + Sync {
    /// Hand element `target` to the root under `connection_id`
    fn connect(&self, connection_id: i32, target: &Value) -> HostResult<()>;
}

/// Objects that want to know the document they were loaded from
pub trait UriContext: Send + Sync {
    /// Receive the base URI
    fn set_base_uri(&self, uri: &str) -> HostResult<()>;

    /// Current base URI
    fn base_uri(&self) -> Option<String>;
}

/// Markup extensions compute the value they stand for lazily
pub trait MarkupExtension: Send + Sync {
    /// Produce the value to assign
    fn provide_value(&self, ctx: &ServiceContext) -> HostResult<Value>;
}

// ============================================================================
// Attached properties
// ============================================================================

/// Identity of an attachable member (`Grid.Row` style)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttachableMemberId {
    /// Type declaring the attachable member
    pub declaring_type: String,
    /// Member name
    pub member_name: String,
}

impl AttachableMemberId {
    /// Create an identifier
    pub fn new(declaring_type: impl Into<String>, member_name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            member_name: member_name.into(),
        }
    }
}

impl std::fmt::Display for AttachableMemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.member_name)
    }
}

/// Side table holding attached property values for arbitrary instances
pub trait AttachedPropertyStore: Send + Sync {
    /// Number of attached properties set on `instance`
    fn property_count(&self, instance: &Value) -> HostResult<usize>;

    /// Snapshot of the attached properties set on `instance`
    fn properties(&self, instance: &Value) -> HostResult<Vec<(AttachableMemberId, Value)>>;
}
