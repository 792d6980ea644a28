//! Weft SDK - host object contract for the markup binder
//!
//! This crate holds the small set of types both sides of the binder agree on:
//! host code (the object model being built from markup) and the binder
//! itself. It has no knowledge of descriptors or caches.
//!
//! - [`Value`]: dynamic value, with host objects as shared `dyn Any` handles
//! - [`FromValue`] / [`IntoValue`]: unboxing and boxing at the call boundary
//! - [`ParamType`]: declared parameter shapes for overload resolution
//! - [`Ref`]: a host object viewed through one of its registered bases
//! - [`HostError`]: failures raised by host code
//! - capability traits: converters, deferring loaders, lifecycle hooks
//!
//! # Example
//!
//! ```ignore
//! use weft_sdk::{FromValue, IntoValue, Value};
//!
//! let v = 42i32.into_value();
//! assert_eq!(i32::from_value(&v), Ok(42));
//! ```

#![warn(missing_docs)]

pub mod capability;
pub mod content;
pub mod context;
pub mod convert;
pub mod error;
pub mod types;
pub mod value;
pub mod view;

pub use capability::{
    AttachableMemberId, AttachedPropertyStore, ComponentConnector, DeferringLoader,
    MarkupExtension, SupportInitialize, TypeConverter, UriContext,
};
pub use content::{
    ContentSource, DictionaryEnumerator, DictionaryItems, IndexedContent, ItemIter, NodeList,
    TypedPairIter,
};
pub use context::{LineInfo, ServiceContext, SourceLocation};
pub use convert::{FromValue, IntoValue, Rest};
pub use error::{HostError, HostResult};
pub use types::{ExactTypes, ParamType, TypeRelation};
pub use value::{KeyValuePair, ObjectRef, Value, ValueKind};
pub use view::{ObjectView, Ref};
