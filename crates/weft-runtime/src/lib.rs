//! Weft Runtime Binder
//!
//! Builds and manipulates the object graph a markup document describes,
//! against the registration table from `weft-schema`:
//! - Instance construction (constructors and static factories)
//! - Member reads and writes, should-serialize queries
//! - Collection and dictionary population and enumeration
//! - Value conversion and deferred content
//! - Lifecycle hooks, attached properties and delegates
//! - One error taxonomy carrying mode and source location
//!
//! Two backends implement [`RuntimeBinder`]: [`ReflectiveBinder`] resolves
//! everything per call over the public surface, [`CompilingBinder`] caches a
//! synthesized adapter per member and acts with one owning module's rights.
//! [`binder_from_config`] picks one from a `weft.toml`.

pub mod access;
pub mod binder;
pub mod config;
pub mod context;
pub mod converter_cache;
pub mod delegate;
pub mod dictionary;
pub mod error;
pub mod overload;

pub use access::{AccessPolicy, CastPlan, OwningModule};
pub use binder::{
    AdapterCache, Backend, Binder, BinderOptions, CompilingBinder, ReflectiveBinder, RuntimeBinder,
    RuntimeBinderExt,
};
pub use config::{binder_from_config, binder_with_options, BinderConfig, ConfigError};
pub use context::{BindMode, InvocationContext};
pub use converter_cache::ConverterCache;
pub use delegate::BoundDelegate;
pub use dictionary::{IterShape, ShapeCache};
pub use error::{BindError, BindResult, ErrorKind, WrappedError};
pub use overload::{Binding, BindingFailure};
