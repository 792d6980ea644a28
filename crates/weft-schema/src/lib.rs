//! Weft schema - the registration table behind the markup binder
//!
//! Host types have no runtime reflection, so every constructor, accessor,
//! adder and capability the binder may touch is registered up front as a
//! typed closure. This crate turns those closures into shareable, erased
//! descriptors:
//!
//! - [`TypeBuilder`]: typed registration front end
//! - [`TypeRegistry`]: keyed table of [`TypeDescriptor`]s with hierarchy walks
//! - [`MemberDescriptor`], [`MethodHandle`], [`Accessor`]: what the binder invokes
//! - [`ValueConverter`]: converter and deferring-loader descriptors

#![warn(missing_docs)]

pub mod builder;
pub mod converter;
pub mod descriptor;
pub mod error;
pub mod id;
pub mod invoke;
pub mod registry;

pub use builder::{MemberBuilder, TypeBuilder};
pub use converter::{
    ConverterFactory, CustomConverter, DeferringLoaderDescriptor, TypeConverterDescriptor,
    ValueConverter,
};
pub use descriptor::{
    normalize_typed_pairs, Accessor, BaseLink, Capabilities, CollectionCapability,
    DictionaryCapability, Getter, MemberDescriptor, MemberKind, MethodHandle, MethodKind,
    NormalizeTypedFn, PairIter, Setter, ShouldSerialize, TypeDescriptor, Visibility,
};
pub use error::SchemaError;
pub use id::{HandleId, ModuleId, TypeKey};
pub use invoke::{guarded, HostFn, HostMethod, InvokeFn, Target};
pub use registry::{Ancestors, TypeRegistry};
