//! The runtime binder
//!
//! [`RuntimeBinder`] is the one contract the document walker talks to. Two
//! backends implement it through the same [`Binder`] shell:
//!
//! - [`ReflectiveBinder`]: resolves, checks visibility, casts and validates
//!   on every call. Only public members (and zero-argument constructors) are
//!   reachable.
//! - [`CompilingBinder`]: synthesizes one adapter per constructor, method or
//!   accessor on first use and caches it by handle id. Adapters carry the
//!   access rights of one [`OwningModule`], decided once at synthesis.
//!
//! Everything that does not depend on the backend (overload resolution, error
//! wrapping, converters, dictionaries, lifecycle hooks) lives in the shared
//! operation modules below and is written once against [`Dispatch`].

mod adapter_cache;
mod collections;
mod compiling;
mod construct;
mod conversion;
mod lifecycle;
mod members;
mod reflective;

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use weft_schema::{
    DeferringLoaderDescriptor, Getter, MemberDescriptor, MethodHandle, Setter, ShouldSerialize,
    TypeConverterDescriptor, TypeDescriptor, TypeKey, TypeRegistry,
};
use weft_sdk::{
    AttachableMemberId, AttachedPropertyStore, ContentSource, DeferringLoader, FromValue,
    HostError, HostResult, LineInfo, ParamType, ServiceContext, TypeConverter, Value,
};

use crate::access::type_name;
use crate::context::{BindMode, InvocationContext};
use crate::converter_cache::ConverterCache;
use crate::delegate::{BoundDelegate, DelegateFn};
use crate::dictionary::ShapeCache;
use crate::error::{BindError, BindResult, ErrorKind, WrappedError};

pub use adapter_cache::AdapterCache;
pub use compiling::Compiling;
pub use reflective::Reflective;

pub use crate::access::OwningModule;

/// Reflection-style backend
pub type ReflectiveBinder = Binder<Reflective>;

/// Adapter-synthesizing backend
pub type CompilingBinder = Binder<Compiling>;

// ============================================================================
// Contract
// ============================================================================

/// Which backend a binder runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Reflective,
    Compiling,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Reflective => write!(f, "reflective"),
            Backend::Compiling => write!(f, "compiling"),
        }
    }
}

/// Builds and manipulates host objects on behalf of a document walker
pub trait RuntimeBinder: Send + Sync {
    /// Backend in use
    fn backend(&self) -> Backend;

    /// Read or write mode, fixed at construction
    fn mode(&self) -> BindMode;

    /// Registration table the binder resolves against
    fn registry(&self) -> &Arc<TypeRegistry>;

    /// Attach (or detach) the provider used to annotate errors
    fn set_line_info(&self, provider: Option<Arc<dyn LineInfo>>);

    /// Wrap a host failure the way the binder's own operations do
    fn wrap_failure(&self, kind: ErrorKind, subject: &str, cause: HostError) -> BindError;

    // ---- construction ----

    /// Construct an instance of `ty` from `args`
    fn create_instance(&self, ty: TypeKey, args: &[Value]) -> BindResult<Value>;

    /// Construct through the static factory `method` of `ty`
    fn create_with_factory_method(
        &self,
        ty: TypeKey,
        method: &str,
        args: &[Value],
    ) -> BindResult<Value>;

    // ---- members ----

    /// Read a member
    fn get_value(
        &self,
        instance: &Value,
        member: &MemberDescriptor,
        fail_if_write_only: bool,
    ) -> BindResult<Value>;

    /// Write a member (adds a handler for events)
    fn set_value(
        &self,
        instance: &Value,
        member: &MemberDescriptor,
        value: &Value,
    ) -> BindResult<()>;

    /// Ask the member's should-serialize hook
    fn should_serialize(
        &self,
        instance: &Value,
        member: &MemberDescriptor,
    ) -> BindResult<ShouldSerialize>;

    // ---- collections and dictionaries ----

    /// Add `value` to a collection of type `ty`
    fn add(&self, collection: &Value, ty: TypeKey, value: &Value) -> BindResult<()>;

    /// Add `key` → `value` to a dictionary of type `ty`
    fn add_to_dictionary(
        &self,
        dictionary: &Value,
        ty: TypeKey,
        value: &Value,
        key: &Value,
    ) -> BindResult<()>;

    /// Drain the items of a collection
    fn get_items(&self, collection: &Value, ty: TypeKey) -> BindResult<Vec<Value>>;

    /// Drain the entries of a dictionary, whatever shape it hands out
    fn get_dictionary_items(
        &self,
        dictionary: &Value,
        ty: TypeKey,
    ) -> BindResult<Vec<(Value, Value)>>;

    // ---- conversion ----

    /// Convert a markup value with the member's converter, passing it through
    /// when there is nothing to do
    fn create_from_value(
        &self,
        ctx: &ServiceContext,
        converter: &TypeConverterDescriptor,
        value: &Value,
        member: Option<&MemberDescriptor>,
    ) -> BindResult<Value>;

    /// Convert `value` into `target` with the converter; always invokes it
    fn convert_to_value_as(
        &self,
        ctx: &ServiceContext,
        converter: &TypeConverterDescriptor,
        value: &Value,
        target: &ParamType,
    ) -> BindResult<Value>;

    /// Render `value` as text with the converter; always invokes it
    fn convert_to_string(
        &self,
        ctx: &ServiceContext,
        converter: &TypeConverterDescriptor,
        value: &Value,
    ) -> BindResult<String>;

    /// Cached converter instance
    fn converter_instance(
        &self,
        converter: &TypeConverterDescriptor,
    ) -> BindResult<Option<Arc<dyn TypeConverter>>>;

    /// Cached deferring loader instance
    fn deferring_loader_instance(
        &self,
        loader: &DeferringLoaderDescriptor,
    ) -> BindResult<Option<Arc<dyn DeferringLoader>>>;

    // ---- attached metadata, lifecycle hooks, deferred content ----

    /// Number of attached properties set on `instance`
    fn attached_property_count(&self, instance: &Value) -> BindResult<usize>;

    /// Attached properties set on `instance`
    fn get_attached_properties(
        &self,
        instance: &Value,
    ) -> BindResult<Vec<(AttachableMemberId, Value)>>;

    /// Begin (`begin = true`) or end an init session on `instance`
    fn initialization_guard(&self, ty: TypeKey, instance: &Value, begin: bool) -> BindResult<()>;

    /// Hand a named element to its root
    fn set_connection_id(
        &self,
        root: &Value,
        connection_id: i32,
        instance: &Value,
    ) -> BindResult<()>;

    /// Tell `instance` which document it came from
    fn set_uri_base(&self, ty: TypeKey, instance: &Value, uri: &str) -> BindResult<()>;

    /// Ask a markup extension for its value
    fn call_provide_value(&self, extension: &Value, ctx: &ServiceContext) -> BindResult<Value>;

    /// Bind `target.method_name` to a delegate of type `delegate_type`
    fn create_delegate(
        &self,
        delegate_type: TypeKey,
        target: &Value,
        method_name: &str,
    ) -> BindResult<BoundDelegate>;

    /// Build a deferred subtree from `content`
    fn deferred_load(
        &self,
        ctx: &ServiceContext,
        loader: &DeferringLoaderDescriptor,
        content: &mut dyn ContentSource,
    ) -> BindResult<Value>;

    /// Turn a loaded value back into replayable content
    fn deferred_save(
        &self,
        ctx: &ServiceContext,
        loader: &DeferringLoaderDescriptor,
        value: &Value,
    ) -> BindResult<Box<dyn ContentSource>>;
}

/// Typed helpers over [`RuntimeBinder`]
pub trait RuntimeBinderExt: RuntimeBinder {
    /// Convert `value` into a `T` with the converter
    fn convert_to_value<T: FromValue>(
        &self,
        ctx: &ServiceContext,
        converter: &TypeConverterDescriptor,
        value: &Value,
    ) -> BindResult<T> {
        let converted = self.convert_to_value_as(ctx, converter, value, &T::param_type())?;
        T::from_value(&converted)
            .map_err(|err| self.wrap_failure(ErrorKind::TypeConverter, converter.name(), err))
    }
}

impl<B: RuntimeBinder + ?Sized> RuntimeBinderExt for B {}

// ============================================================================
// Backend seam
// ============================================================================

/// The calls whose access and dispatch strategy differs per backend
pub trait Dispatch: Send + Sync + 'static {
    fn backend(&self) -> Backend;

    /// Whether overload and delegate resolution may consider `method`
    fn admits(&self, method: &MethodHandle) -> bool;

    /// Call a constructor, static or instance method with packed arguments
    fn invoke(
        &self,
        registry: &Arc<TypeRegistry>,
        method: &Arc<MethodHandle>,
        target: Option<&Value>,
        args: &[Value],
    ) -> HostResult<Value>;

    fn get(
        &self,
        registry: &Arc<TypeRegistry>,
        getter: &Arc<Getter>,
        instance: &Value,
    ) -> HostResult<Value>;

    fn set(
        &self,
        registry: &Arc<TypeRegistry>,
        setter: &Arc<Setter>,
        instance: &Value,
        value: &Value,
    ) -> HostResult<()>;

    /// Callable for a delegate bound to `target`
    fn bind(
        &self,
        registry: &Arc<TypeRegistry>,
        method: &Arc<MethodHandle>,
        target: Value,
    ) -> Arc<DelegateFn>;
}

// ============================================================================
// Options and shared state
// ============================================================================

/// Construction options shared by both backends
#[derive(Clone, Default)]
pub struct BinderOptions {
    /// Mode tag carried by every error
    pub mode: BindMode,
    /// Convert textual values without asking `can_convert_from`
    pub ignore_can_convert_for_strings: bool,
    /// Converter cache owned by the schema context; a private one otherwise
    pub converter_cache: Option<Arc<ConverterCache>>,
    /// Side table for attached properties
    pub attached_properties: Option<Arc<dyn AttachedPropertyStore>>,
}

impl BinderOptions {
    pub fn new(mode: BindMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn ignore_can_convert_for_strings(mut self, ignore: bool) -> Self {
        self.ignore_can_convert_for_strings = ignore;
        self
    }

    pub fn with_converter_cache(mut self, cache: Arc<ConverterCache>) -> Self {
        self.converter_cache = Some(cache);
        self
    }

    pub fn with_attached_properties(mut self, store: Arc<dyn AttachedPropertyStore>) -> Self {
        self.attached_properties = Some(store);
        self
    }
}

/// State shared by the operation modules
pub(crate) struct BinderCore {
    registry: Arc<TypeRegistry>,
    context: InvocationContext,
    converters: Arc<ConverterCache>,
    attached: Option<Arc<dyn AttachedPropertyStore>>,
    shapes: ShapeCache,
    ignore_can_convert_for_strings: bool,
}

impl BinderCore {
    fn new(registry: Arc<TypeRegistry>, options: BinderOptions) -> Self {
        Self {
            registry,
            context: InvocationContext::new(options.mode),
            converters: options.converter_cache.unwrap_or_default(),
            attached: options.attached_properties,
            shapes: ShapeCache::new(),
            ignore_can_convert_for_strings: options.ignore_can_convert_for_strings,
        }
    }

    /// Wrap a host failure: critical ones pass through, one invocation
    /// wrapper is stripped, everything else is annotated exactly once
    pub(crate) fn wrap(
        &self,
        kind: ErrorKind,
        subject: impl Into<String>,
        err: HostError,
    ) -> BindError {
        if err.is_critical() {
            return BindError::Critical(err);
        }
        let inner = err.unwrap_invocation();
        if inner.is_critical() {
            return BindError::Critical(inner);
        }
        self.annotate(kind, subject.into(), Some(inner))
    }

    /// Binder-detected failure
    pub(crate) fn fail(
        &self,
        kind: ErrorKind,
        subject: impl Into<String>,
        cause: Option<HostError>,
    ) -> BindError {
        self.annotate(kind, subject.into(), cause)
    }

    fn annotate(&self, kind: ErrorKind, subject: String, cause: Option<HostError>) -> BindError {
        let location = self.context.location();
        debug!(?kind, %subject, cause = ?cause, "binder operation failed");
        BindError::Wrapped(Box::new(WrappedError {
            kind,
            mode: self.context.mode(),
            subject,
            location,
            cause,
        }))
    }

    /// Registered, instantiable type
    pub(crate) fn resolve(&self, ty: TypeKey) -> BindResult<&Arc<TypeDescriptor>> {
        match self.registry.get(ty) {
            Some(desc) if !desc.is_unknown() => Ok(desc),
            Some(desc) => Err(self.fail(ErrorKind::UnresolvedType, desc.name.clone(), None)),
            None => Err(self.fail(ErrorKind::UnresolvedType, ty.to_string(), None)),
        }
    }

    pub(crate) fn type_name(&self, ty: TypeKey) -> String {
        type_name(&self.registry, ty)
    }

    /// `Type.Member` for error subjects
    pub(crate) fn member_subject(&self, member: &MemberDescriptor) -> String {
        match member.declaring {
            Some(declaring) => format!("{}.{}", self.type_name(declaring), member.name),
            None => member.name.clone(),
        }
    }
}

// ============================================================================
// Binder
// ============================================================================

/// A [`RuntimeBinder`] running on backend `D`
pub struct Binder<D> {
    core: BinderCore,
    dispatch: D,
}

impl<D: Dispatch> Binder<D> {
    fn from_parts(registry: Arc<TypeRegistry>, options: BinderOptions, dispatch: D) -> Self {
        debug!(
            backend = %dispatch.backend(),
            mode = %options.mode,
            shared_converters = options.converter_cache.is_some(),
            "binder created"
        );
        Self {
            core: BinderCore::new(registry, options),
            dispatch,
        }
    }

    /// Converter cache in use (shareable with other binders)
    pub fn converter_cache(&self) -> &Arc<ConverterCache> {
        &self.core.converters
    }
}

impl Binder<Reflective> {
    /// Reflective binder over `registry`
    pub fn new(registry: Arc<TypeRegistry>, options: BinderOptions) -> Self {
        Self::from_parts(registry, options, Reflective)
    }
}

impl Binder<Compiling> {
    /// Compiling binder whose adapters act with `owner`'s rights
    pub fn new(registry: Arc<TypeRegistry>, owner: OwningModule, options: BinderOptions) -> Self {
        Self::from_parts(registry, options, Compiling::new(owner))
    }

    /// Access rights of the synthesized adapters
    pub fn owner(&self) -> OwningModule {
        self.dispatch.owner()
    }

    /// Number of cached adapters across all caches
    pub fn adapter_count(&self) -> usize {
        self.dispatch.adapter_count()
    }

    /// Number of adapter synthesis runs, including ones lost to races
    pub fn synthesized_count(&self) -> usize {
        self.dispatch.synthesized_count()
    }
}

impl<D: Dispatch> RuntimeBinder for Binder<D> {
    fn backend(&self) -> Backend {
        self.dispatch.backend()
    }

    fn mode(&self) -> BindMode {
        self.core.context.mode()
    }

    fn registry(&self) -> &Arc<TypeRegistry> {
        &self.core.registry
    }

    fn set_line_info(&self, provider: Option<Arc<dyn LineInfo>>) {
        self.core.context.set_line_info(provider);
    }

    fn wrap_failure(&self, kind: ErrorKind, subject: &str, cause: HostError) -> BindError {
        self.core.wrap(kind, subject, cause)
    }

    fn create_instance(&self, ty: TypeKey, args: &[Value]) -> BindResult<Value> {
        self.construct(ty, args)
    }

    fn create_with_factory_method(
        &self,
        ty: TypeKey,
        method: &str,
        args: &[Value],
    ) -> BindResult<Value> {
        self.construct_with_factory(ty, method, args)
    }

    fn get_value(
        &self,
        instance: &Value,
        member: &MemberDescriptor,
        fail_if_write_only: bool,
    ) -> BindResult<Value> {
        self.read_member(instance, member, fail_if_write_only)
    }

    fn set_value(
        &self,
        instance: &Value,
        member: &MemberDescriptor,
        value: &Value,
    ) -> BindResult<()> {
        self.write_member(instance, member, value)
    }

    fn should_serialize(
        &self,
        instance: &Value,
        member: &MemberDescriptor,
    ) -> BindResult<ShouldSerialize> {
        self.query_should_serialize(instance, member)
    }

    fn add(&self, collection: &Value, ty: TypeKey, value: &Value) -> BindResult<()> {
        self.add_item(collection, ty, value)
    }

    fn add_to_dictionary(
        &self,
        dictionary: &Value,
        ty: TypeKey,
        value: &Value,
        key: &Value,
    ) -> BindResult<()> {
        self.add_entry(dictionary, ty, value, key)
    }

    fn get_items(&self, collection: &Value, ty: TypeKey) -> BindResult<Vec<Value>> {
        self.drain_items(collection, ty)
    }

    fn get_dictionary_items(
        &self,
        dictionary: &Value,
        ty: TypeKey,
    ) -> BindResult<Vec<(Value, Value)>> {
        self.drain_entries(dictionary, ty)
    }

    fn create_from_value(
        &self,
        ctx: &ServiceContext,
        converter: &TypeConverterDescriptor,
        value: &Value,
        member: Option<&MemberDescriptor>,
    ) -> BindResult<Value> {
        self.convert_from(ctx, converter, value, member)
    }

    fn convert_to_value_as(
        &self,
        ctx: &ServiceContext,
        converter: &TypeConverterDescriptor,
        value: &Value,
        target: &ParamType,
    ) -> BindResult<Value> {
        self.convert_to(ctx, converter, value, target)
    }

    fn convert_to_string(
        &self,
        ctx: &ServiceContext,
        converter: &TypeConverterDescriptor,
        value: &Value,
    ) -> BindResult<String> {
        self.render(ctx, converter, value)
    }

    fn converter_instance(
        &self,
        converter: &TypeConverterDescriptor,
    ) -> BindResult<Option<Arc<dyn TypeConverter>>> {
        self.cached_converter(converter)
    }

    fn deferring_loader_instance(
        &self,
        loader: &DeferringLoaderDescriptor,
    ) -> BindResult<Option<Arc<dyn DeferringLoader>>> {
        self.cached_loader(loader)
    }

    fn attached_property_count(&self, instance: &Value) -> BindResult<usize> {
        self.count_attached(instance)
    }

    fn get_attached_properties(
        &self,
        instance: &Value,
    ) -> BindResult<Vec<(AttachableMemberId, Value)>> {
        self.list_attached(instance)
    }

    fn initialization_guard(&self, ty: TypeKey, instance: &Value, begin: bool) -> BindResult<()> {
        self.init_session(ty, instance, begin)
    }

    fn set_connection_id(
        &self,
        root: &Value,
        connection_id: i32,
        instance: &Value,
    ) -> BindResult<()> {
        self.connect(root, connection_id, instance)
    }

    fn set_uri_base(&self, ty: TypeKey, instance: &Value, uri: &str) -> BindResult<()> {
        self.assign_base_uri(ty, instance, uri)
    }

    fn call_provide_value(&self, extension: &Value, ctx: &ServiceContext) -> BindResult<Value> {
        self.provide(extension, ctx)
    }

    fn create_delegate(
        &self,
        delegate_type: TypeKey,
        target: &Value,
        method_name: &str,
    ) -> BindResult<BoundDelegate> {
        self.bind_delegate(delegate_type, target, method_name)
    }

    fn deferred_load(
        &self,
        ctx: &ServiceContext,
        loader: &DeferringLoaderDescriptor,
        content: &mut dyn ContentSource,
    ) -> BindResult<Value> {
        self.load_deferred(ctx, loader, content)
    }

    fn deferred_save(
        &self,
        ctx: &ServiceContext,
        loader: &DeferringLoaderDescriptor,
        value: &Value,
    ) -> BindResult<Box<dyn ContentSource>> {
        self.save_deferred(ctx, loader, value)
    }
}
