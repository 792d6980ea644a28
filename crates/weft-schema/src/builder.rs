//! Typed registration front end
//!
//! `TypeBuilder<T>` collects typed closures for one host type and erases them.
//! Nothing is keyed yet: handle ids and the declaring [`TypeKey`](crate::TypeKey)
//! are assigned when the builder is handed to
//! [`TypeRegistry::register`](crate::TypeRegistry::register).
//!
//! ```ignore
//! let widget = TypeBuilder::<Widget>::new("ui.Widget", module)
//!     .constructor(Visibility::Public, || Ok(Widget::default()))
//!     .property::<i64>("Width", |m| m.getter(|w| Ok(w.width())).setter(|w, v| w.set_width(v)))
//!     .supports_initialize();
//! let key = registry.register(widget)?;
//! ```

use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use weft_sdk::{
    ComponentConnector, DictionaryItems, FromValue, HostError, HostResult, IntoValue, ItemIter,
    MarkupExtension, ParamType, SupportInitialize, UriContext, Value,
};

use crate::converter::{DeferringLoaderDescriptor, TypeConverterDescriptor};
use crate::descriptor::{
    normalize_typed_pairs, Capabilities, MethodKind, NormalizeTypedFn, Visibility,
};
use crate::id::ModuleId;
use crate::invoke::{
    cast_target, guarded, project_fn, upcast_fn, DictItemsFn, GetFn, HostFn, HostMethod, InvokeFn,
    ItemsFn, SetFn, ShouldSerializeFn, Target, UpcastFn,
};

pub(crate) const CONSTRUCTOR_NAME: &str = ".ctor";
pub(crate) const ADD_METHOD_NAME: &str = "Add";

// ============================================================================
// Pending (unkeyed) parts
// ============================================================================

pub(crate) struct PendingMethod {
    pub name: String,
    pub visibility: Visibility,
    pub kind: MethodKind,
    pub params: Vec<ParamType>,
    pub invoker: Arc<InvokeFn>,
}

pub(crate) struct PendingMember {
    pub name: String,
    pub is_event: bool,
    pub visibility: Visibility,
    pub value_type: ParamType,
    pub getter: Option<Arc<GetFn>>,
    pub setter: Option<Arc<SetFn>>,
    pub getter_visibility: Option<Visibility>,
    pub setter_visibility: Option<Visibility>,
    pub should_serialize: Option<Arc<ShouldSerializeFn>>,
    pub converter: Option<TypeConverterDescriptor>,
    pub deferring_loader: Option<DeferringLoaderDescriptor>,
}

pub(crate) struct PendingBase {
    pub type_id: TypeId,
    pub name: &'static str,
    pub upcast: Arc<UpcastFn>,
}

pub(crate) struct PendingDictionary {
    pub key_type: ParamType,
    pub value_type: ParamType,
    pub add: PendingMethod,
    pub normalize_typed: NormalizeTypedFn,
}

fn receiver<'a, T: Any>(target: Option<Target<'a>>) -> HostResult<&'a T> {
    match target {
        Some(target) => cast_target::<T>(target),
        None => Err(HostError::Argument("instance method called without a receiver".to_string())),
    }
}

fn erase_method<T, Args, F>(f: F) -> (Vec<ParamType>, Arc<InvokeFn>)
where
    T: Any,
    F: HostMethod<T, Args>,
    F::Output: IntoValue,
{
    let params = F::param_types();
    let invoker: Arc<InvokeFn> =
        Arc::new(move |target: Option<&(dyn Any + Send + Sync)>, args: &[Value]| {
            let this = receiver::<T>(target)?;
            guarded(|| f.call_with(this, args)).map(IntoValue::into_value)
        });
    (params, invoker)
}

fn erase_static<Args, F>(f: F) -> (Vec<ParamType>, Arc<InvokeFn>)
where
    F: HostFn<Args>,
    F::Output: IntoValue,
{
    let params = F::param_types();
    let invoker: Arc<InvokeFn> =
        Arc::new(move |_target: Option<&(dyn Any + Send + Sync)>, args: &[Value]| {
            guarded(|| f.call_with(args)).map(IntoValue::into_value)
        });
    (params, invoker)
}

// ============================================================================
// TypeBuilder
// ============================================================================

/// Collects the registration of one host type `T`
pub struct TypeBuilder<T> {
    pub(crate) name: String,
    pub(crate) module: ModuleId,
    pub(crate) base: Option<PendingBase>,
    pub(crate) constructors: Vec<PendingMethod>,
    pub(crate) static_methods: Vec<PendingMethod>,
    pub(crate) instance_methods: Vec<PendingMethod>,
    pub(crate) members: Vec<PendingMember>,
    pub(crate) adders: Vec<PendingMethod>,
    pub(crate) items: Option<Arc<ItemsFn>>,
    pub(crate) dictionary: Option<PendingDictionary>,
    pub(crate) dictionary_items: Option<Arc<DictItemsFn>>,
    pub(crate) capabilities: Capabilities,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> TypeBuilder<T> {
    /// Start registering `T` under `name` in `module`
    pub fn new(name: impl Into<String>, module: ModuleId) -> Self {
        Self {
            name: name.into(),
            module,
            base: None,
            constructors: Vec::new(),
            static_methods: Vec::new(),
            instance_methods: Vec::new(),
            members: Vec::new(),
            adders: Vec::new(),
            items: None,
            dictionary: None,
            dictionary_items: None,
            capabilities: Capabilities::default(),
            _marker: PhantomData,
        }
    }

    /// Declare `B` as the base type; `upcast` reaches the embedded base part.
    ///
    /// `B` must be registered before `T`.
    pub fn base<B: Any + Send + Sync>(mut self, upcast: fn(&T) -> &B) -> Self {
        self.base = Some(PendingBase {
            type_id: TypeId::of::<B>(),
            name: std::any::type_name::<B>(),
            upcast: upcast_fn(move |target| {
                target
                    .downcast_ref::<T>()
                    .map(|derived| upcast(derived) as &(dyn Any + Send + Sync))
            }),
        });
        self
    }

    /// Register a constructor
    pub fn constructor<Args, F>(mut self, visibility: Visibility, f: F) -> Self
    where
        F: HostFn<Args, Output = T>,
    {
        let params = F::param_types();
        let invoker: Arc<InvokeFn> =
            Arc::new(move |_target: Option<&(dyn Any + Send + Sync)>, args: &[Value]| {
                guarded(|| f.call_with(args)).map(Value::object)
            });
        self.constructors.push(PendingMethod {
            name: CONSTRUCTOR_NAME.to_string(),
            visibility,
            kind: MethodKind::Constructor,
            params,
            invoker,
        });
        self
    }

    /// Register a static method (factory methods are static methods)
    pub fn static_method<Args, F>(mut self, name: &str, visibility: Visibility, f: F) -> Self
    where
        F: HostFn<Args>,
        F::Output: IntoValue,
    {
        let (params, invoker) = erase_static::<Args, F>(f);
        self.static_methods.push(PendingMethod {
            name: name.to_string(),
            visibility,
            kind: MethodKind::Static,
            params,
            invoker,
        });
        self
    }

    /// Register an instance method
    pub fn method<Args, F>(mut self, name: &str, visibility: Visibility, f: F) -> Self
    where
        F: HostMethod<T, Args>,
        F::Output: IntoValue,
    {
        let (params, invoker) = erase_method::<T, Args, F>(f);
        self.instance_methods.push(PendingMethod {
            name: name.to_string(),
            visibility,
            kind: MethodKind::Instance,
            params,
            invoker,
        });
        self
    }

    /// Register a property with value type `V`
    pub fn property<V>(
        mut self,
        name: &str,
        configure: impl FnOnce(MemberBuilder<T, V>) -> MemberBuilder<T, V>,
    ) -> Self
    where
        V: FromValue + IntoValue + 'static,
    {
        let member = configure(MemberBuilder::new(name));
        self.members.push(member.member);
        self
    }

    /// Register an event; `adder` attaches a handler
    pub fn event<V, F>(mut self, name: &str, visibility: Visibility, adder: F) -> Self
    where
        V: FromValue + 'static,
        F: Fn(&T, V) -> HostResult<()> + Send + Sync + 'static,
    {
        let body: Arc<SetFn> = Arc::new(move |target: &(dyn Any + Send + Sync), value: &Value| {
            let this = cast_target::<T>(target)?;
            let handler = V::from_value(value)?;
            guarded(|| adder(this, handler))
        });
        self.members.push(PendingMember {
            name: name.to_string(),
            is_event: true,
            visibility,
            value_type: V::param_type(),
            getter: None,
            setter: Some(body),
            getter_visibility: None,
            setter_visibility: None,
            should_serialize: None,
            converter: None,
            deferring_loader: None,
        });
        self
    }

    /// Register an `Add` overload, making `T` a collection
    pub fn collection_add<Args, F>(mut self, f: F) -> Self
    where
        F: HostMethod<T, Args>,
        F::Output: IntoValue,
    {
        let (params, invoker) = erase_method::<T, Args, F>(f);
        self.adders.push(PendingMethod {
            name: ADD_METHOD_NAME.to_string(),
            visibility: Visibility::Public,
            kind: MethodKind::Instance,
            params,
            invoker,
        });
        self
    }

    /// Register item enumeration; `Ok(None)` models a null iterator
    pub fn collection_items<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> HostResult<Option<ItemIter>> + Send + Sync + 'static,
    {
        self.items = Some(Arc::new(move |target: &(dyn Any + Send + Sync)| {
            let this = cast_target::<T>(target)?;
            guarded(|| f(this))
        }));
        self
    }

    /// Make `T` a dictionary over `K`/`V` with the given `Add(key, value)`
    pub fn dictionary<K, V, F>(mut self, add: F) -> Self
    where
        K: FromValue + IntoValue + Send + 'static,
        V: FromValue + IntoValue + Send + 'static,
        F: Fn(&T, K, V) -> HostResult<()> + Send + Sync + 'static,
    {
        let (params, invoker) = erase_method::<T, (K, V), F>(add);
        self.dictionary = Some(PendingDictionary {
            key_type: K::param_type(),
            value_type: V::param_type(),
            add: PendingMethod {
                name: ADD_METHOD_NAME.to_string(),
                visibility: Visibility::Public,
                kind: MethodKind::Instance,
                params,
                invoker,
            },
            normalize_typed: normalize_typed_pairs::<K, V>,
        });
        self
    }

    /// Register dictionary item enumeration; `Ok(None)` models a null iterator
    pub fn dictionary_items<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> HostResult<Option<DictionaryItems>> + Send + Sync + 'static,
    {
        self.dictionary_items = Some(Arc::new(move |target: &(dyn Any + Send + Sync)| {
            let this = cast_target::<T>(target)?;
            guarded(|| f(this))
        }));
        self
    }

    /// `T` brackets bulk assignment with begin/end init
    pub fn supports_initialize(mut self) -> Self
    where
        T: SupportInitialize,
    {
        self.capabilities.initialize = Some(project_fn(|target| {
            target
                .downcast_ref::<T>()
                .map(|t| t as &(dyn SupportInitialize + 'static))
        }));
        self
    }

    /// `T` is a root object that wires named elements
    pub fn component_connector(mut self) -> Self
    where
        T: ComponentConnector,
    {
        self.capabilities.connector = Some(project_fn(|target| {
            target
                .downcast_ref::<T>()
                .map(|t| t as &(dyn ComponentConnector + 'static))
        }));
        self
    }

    /// `T` wants the document base URI
    pub fn uri_context(mut self) -> Self
    where
        T: UriContext,
    {
        self.capabilities.uri_context = Some(project_fn(|target| {
            target
                .downcast_ref::<T>()
                .map(|t| t as &(dyn UriContext + 'static))
        }));
        self
    }

    /// `T` is a markup extension
    pub fn markup_extension(mut self) -> Self
    where
        T: MarkupExtension,
    {
        self.capabilities.markup_extension = Some(project_fn(|target| {
            target
                .downcast_ref::<T>()
                .map(|t| t as &(dyn MarkupExtension + 'static))
        }));
        self
    }
}

// ============================================================================
// MemberBuilder
// ============================================================================

/// Configures one property of `T` with value type `V`
pub struct MemberBuilder<T, V> {
    member: PendingMember,
    _marker: PhantomData<fn(&T) -> V>,
}

impl<T, V> MemberBuilder<T, V>
where
    T: Any + Send + Sync,
    V: FromValue + IntoValue + 'static,
{
    fn new(name: &str) -> Self {
        Self {
            member: PendingMember {
                name: name.to_string(),
                is_event: false,
                visibility: Visibility::Public,
                value_type: V::param_type(),
                getter: None,
                setter: None,
                getter_visibility: None,
                setter_visibility: None,
                should_serialize: None,
                converter: None,
                deferring_loader: None,
            },
            _marker: PhantomData,
        }
    }

    /// Visibility of both accessors unless overridden
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.member.visibility = visibility;
        self
    }

    /// Read accessor
    pub fn getter<G>(mut self, g: G) -> Self
    where
        G: Fn(&T) -> HostResult<V> + Send + Sync + 'static,
    {
        let body: Arc<GetFn> = Arc::new(move |target: &(dyn Any + Send + Sync)| {
            let this = cast_target::<T>(target)?;
            guarded(|| g(this)).map(IntoValue::into_value)
        });
        self.member.getter = Some(body);
        self
    }

    /// Write accessor
    pub fn setter<S>(mut self, s: S) -> Self
    where
        S: Fn(&T, V) -> HostResult<()> + Send + Sync + 'static,
    {
        let body: Arc<SetFn> = Arc::new(move |target: &(dyn Any + Send + Sync), value: &Value| {
            let this = cast_target::<T>(target)?;
            let value = V::from_value(value)?;
            guarded(|| s(this, value))
        });
        self.member.setter = Some(body);
        self
    }

    /// Override the getter's visibility
    pub fn getter_visibility(mut self, visibility: Visibility) -> Self {
        self.member.getter_visibility = Some(visibility);
        self
    }

    /// Override the setter's visibility
    pub fn setter_visibility(mut self, visibility: Visibility) -> Self {
        self.member.setter_visibility = Some(visibility);
        self
    }

    /// Should-serialize hook
    pub fn should_serialize<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> HostResult<bool> + Send + Sync + 'static,
    {
        self.member.should_serialize = Some(Arc::new(move |target: &(dyn Any + Send + Sync)| {
            let this = cast_target::<T>(target)?;
            guarded(|| f(this))
        }));
        self
    }

    /// Value converter
    pub fn converter(mut self, converter: TypeConverterDescriptor) -> Self {
        self.member.converter = Some(converter);
        self
    }

    /// Deferring loader
    pub fn deferring_loader(mut self, loader: DeferringLoaderDescriptor) -> Self {
        self.member.deferring_loader = Some(loader);
        self
    }
}
