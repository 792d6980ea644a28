//! Type, member and method descriptors
//!
//! Descriptors are immutable once registered and are shared as `Arc`s, so
//! binders on different threads can hold them without locking.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use weft_sdk::{
    ComponentConnector, HostResult, IntoValue, MarkupExtension, ParamType, SupportInitialize,
    TypedPairIter, UriContext, Value,
};

use crate::converter::{DeferringLoaderDescriptor, TypeConverterDescriptor};
use crate::id::{HandleId, ModuleId, TypeKey};
use crate::invoke::{
    DictItemsFn, GetFn, InvokeFn, ItemsFn, ProjectFn, SetFn, ShouldSerializeFn, Target, UpcastFn,
};

// ============================================================================
// Visibility
// ============================================================================

/// Declared accessibility of a constructor, method or accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Visible everywhere
    #[default]
    Public,
    /// Visible inside the declaring module
    Internal,
    /// Visible to the declaring type and types derived from it
    Protected,
    /// `Internal` or `Protected`
    ProtectedInternal,
    /// Visible to the declaring type only
    Private,
}

impl Visibility {
    /// Whether the member is public
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Visibility::Public => "public",
            Visibility::Internal => "internal",
            Visibility::Protected => "protected",
            Visibility::ProtectedInternal => "protected internal",
            Visibility::Private => "private",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Methods
// ============================================================================

/// What a method handle stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Builds a new instance
    Constructor,
    /// Static method (factory, helper)
    Static,
    /// Method taking a receiver
    Instance,
}

/// A registered constructor or method
pub struct MethodHandle {
    /// Adapter cache key
    pub id: HandleId,
    /// Method name (`.ctor` for constructors)
    pub name: String,
    /// Declaring type
    pub declaring: TypeKey,
    /// Accessibility
    pub visibility: Visibility,
    /// Constructor, static or instance
    pub kind: MethodKind,
    /// Declared parameters
    pub params: Vec<ParamType>,
    invoker: Arc<InvokeFn>,
}

impl MethodHandle {
    pub(crate) fn new(
        name: String,
        declaring: TypeKey,
        visibility: Visibility,
        kind: MethodKind,
        params: Vec<ParamType>,
        invoker: Arc<InvokeFn>,
    ) -> Self {
        Self {
            id: HandleId::new(),
            name,
            declaring,
            visibility,
            kind,
            params,
            invoker,
        }
    }

    /// Call with already bound arguments.
    ///
    /// `target` must already be cast to the declaring type for instance
    /// methods and is ignored otherwise.
    pub fn invoke(&self, target: Option<Target<'_>>, args: &[Value]) -> HostResult<Value> {
        (self.invoker)(target, args)
    }

    /// Erased body, for adapters that capture it
    pub fn invoker(&self) -> Arc<InvokeFn> {
        Arc::clone(&self.invoker)
    }

    /// Whether the last parameter is a rest array
    pub fn is_variadic(&self) -> bool {
        self.params.last().and_then(ParamType::rest_element).is_some()
    }
}

impl fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("declaring", &self.declaring)
            .field("visibility", &self.visibility)
            .field("kind", &self.kind)
            .field("params", &self.params)
            .finish()
    }
}

impl fmt::Display for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, ")")
    }
}

// ============================================================================
// Accessors
// ============================================================================

/// A getter, setter or event adder
pub struct Accessor<F: ?Sized> {
    /// Adapter cache key
    pub id: HandleId,
    /// Declaring type
    pub declaring: TypeKey,
    /// Accessibility
    pub visibility: Visibility,
    /// Type of the value read or written
    pub value_type: ParamType,
    call: Arc<F>,
}

/// Property getter
pub type Getter = Accessor<GetFn>;

/// Property setter / event adder
pub type Setter = Accessor<SetFn>;

impl<F: ?Sized> Accessor<F> {
    pub(crate) fn new(
        declaring: TypeKey,
        visibility: Visibility,
        value_type: ParamType,
        call: Arc<F>,
    ) -> Self {
        Self {
            id: HandleId::new(),
            declaring,
            visibility,
            value_type,
            call,
        }
    }

    /// Erased body, for adapters that capture it
    pub fn body(&self) -> Arc<F> {
        Arc::clone(&self.call)
    }
}

impl Accessor<GetFn> {
    /// Read from a target already cast to the declaring type
    pub fn get(&self, target: Target<'_>) -> HostResult<Value> {
        (self.call)(target)
    }
}

impl Accessor<SetFn> {
    /// Write to a target already cast to the declaring type
    pub fn set(&self, target: Target<'_>, value: &Value) -> HostResult<()> {
        (self.call)(target, value)
    }
}

impl<F: ?Sized> fmt::Debug for Accessor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("id", &self.id)
            .field("declaring", &self.declaring)
            .field("visibility", &self.visibility)
            .field("value_type", &self.value_type)
            .finish()
    }
}

// ============================================================================
// Members
// ============================================================================

/// Member flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Ordinary property
    Property,
    /// Event; its setter is the adder
    Event,
    /// Document-level pseudo member with no storage
    Directive,
}

/// Result of a should-serialize query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShouldSerialize {
    /// No hook registered; the caller decides
    Default,
    /// Hook said yes
    Yes,
    /// Hook said no
    No,
}

/// A settable/gettable member of a type
pub struct MemberDescriptor {
    /// Member name
    pub name: String,
    /// Declaring type (`None` for directives)
    pub declaring: Option<TypeKey>,
    /// Member flavor
    pub kind: MemberKind,
    /// Declared value type
    pub value_type: ParamType,
    /// Registered type of the value, when known
    pub value_type_key: Option<TypeKey>,
    /// Read accessor
    pub getter: Option<Arc<Getter>>,
    /// Write accessor (adder for events)
    pub setter: Option<Arc<Setter>>,
    /// Should-serialize hook
    pub should_serialize: Option<Arc<ShouldSerializeFn>>,
    /// Value converter
    pub converter: Option<TypeConverterDescriptor>,
    /// Deferring loader
    pub deferring_loader: Option<DeferringLoaderDescriptor>,
}

impl MemberDescriptor {
    /// Directive whose value is an instance of `value_type`
    pub fn directive(name: impl Into<String>, value_type: TypeKey) -> Self {
        Self {
            name: name.into(),
            declaring: None,
            kind: MemberKind::Directive,
            value_type: ParamType::Any,
            value_type_key: Some(value_type),
            getter: None,
            setter: None,
            should_serialize: None,
            converter: None,
            deferring_loader: None,
        }
    }

    /// Whether this is a directive
    pub fn is_directive(&self) -> bool {
        self.kind == MemberKind::Directive
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("declaring", &self.declaring)
            .field("kind", &self.kind)
            .field("value_type", &self.value_type)
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

// ============================================================================
// Type-level capabilities
// ============================================================================

/// Link to the base type
pub struct BaseLink {
    /// Base type
    pub key: TypeKey,
    /// Reach the embedded base part of an instance
    pub upcast: Arc<UpcastFn>,
}

/// Collection behavior
#[derive(Default)]
pub struct CollectionCapability {
    /// `Add` overloads
    pub adders: Vec<Arc<MethodHandle>>,
    /// Item enumeration
    pub items: Option<Arc<ItemsFn>>,
}

impl CollectionCapability {
    /// Whether the type behaves as a collection at all
    pub fn is_collection(&self) -> bool {
        !self.adders.is_empty() || self.items.is_some()
    }
}

/// Normalized `(key, value)` iterator
pub type PairIter = Box<dyn Iterator<Item = HostResult<(Value, Value)>> + Send>;

/// Tries to view an opaque iterator as the dictionary's typed pair iterator,
/// handing the box back when it is something else
pub type NormalizeTypedFn = fn(Box<dyn Any + Send>) -> Result<PairIter, Box<dyn Any + Send>>;

/// Dictionary behavior
pub struct DictionaryCapability {
    /// Declared key type
    pub key_type: ParamType,
    /// Declared value type
    pub value_type: ParamType,
    /// `Add(key, value)`
    pub add: Arc<MethodHandle>,
    /// Item enumeration
    pub items: Option<Arc<DictItemsFn>>,
    /// Adapter for the typed pair shape, monomorphized over the key/value types
    pub normalize_typed: NormalizeTypedFn,
}

/// Adapt a [`TypedPairIter<K, V>`] into a [`PairIter`].
pub fn normalize_typed_pairs<K, V>(
    iter: Box<dyn Any + Send>,
) -> Result<PairIter, Box<dyn Any + Send>>
where
    K: IntoValue + Send + 'static,
    V: IntoValue + Send + 'static,
{
    let typed = iter.downcast::<TypedPairIter<K, V>>()?;
    let pairs = typed.map(|entry| entry.map(|(k, v)| (k.into_value(), v.into_value())));
    Ok(Box::new(pairs))
}

/// Lifecycle capabilities, each a projection from an instance to the trait
#[derive(Default)]
pub struct Capabilities {
    /// Begin/end init hooks
    pub initialize: Option<Arc<ProjectFn<dyn SupportInitialize>>>,
    /// Named-element wiring on root objects
    pub connector: Option<Arc<ProjectFn<dyn ComponentConnector>>>,
    /// Base URI receiver
    pub uri_context: Option<Arc<ProjectFn<dyn UriContext>>>,
    /// Markup extension
    pub markup_extension: Option<Arc<ProjectFn<dyn MarkupExtension>>>,
}

// ============================================================================
// Types
// ============================================================================

/// Everything the binder knows about one type
pub struct TypeDescriptor {
    /// Registry key
    pub key: TypeKey,
    /// Full name
    pub name: String,
    /// Owning module
    pub module: ModuleId,
    /// Native type; `None` marks an unknown type that cannot be instantiated
    pub type_id: Option<TypeId>,
    /// Base type
    pub base: Option<BaseLink>,
    /// Constructors
    pub constructors: Vec<Arc<MethodHandle>>,
    /// Static methods by name
    pub static_methods: FxHashMap<String, Vec<Arc<MethodHandle>>>,
    /// Instance methods by name (own, not inherited)
    pub instance_methods: FxHashMap<String, Vec<Arc<MethodHandle>>>,
    /// Members by name (own, not inherited)
    pub members: FxHashMap<String, Arc<MemberDescriptor>>,
    /// Collection behavior
    pub collection: CollectionCapability,
    /// Dictionary behavior
    pub dictionary: Option<DictionaryCapability>,
    /// Lifecycle hooks
    pub capabilities: Capabilities,
    /// Parameter list, when this type is a delegate type
    pub delegate_signature: Option<Vec<ParamType>>,
}

impl TypeDescriptor {
    /// Whether the type has no native backing
    pub fn is_unknown(&self) -> bool {
        self.type_id.is_none()
    }

    /// Own member by name
    pub fn member(&self, name: &str) -> Option<&Arc<MemberDescriptor>> {
        self.members.get(name)
    }

    /// Zero-argument constructor of any visibility
    pub fn default_constructor(&self) -> Option<&Arc<MethodHandle>> {
        self.constructors.iter().find(|c| c.params.is_empty())
    }

    /// Static methods named `name`
    pub fn static_methods(&self, name: &str) -> &[Arc<MethodHandle>] {
        self.static_methods.get(name).map_or(&[], Vec::as_slice)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("module", &self.module)
            .field("base", &self.base.as_ref().map(|b| b.key))
            .field("constructors", &self.constructors.len())
            .field("members", &self.members.len())
            .finish()
    }
}
