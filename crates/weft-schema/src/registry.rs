//! The registration table
//!
//! Populated once at startup (`&mut self`), then shared read-only behind an
//! `Arc` by every binder.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use weft_sdk::{ObjectView, ParamType, Ref, TypeRelation, Value};

use crate::builder::{PendingMethod, TypeBuilder};
use crate::descriptor::{
    Accessor, BaseLink, Capabilities, CollectionCapability, DictionaryCapability, MemberDescriptor,
    MemberKind, MethodHandle, TypeDescriptor,
};
use crate::error::SchemaError;
use crate::id::{ModuleId, TypeKey};
use crate::invoke::Target;

/// All registered modules and types
#[derive(Default)]
pub struct TypeRegistry {
    modules: Vec<String>,
    module_index: FxHashMap<String, ModuleId>,
    types: Vec<Arc<TypeDescriptor>>,
    by_name: FxHashMap<String, TypeKey>,
    by_type_id: FxHashMap<TypeId, TypeKey>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Modules
    // ========================================================================

    /// Get or create the module named `name`
    pub fn module(&mut self, name: &str) -> ModuleId {
        if let Some(id) = self.module_index.get(name) {
            return *id;
        }
        let id = ModuleId::new(self.modules.len() as u32);
        self.modules.push(name.to_string());
        self.module_index.insert(name.to_string(), id);
        id
    }

    /// Look up a module by name
    pub fn module_by_name(&self, name: &str) -> Option<ModuleId> {
        self.module_index.get(name).copied()
    }

    /// Name of a module
    pub fn module_name(&self, id: ModuleId) -> Option<&str> {
        self.modules.get(id.index()).map(String::as_str)
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a host type
    pub fn register<T: Any + Send + Sync>(
        &mut self,
        builder: TypeBuilder<T>,
    ) -> Result<TypeKey, SchemaError> {
        let type_id = TypeId::of::<T>();
        if self.by_name.contains_key(&builder.name) || self.by_type_id.contains_key(&type_id) {
            return Err(SchemaError::DuplicateType(builder.name));
        }
        let key = self.next_key();

        let base = match builder.base {
            Some(pending) => match self.by_type_id.get(&pending.type_id) {
                Some(base_key) => Some(BaseLink {
                    key: *base_key,
                    upcast: pending.upcast,
                }),
                None => {
                    return Err(SchemaError::UnknownBase {
                        type_name: builder.name,
                        base: pending.name,
                    })
                }
            },
            None => None,
        };

        let keyed = |m: PendingMethod| {
            Arc::new(MethodHandle::new(
                m.name,
                key,
                m.visibility,
                m.kind,
                m.params,
                m.invoker,
            ))
        };

        let constructors = builder.constructors.into_iter().map(keyed).collect();
        let static_methods = group_by_name(builder.static_methods.into_iter().map(keyed));
        let instance_methods = group_by_name(builder.instance_methods.into_iter().map(keyed));

        let mut members = FxHashMap::default();
        for pending in builder.members {
            let value_type_key = self.key_for_param(&pending.value_type);
            let getter = pending.getter.map(|body| {
                Arc::new(Accessor::new(
                    key,
                    pending.getter_visibility.unwrap_or(pending.visibility),
                    pending.value_type.clone(),
                    body,
                ))
            });
            let setter = pending.setter.map(|body| {
                Arc::new(Accessor::new(
                    key,
                    pending.setter_visibility.unwrap_or(pending.visibility),
                    pending.value_type.clone(),
                    body,
                ))
            });
            let member = MemberDescriptor {
                name: pending.name.clone(),
                declaring: Some(key),
                kind: if pending.is_event {
                    MemberKind::Event
                } else {
                    MemberKind::Property
                },
                value_type: pending.value_type,
                value_type_key,
                getter,
                setter,
                should_serialize: pending.should_serialize,
                converter: pending.converter,
                deferring_loader: pending.deferring_loader,
            };
            members.insert(pending.name, Arc::new(member));
        }

        let collection = CollectionCapability {
            adders: builder.adders.into_iter().map(keyed).collect(),
            items: builder.items,
        };

        let dictionary = builder.dictionary.map(|dict| DictionaryCapability {
            key_type: dict.key_type,
            value_type: dict.value_type,
            add: keyed(dict.add),
            items: builder.dictionary_items,
            normalize_typed: dict.normalize_typed,
        });

        let descriptor = TypeDescriptor {
            key,
            name: builder.name,
            module: builder.module,
            type_id: Some(type_id),
            base,
            constructors,
            static_methods,
            instance_methods,
            members,
            collection,
            dictionary,
            capabilities: builder.capabilities,
            delegate_signature: None,
        };
        self.insert(descriptor);
        Ok(key)
    }

    /// Register a name with no native backing; it resolves but cannot be built
    pub fn register_unknown(
        &mut self,
        name: &str,
        module: ModuleId,
    ) -> Result<TypeKey, SchemaError> {
        self.register_bare(name, module, None)
    }

    /// Register a delegate type with the given parameter list
    pub fn register_delegate(
        &mut self,
        name: &str,
        module: ModuleId,
        params: Vec<ParamType>,
    ) -> Result<TypeKey, SchemaError> {
        self.register_bare(name, module, Some(params))
    }

    fn register_bare(
        &mut self,
        name: &str,
        module: ModuleId,
        delegate_signature: Option<Vec<ParamType>>,
    ) -> Result<TypeKey, SchemaError> {
        if self.by_name.contains_key(name) {
            return Err(SchemaError::DuplicateType(name.to_string()));
        }
        let key = self.next_key();
        self.insert(TypeDescriptor {
            key,
            name: name.to_string(),
            module,
            type_id: None,
            base: None,
            constructors: Vec::new(),
            static_methods: FxHashMap::default(),
            instance_methods: FxHashMap::default(),
            members: FxHashMap::default(),
            collection: CollectionCapability::default(),
            dictionary: None,
            capabilities: Capabilities::default(),
            delegate_signature,
        });
        Ok(key)
    }

    fn next_key(&self) -> TypeKey {
        TypeKey::new(self.types.len() as u32)
    }

    fn insert(&mut self, descriptor: TypeDescriptor) {
        self.by_name.insert(descriptor.name.clone(), descriptor.key);
        if let Some(type_id) = descriptor.type_id {
            self.by_type_id.insert(type_id, descriptor.key);
        }
        self.types.push(Arc::new(descriptor));
    }

    fn key_for_param(&self, param: &ParamType) -> Option<TypeKey> {
        match param {
            ParamType::Object { type_id, .. } | ParamType::View { type_id, .. } => {
                self.by_type_id.get(type_id).copied()
            }
            ParamType::Optional(inner) => self.key_for_param(inner),
            _ => None,
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Descriptor by key
    pub fn get(&self, key: TypeKey) -> Option<&Arc<TypeDescriptor>> {
        self.types.get(key.index())
    }

    /// Descriptor by full name
    pub fn by_name(&self, name: &str) -> Option<&Arc<TypeDescriptor>> {
        self.by_name.get(name).and_then(|key| self.get(*key))
    }

    /// Descriptor by native type
    pub fn by_type_id(&self, type_id: TypeId) -> Option<&Arc<TypeDescriptor>> {
        self.by_type_id.get(&type_id).and_then(|key| self.get(*key))
    }

    /// Key of native type `T`
    pub fn key_of<T: Any>(&self) -> Option<TypeKey> {
        self.by_type_id.get(&TypeId::of::<T>()).copied()
    }

    /// Descriptor of the concrete type of an object value
    pub fn descriptor_of(&self, value: &Value) -> Option<&Arc<TypeDescriptor>> {
        value.object_type_id().and_then(|id| self.by_type_id(id))
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// `key` followed by its bases, nearest first
    pub fn ancestors(&self, key: TypeKey) -> Ancestors<'_> {
        Ancestors {
            registry: self,
            next: self.get(key),
        }
    }

    /// Whether `to` is `from` or one of its bases
    pub fn is_assignable(&self, from: TypeKey, to: TypeKey) -> bool {
        self.ancestors(from).any(|d| d.key == to)
    }

    /// View `target` as its `to` part, walking upcasts from its concrete type
    pub fn cast<'a>(&self, target: Target<'a>, to: TypeKey) -> Option<Target<'a>> {
        let mut key = self.by_type_id.get(&(*target).type_id()).copied()?;
        let mut current = target;
        loop {
            if key == to {
                return Some(current);
            }
            let base = self.get(key)?.base.as_ref()?;
            current = (base.upcast)(current)?;
            key = base.key;
        }
    }

    /// Prepare `value` for a parameter of type `param`. An object passed for a
    /// view of one of its bases becomes an [`ObjectView`] of that base part;
    /// everything else passes through untouched.
    pub fn coerce<'v>(&self, param: &ParamType, value: &'v Value) -> Cow<'v, Value> {
        match (param, value) {
            (ParamType::View { type_id, .. }, Value::Object(obj)) => {
                if value.object_type_id() == Some(*type_id) {
                    return Cow::Borrowed(value);
                }
                let Some(to) = self.by_type_id.get(type_id).copied() else {
                    return Cow::Borrowed(value);
                };
                match ObjectView::map(Arc::clone(obj), |o| self.cast(o, to)) {
                    Some(view) => Cow::Owned(Value::object(view)),
                    None => Cow::Borrowed(value),
                }
            }
            (ParamType::Optional(inner), v) if !v.is_null() => self.coerce(inner, v),
            (ParamType::List(elem) | ParamType::Rest(elem), Value::List(items)) => {
                let coerced: Vec<Cow<'_, Value>> =
                    items.iter().map(|item| self.coerce(elem, item)).collect();
                if coerced.iter().all(|c| matches!(c, Cow::Borrowed(_))) {
                    return Cow::Borrowed(value);
                }
                Cow::Owned(Value::list(coerced.into_iter().map(Cow::into_owned).collect()))
            }
            _ => Cow::Borrowed(value),
        }
    }

    /// [`coerce`](Self::coerce) every argument against its parameter
    pub fn coerce_args<'v>(&self, params: &[ParamType], args: &'v [Value]) -> Cow<'v, [Value]> {
        let coerced: Vec<Cow<'_, Value>> = params
            .iter()
            .zip(args)
            .map(|(param, arg)| self.coerce(param, arg))
            .collect();
        if coerced.iter().all(|c| matches!(c, Cow::Borrowed(_))) {
            return Cow::Borrowed(args);
        }
        Cow::Owned(coerced.into_iter().map(Cow::into_owned).collect())
    }

    /// Member by name on `key` or its bases
    pub fn find_member(&self, key: TypeKey, name: &str) -> Option<&Arc<MemberDescriptor>> {
        self.ancestors(key).find_map(|d| d.members.get(name))
    }

    /// Instance methods named `name` on `key` and its bases, nearest first
    pub fn instance_methods(&self, key: TypeKey, name: &str) -> Vec<Arc<MethodHandle>> {
        self.ancestors(key)
            .filter_map(|d| d.instance_methods.get(name))
            .flatten()
            .cloned()
            .collect()
    }

    /// Collection `Add` overloads of `key`, falling back to bases
    pub fn collection_adders(&self, key: TypeKey) -> Vec<Arc<MethodHandle>> {
        self.ancestors(key)
            .map(|d| &d.collection.adders)
            .find(|adders| !adders.is_empty())
            .cloned()
            .unwrap_or_default()
    }

    /// Nearest dictionary capability on `key` or its bases
    pub fn dictionary(
        &self,
        key: TypeKey,
    ) -> Option<(&Arc<TypeDescriptor>, &DictionaryCapability)> {
        self.ancestors(key)
            .find_map(|d| d.dictionary.as_ref().map(|dict| (d, dict)))
    }
}

/// Relates native types through registered bases
impl TypeRelation for TypeRegistry {
    fn is_subtype(&self, from: TypeId, to: TypeId) -> bool {
        if from == to {
            return true;
        }
        match (self.by_type_id.get(&from), self.by_type_id.get(&to)) {
            (Some(&from), Some(&to)) => self.is_assignable(from, to),
            _ => false,
        }
    }
}

fn group_by_name(
    methods: impl Iterator<Item = Arc<MethodHandle>>,
) -> FxHashMap<String, Vec<Arc<MethodHandle>>> {
    let mut grouped: FxHashMap<String, Vec<Arc<MethodHandle>>> = FxHashMap::default();
    for method in methods {
        grouped.entry(method.name.clone()).or_default().push(method);
    }
    grouped
}

/// Iterator over a type and its bases
pub struct Ancestors<'r> {
    registry: &'r TypeRegistry,
    next: Option<&'r Arc<TypeDescriptor>>,
}

impl<'r> Iterator for Ancestors<'r> {
    type Item = &'r Arc<TypeDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current
            .base
            .as_ref()
            .and_then(|base| self.registry.get(base.key));
        Some(current)
    }
}
