//! Compiling backend
//!
//! The first call through a constructor, method or accessor synthesizes an
//! adapter: access is decided once under [`AccessPolicy::Owner`], the cast
//! plan is fixed, and the erased body is captured. Later calls only run the
//! adapter. A denied member still gets an adapter; it fails every call with
//! [`HostError::AccessDenied`].

use std::sync::Arc;

use tracing::debug;
use weft_schema::{Getter, MethodHandle, MethodKind, Setter, TypeRegistry};
use weft_sdk::{HostError, HostResult, Value};

use super::adapter_cache::AdapterCache;
use super::{Backend, Dispatch};
use crate::access::{type_name, AccessPolicy, CastPlan, OwningModule};
use crate::delegate::DelegateFn;
use crate::overload::{check_args, check_value};

/// Synthesized constructor / method call
pub type MethodAdapter = Arc<dyn Fn(Option<&Value>, &[Value]) -> HostResult<Value> + Send + Sync>;

/// Synthesized getter
pub type GetAdapter = Arc<dyn Fn(&Value) -> HostResult<Value> + Send + Sync>;

/// Synthesized setter
pub type SetAdapter = Arc<dyn Fn(&Value, &Value) -> HostResult<()> + Send + Sync>;

fn method_fn<F>(f: F) -> MethodAdapter
where
    F: Fn(Option<&Value>, &[Value]) -> HostResult<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn get_fn<F>(f: F) -> GetAdapter
where
    F: Fn(&Value) -> HostResult<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn set_fn<F>(f: F) -> SetAdapter
where
    F: Fn(&Value, &Value) -> HostResult<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Adapter synthesis with one module's access rights
pub struct Compiling {
    owner: OwningModule,
    methods: AdapterCache<MethodAdapter>,
    getters: AdapterCache<GetAdapter>,
    setters: AdapterCache<SetAdapter>,
}

impl Compiling {
    pub fn new(owner: OwningModule) -> Self {
        Self {
            owner,
            methods: AdapterCache::new(),
            getters: AdapterCache::new(),
            setters: AdapterCache::new(),
        }
    }

    pub fn owner(&self) -> OwningModule {
        self.owner
    }

    fn policy(&self) -> AccessPolicy {
        AccessPolicy::Owner(self.owner)
    }

    pub fn adapter_count(&self) -> usize {
        self.methods.entry_count() + self.getters.entry_count() + self.setters.entry_count()
    }

    pub fn synthesized_count(&self) -> usize {
        self.methods.synthesized() + self.getters.synthesized() + self.setters.synthesized()
    }

    fn method_adapter(
        &self,
        registry: &Arc<TypeRegistry>,
        method: &Arc<MethodHandle>,
    ) -> MethodAdapter {
        self.methods
            .get_or_synthesize(method.id, || self.synthesize_method(registry, method))
    }

    fn synthesize_method(
        &self,
        registry: &Arc<TypeRegistry>,
        method: &Arc<MethodHandle>,
    ) -> MethodAdapter {
        let plan = self.policy().plan_method(registry, method);
        debug!(
            method = %method,
            declaring = %type_name(registry, method.declaring),
            plan = ?plan,
            "method adapter synthesized"
        );
        if let CastPlan::Denied(reason) = plan {
            return method_fn(move |_, _| Err(HostError::AccessDenied(reason.clone())));
        }

        let handle = Arc::clone(method);
        let body = method.invoker();
        let registry = Arc::clone(registry);
        match method.kind {
            MethodKind::Instance => method_fn(move |target, args| {
                let args = check_args(&registry, &handle, args)?;
                let target = target.ok_or_else(|| {
                    HostError::Argument(format!(
                        "instance method '{}' called without a target",
                        handle
                    ))
                })?;
                let part = plan.apply(&registry, target)?;
                body(Some(part), &*args)
            }),
            MethodKind::Constructor | MethodKind::Static => method_fn(move |_, args| {
                let args = check_args(&registry, &handle, args)?;
                body(None, &*args)
            }),
        }
    }

    fn synthesize_getter(&self, registry: &Arc<TypeRegistry>, getter: &Getter) -> GetAdapter {
        let plan = self
            .policy()
            .plan(registry, getter.declaring, getter.visibility, "get");
        debug!(
            declaring = %type_name(registry, getter.declaring),
            value_type = %getter.value_type,
            plan = ?plan,
            "getter adapter synthesized"
        );
        if let CastPlan::Denied(reason) = plan {
            return get_fn(move |_| Err(HostError::AccessDenied(reason.clone())));
        }
        let registry = Arc::clone(registry);
        let body = getter.body();
        get_fn(move |instance| {
            let part = plan.apply(&registry, instance)?;
            body(part)
        })
    }

    fn synthesize_setter(&self, registry: &Arc<TypeRegistry>, setter: &Setter) -> SetAdapter {
        let plan = self
            .policy()
            .plan(registry, setter.declaring, setter.visibility, "set");
        debug!(
            declaring = %type_name(registry, setter.declaring),
            value_type = %setter.value_type,
            plan = ?plan,
            "setter adapter synthesized"
        );
        if let CastPlan::Denied(reason) = plan {
            return set_fn(move |_, _| Err(HostError::AccessDenied(reason.clone())));
        }
        let registry = Arc::clone(registry);
        let value_type = setter.value_type.clone();
        let body = setter.body();
        set_fn(move |instance, value| {
            let part = plan.apply(&registry, instance)?;
            let value = check_value(&registry, &value_type, value)?;
            body(part, &*value)
        })
    }
}

impl Dispatch for Compiling {
    fn backend(&self) -> Backend {
        Backend::Compiling
    }

    // Access is decided by the adapter, so every overload competes
    fn admits(&self, _method: &MethodHandle) -> bool {
        true
    }

    fn invoke(
        &self,
        registry: &Arc<TypeRegistry>,
        method: &Arc<MethodHandle>,
        target: Option<&Value>,
        args: &[Value],
    ) -> HostResult<Value> {
        let adapter = self.method_adapter(registry, method);
        adapter(target, args)
    }

    fn get(
        &self,
        registry: &Arc<TypeRegistry>,
        getter: &Arc<Getter>,
        instance: &Value,
    ) -> HostResult<Value> {
        let adapter = self
            .getters
            .get_or_synthesize(getter.id, || self.synthesize_getter(registry, getter));
        adapter(instance)
    }

    fn set(
        &self,
        registry: &Arc<TypeRegistry>,
        setter: &Arc<Setter>,
        instance: &Value,
        value: &Value,
    ) -> HostResult<()> {
        let adapter = self
            .setters
            .get_or_synthesize(setter.id, || self.synthesize_setter(registry, setter));
        adapter(instance, value)
    }

    fn bind(
        &self,
        registry: &Arc<TypeRegistry>,
        method: &Arc<MethodHandle>,
        target: Value,
    ) -> Arc<DelegateFn> {
        let adapter = self.method_adapter(registry, method);
        Arc::new(move |args: &[Value]| adapter(Some(&target), args))
    }
}
