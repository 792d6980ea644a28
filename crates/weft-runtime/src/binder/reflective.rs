//! Reflective backend
//!
//! Nothing is cached: each call plans access under [`AccessPolicy::PublicOnly`],
//! casts the target and validates the arguments before running the erased
//! body. Host failures come back behind one invocation wrapper, the way a
//! generic invoke path reports them.

use std::sync::Arc;

use weft_schema::{Getter, MethodHandle, MethodKind, Setter, TypeRegistry};
use weft_sdk::{HostError, HostResult, Value};

use super::{Backend, Dispatch};
use crate::access::{AccessPolicy, CastPlan};
use crate::delegate::DelegateFn;
use crate::overload::{check_args, check_value};

const POLICY: AccessPolicy = AccessPolicy::PublicOnly;

/// Per-call resolution, public surface only
#[derive(Debug, Clone, Copy, Default)]
pub struct Reflective;

fn allowed(plan: CastPlan) -> HostResult<CastPlan> {
    match plan {
        CastPlan::Denied(reason) => Err(HostError::AccessDenied(reason)),
        plan => Ok(plan),
    }
}

impl Dispatch for Reflective {
    fn backend(&self) -> Backend {
        Backend::Reflective
    }

    fn admits(&self, method: &MethodHandle) -> bool {
        method.visibility.is_public()
            || (method.kind == MethodKind::Constructor && method.params.is_empty())
    }

    fn invoke(
        &self,
        registry: &Arc<TypeRegistry>,
        method: &Arc<MethodHandle>,
        target: Option<&Value>,
        args: &[Value],
    ) -> HostResult<Value> {
        let plan = allowed(POLICY.plan_method(registry, method))?;
        let args = check_args(registry, method, args)?;
        let result = match method.kind {
            MethodKind::Instance => {
                let target = target.ok_or_else(|| {
                    HostError::Argument(format!(
                        "instance method '{}' called without a target",
                        method
                    ))
                })?;
                let part = plan.apply(registry, target)?;
                method.invoke(Some(part), &args)
            }
            MethodKind::Constructor | MethodKind::Static => method.invoke(None, &args),
        };
        result.map_err(HostError::invocation)
    }

    fn get(
        &self,
        registry: &Arc<TypeRegistry>,
        getter: &Arc<Getter>,
        instance: &Value,
    ) -> HostResult<Value> {
        let plan = allowed(POLICY.plan(registry, getter.declaring, getter.visibility, "get"))?;
        let part = plan.apply(registry, instance)?;
        getter.get(part).map_err(HostError::invocation)
    }

    fn set(
        &self,
        registry: &Arc<TypeRegistry>,
        setter: &Arc<Setter>,
        instance: &Value,
        value: &Value,
    ) -> HostResult<()> {
        let plan = allowed(POLICY.plan(registry, setter.declaring, setter.visibility, "set"))?;
        let part = plan.apply(registry, instance)?;
        let value = check_value(registry, &setter.value_type, value)?;
        setter.set(part, &value).map_err(HostError::invocation)
    }

    fn bind(
        &self,
        registry: &Arc<TypeRegistry>,
        method: &Arc<MethodHandle>,
        target: Value,
    ) -> Arc<DelegateFn> {
        let registry = Arc::clone(registry);
        let method = Arc::clone(method);
        Arc::new(move |args: &[Value]| {
            Reflective
                .invoke(&registry, &method, Some(&target), args)
                .map_err(HostError::unwrap_invocation)
        })
    }
}
