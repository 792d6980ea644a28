//! Bound delegates: an instance method closed over its target

use std::fmt;
use std::sync::Arc;

use weft_schema::{guarded, MethodHandle, TypeKey};
use weft_sdk::{HostResult, Value};

/// Erased delegate body
pub type DelegateFn = dyn Fn(&[Value]) -> HostResult<Value> + Send + Sync;

/// Result of `create_delegate`
#[derive(Clone)]
pub struct BoundDelegate {
    delegate_type: TypeKey,
    method: Arc<MethodHandle>,
    target: Value,
    call: Arc<DelegateFn>,
}

impl BoundDelegate {
    pub(crate) fn new(
        delegate_type: TypeKey,
        method: Arc<MethodHandle>,
        target: Value,
        call: Arc<DelegateFn>,
    ) -> Self {
        Self {
            delegate_type,
            method,
            target,
            call,
        }
    }

    pub fn delegate_type(&self) -> TypeKey {
        self.delegate_type
    }

    /// Method the delegate forwards to
    pub fn method(&self) -> &Arc<MethodHandle> {
        &self.method
    }

    pub fn target(&self) -> &Value {
        &self.target
    }

    /// Call the bound method
    pub fn invoke(&self, args: &[Value]) -> HostResult<Value> {
        guarded(|| (self.call)(args))
    }
}

impl fmt::Debug for BoundDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundDelegate")
            .field("delegate_type", &self.delegate_type)
            .field("method", &self.method.to_string())
            .field("target", &self.target)
            .finish()
    }
}
