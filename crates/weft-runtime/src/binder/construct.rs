//! Instance construction and static factories

use std::sync::Arc;

use weft_schema::{MethodHandle, TypeKey};
use weft_sdk::Value;

use super::{Binder, Dispatch};
use crate::error::{BindResult, ErrorKind};
use crate::overload::{self, BindingFailure};

impl<D: Dispatch> Binder<D> {
    fn admitted(&self, methods: &[Arc<MethodHandle>]) -> Vec<Arc<MethodHandle>> {
        methods
            .iter()
            .filter(|m| self.dispatch.admits(m))
            .cloned()
            .collect()
    }

    pub(super) fn construct(&self, ty: TypeKey, args: &[Value]) -> BindResult<Value> {
        let desc = self.core.resolve(ty)?;
        let registry = &self.core.registry;
        let subject = desc.name.as_str();

        if args.is_empty() {
            if let Some(ctor) = desc.default_constructor() {
                return self
                    .dispatch
                    .invoke(registry, ctor, None, &[])
                    .map_err(|err| self.core.wrap(ErrorKind::Construction, subject, err));
            }
        }

        let candidates = self.admitted(&desc.constructors);
        let binding = match overload::select(&**registry, &candidates, args) {
            Ok(binding) => binding,
            Err(BindingFailure::NoMatch) => {
                return Err(self.core.fail(ErrorKind::MissingConstructor, subject, None))
            }
            Err(ambiguous) => {
                let cause = ambiguous.into_host_error(subject);
                return Err(self.core.fail(ErrorKind::Construction, subject, Some(cause)));
            }
        };
        self.dispatch
            .invoke(registry, &binding.method, None, &binding.args)
            .map_err(|err| self.core.wrap(ErrorKind::Construction, subject, err))
    }

    pub(super) fn construct_with_factory(
        &self,
        ty: TypeKey,
        name: &str,
        args: &[Value],
    ) -> BindResult<Value> {
        let desc = self.core.resolve(ty)?;
        let registry = &self.core.registry;
        let subject = format!("{}.{}", desc.name, name);
        let methods = desc.static_methods(name);

        let exact = if args.is_empty() {
            methods
                .iter()
                .find(|m| m.params.is_empty() && self.dispatch.admits(m))
                .cloned()
        } else {
            None
        };
        let (method, call_args) = match exact {
            Some(method) => (method, Vec::new()),
            None => match overload::select(&**registry, &self.admitted(methods), args) {
                Ok(binding) => (binding.method, binding.args),
                Err(BindingFailure::NoMatch) => {
                    return Err(self.core.fail(ErrorKind::MissingFactoryMethod, subject, None))
                }
                Err(ambiguous) => {
                    let cause = ambiguous.into_host_error(&subject);
                    return Err(self.core.fail(ErrorKind::MethodInvocation, subject, Some(cause)));
                }
            },
        };

        let value = self
            .dispatch
            .invoke(registry, &method, None, &call_args)
            .map_err(|err| self.core.wrap(ErrorKind::MethodInvocation, subject.as_str(), err))?;
        if value.is_null() {
            return Err(self.core.fail(ErrorKind::FactoryReturnedNull, subject, None));
        }
        Ok(value)
    }
}
