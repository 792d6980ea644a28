//! Attached properties, lifecycle hooks and delegates
//!
//! Hooks are found through the capabilities registered on the instance's
//! concrete type or its bases. An instance without the capability is left
//! alone, except for markup extensions, where a value is required.

use std::sync::Arc;

use tracing::{debug, trace};
use weft_schema::invoke::ProjectFn;
use weft_schema::{guarded, Capabilities, TypeKey};
use weft_sdk::{AttachableMemberId, HostError, HostResult, ServiceContext, Value};

use super::{Binder, Dispatch};
use crate::access::CastPlan;
use crate::delegate::BoundDelegate;
use crate::error::{BindError, BindResult, ErrorKind};

impl<D: Dispatch> Binder<D> {
    /// Project `instance` onto the nearest registered capability
    fn project<'v, Tr: ?Sized + 'static>(
        &self,
        instance: &'v Value,
        pick: impl Fn(&Capabilities) -> Option<&Arc<ProjectFn<Tr>>>,
    ) -> HostResult<Option<&'v Tr>> {
        let registry = &self.core.registry;
        let concrete = match registry.descriptor_of(instance) {
            Some(desc) => desc.key,
            None => return Ok(None),
        };
        let found = registry
            .ancestors(concrete)
            .find_map(|d| pick(&d.capabilities).map(|projection| (d.key, Arc::clone(projection))));
        let (declaring, projection) = match found {
            Some(found) => found,
            None => return Ok(None),
        };
        let part = CastPlan::Direct { declaring }.apply(registry, instance)?;
        Ok(projection(part))
    }

    /// Registered type name of a value, for error subjects
    fn value_subject(&self, value: &Value) -> String {
        self.core
            .registry
            .descriptor_of(value)
            .map(|d| d.name.clone())
            .unwrap_or_else(|| value.type_name().to_string())
    }

    fn attached_failure(&self, instance: &Value, err: HostError) -> BindError {
        self.core.wrap(ErrorKind::AttachedProperty, self.value_subject(instance), err)
    }

    pub(super) fn count_attached(&self, instance: &Value) -> BindResult<usize> {
        match &self.core.attached {
            Some(store) => guarded(|| store.property_count(instance))
                .map_err(|err| self.attached_failure(instance, err)),
            None => Ok(0),
        }
    }

    pub(super) fn list_attached(
        &self,
        instance: &Value,
    ) -> BindResult<Vec<(AttachableMemberId, Value)>> {
        match &self.core.attached {
            Some(store) => guarded(|| store.properties(instance))
                .map_err(|err| self.attached_failure(instance, err)),
            None => Ok(Vec::new()),
        }
    }

    pub(super) fn init_session(
        &self,
        ty: TypeKey,
        instance: &Value,
        begin: bool,
    ) -> BindResult<()> {
        let wrap = |err| self.core.wrap(ErrorKind::Initialization, self.core.type_name(ty), err);
        let hook = match self.project(instance, |c| c.initialize.as_ref()).map_err(wrap)? {
            Some(hook) => hook,
            None => {
                trace!(ty = %ty, "no init hooks registered");
                return Ok(());
            }
        };
        guarded(|| if begin { hook.begin_init() } else { hook.end_init() }).map_err(wrap)
    }

    pub(super) fn connect(
        &self,
        root: &Value,
        connection_id: i32,
        instance: &Value,
    ) -> BindResult<()> {
        let wrap = |err| self.core.wrap(ErrorKind::SetConnectionId, self.value_subject(root), err);
        match self.project(root, |c| c.connector.as_ref()).map_err(wrap)? {
            Some(connector) => guarded(|| connector.connect(connection_id, instance)).map_err(wrap),
            None => Ok(()),
        }
    }

    pub(super) fn assign_base_uri(
        &self,
        ty: TypeKey,
        instance: &Value,
        uri: &str,
    ) -> BindResult<()> {
        let wrap = |err| self.core.wrap(ErrorKind::SetUriBase, self.core.type_name(ty), err);
        match self.project(instance, |c| c.uri_context.as_ref()).map_err(wrap)? {
            Some(context) => guarded(|| context.set_base_uri(uri)).map_err(wrap),
            None => Ok(()),
        }
    }

    pub(super) fn provide(&self, extension: &Value, ctx: &ServiceContext) -> BindResult<Value> {
        let subject = self.value_subject(extension);
        let wrap = |err| self.core.wrap(ErrorKind::ProvideValue, subject.as_str(), err);
        match self.project(extension, |c| c.markup_extension.as_ref()).map_err(wrap)? {
            Some(markup) => guarded(|| markup.provide_value(ctx)).map_err(wrap),
            None => {
                let cause = HostError::NotSupported("value is not a markup extension".to_string());
                Err(self.core.fail(ErrorKind::ProvideValue, subject.as_str(), Some(cause)))
            }
        }
    }

    pub(super) fn bind_delegate(
        &self,
        delegate_type: TypeKey,
        target: &Value,
        method_name: &str,
    ) -> BindResult<BoundDelegate> {
        let registry = &self.core.registry;
        let subject = format!("{}.{}", self.value_subject(target), method_name);
        let fail = |cause: HostError| {
            self.core.fail(ErrorKind::CreateDelegate, subject.as_str(), Some(cause))
        };

        let desc = match registry.get(delegate_type) {
            Some(desc) => desc,
            None => {
                let subject = delegate_type.to_string();
                return Err(self.core.fail(ErrorKind::UnresolvedType, subject, None));
            }
        };
        let signature = match &desc.delegate_signature {
            Some(signature) => signature,
            None => {
                return Err(fail(HostError::NotSupported(format!(
                    "'{}' is not a delegate type",
                    desc.name
                ))))
            }
        };
        let concrete = match registry.descriptor_of(target) {
            Some(concrete) => concrete.key,
            None => {
                return Err(fail(HostError::InvalidCast {
                    expected: "registered object".to_string(),
                    got: target.type_name().to_string(),
                }))
            }
        };
        let method = registry
            .instance_methods(concrete, method_name)
            .into_iter()
            .find(|m| &m.params == signature && self.dispatch.admits(m));
        let method = match method {
            Some(method) => method,
            None => {
                return Err(fail(HostError::NotSupported(format!(
                    "no accessible '{}' matches {}",
                    method_name, desc.name
                ))))
            }
        };

        debug!(delegate = %desc.name, method = %method, "delegate bound");
        let call = self.dispatch.bind(registry, &method, target.clone());
        Ok(BoundDelegate::new(delegate_type, method, target.clone(), call))
    }
}
