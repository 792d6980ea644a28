//! Member reads and writes

use weft_schema::{guarded, MemberDescriptor, ShouldSerialize};
use weft_sdk::{HostError, Value};

use super::{Binder, Dispatch};
use crate::access::CastPlan;
use crate::error::{BindResult, ErrorKind};

impl<D: Dispatch> Binder<D> {
    pub(super) fn read_member(
        &self,
        instance: &Value,
        member: &MemberDescriptor,
        fail_if_write_only: bool,
    ) -> BindResult<Value> {
        if member.is_directive() {
            // Errors from the nested construction pass through unchanged
            return match member.value_type_key {
                Some(ty) => self.construct(ty, &[]),
                None => Err(self.core.fail(ErrorKind::UnresolvedType, member.name.as_str(), None)),
            };
        }

        let subject = self.core.member_subject(member);
        let getter = match &member.getter {
            Some(getter) => getter,
            None if fail_if_write_only => {
                let cause = HostError::NotSupported("member has no getter".to_string());
                return Err(self.core.fail(ErrorKind::GetValue, subject, Some(cause)));
            }
            None => return Ok(Value::Null),
        };
        self.dispatch
            .get(&self.core.registry, getter, instance)
            .map_err(|err| self.core.wrap(ErrorKind::GetValue, subject, err))
    }

    pub(super) fn write_member(
        &self,
        instance: &Value,
        member: &MemberDescriptor,
        value: &Value,
    ) -> BindResult<()> {
        if member.is_directive() {
            return Ok(());
        }

        let subject = self.core.member_subject(member);
        let setter = match &member.setter {
            Some(setter) => setter,
            None => {
                let cause = HostError::NotSupported("member is read-only".to_string());
                return Err(self.core.fail(ErrorKind::NotSupported, subject, Some(cause)));
            }
        };
        self.dispatch
            .set(&self.core.registry, setter, instance, value)
            .map_err(|err| self.core.wrap(ErrorKind::SetValue, subject, err))
    }

    pub(super) fn query_should_serialize(
        &self,
        instance: &Value,
        member: &MemberDescriptor,
    ) -> BindResult<ShouldSerialize> {
        let (hook, declaring) = match (&member.should_serialize, member.declaring) {
            (Some(hook), Some(declaring)) => (hook, declaring),
            _ => return Ok(ShouldSerialize::Default),
        };
        let answer = CastPlan::Direct { declaring }
            .apply(&self.core.registry, instance)
            .and_then(|target| guarded(|| hook(target)));
        match answer {
            Ok(true) => Ok(ShouldSerialize::Yes),
            Ok(false) => Ok(ShouldSerialize::No),
            Err(err) => {
                let subject = self.core.member_subject(member);
                Err(self.core.wrap(ErrorKind::GetValue, subject, err))
            }
        }
    }
}
