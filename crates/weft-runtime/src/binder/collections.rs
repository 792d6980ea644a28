//! Collection and dictionary access

use weft_schema::{guarded, TypeKey};
use weft_sdk::{HostError, HostResult, Value};

use super::{Binder, Dispatch};
use crate::access::CastPlan;
use crate::dictionary::normalize;
use crate::error::{BindResult, ErrorKind};
use crate::overload;

const ADD: &str = "Add";

impl<D: Dispatch> Binder<D> {
    pub(super) fn add_item(
        &self,
        collection: &Value,
        ty: TypeKey,
        value: &Value,
    ) -> BindResult<()> {
        let registry = &self.core.registry;
        let subject = self.core.type_name(ty);
        let candidates: Vec<_> = registry
            .collection_adders(ty)
            .into_iter()
            .filter(|m| self.dispatch.admits(m))
            .collect();
        if candidates.is_empty() {
            let cause = HostError::NotSupported("type has no accessible Add method".to_string());
            return Err(self.core.fail(ErrorKind::AddCollection, subject, Some(cause)));
        }

        let args = [value.clone()];
        let binding = match overload::select(&**registry, &candidates, &args) {
            Ok(binding) => binding,
            Err(failure) => {
                let cause = failure.into_host_error(ADD);
                return Err(self.core.fail(ErrorKind::AddCollection, subject, Some(cause)));
            }
        };
        self.dispatch
            .invoke(registry, &binding.method, Some(collection), &binding.args)
            .map(|_| ())
            .map_err(|err| self.core.wrap(ErrorKind::AddCollection, subject, err))
    }

    pub(super) fn add_entry(
        &self,
        dictionary: &Value,
        ty: TypeKey,
        value: &Value,
        key: &Value,
    ) -> BindResult<()> {
        let registry = &self.core.registry;
        let subject = self.core.type_name(ty);
        let dict = match registry.dictionary(ty) {
            Some((_, dict)) => dict,
            None => {
                let cause = HostError::NotSupported("type is not a dictionary".to_string());
                return Err(self.core.fail(ErrorKind::AddDictionary, subject, Some(cause)));
            }
        };
        self.dispatch
            .invoke(registry, &dict.add, Some(dictionary), &[key.clone(), value.clone()])
            .map(|_| ())
            .map_err(|err| self.core.wrap(ErrorKind::AddDictionary, subject, err))
    }

    pub(super) fn drain_items(&self, collection: &Value, ty: TypeKey) -> BindResult<Vec<Value>> {
        let registry = &self.core.registry;
        let subject = self.core.type_name(ty);
        let found = registry
            .ancestors(ty)
            .find_map(|d| d.collection.items.clone().map(|items| (d.key, items)));
        let (declaring, items) = match found {
            Some(found) => found,
            None => {
                let cause = HostError::NotSupported("type cannot enumerate its items".to_string());
                return Err(self.core.fail(ErrorKind::GetItems, subject, Some(cause)));
            }
        };

        let iter = CastPlan::Direct { declaring }
            .apply(registry, collection)
            .and_then(|target| items(target))
            .map_err(|err| self.core.wrap(ErrorKind::GetItems, subject.as_str(), err))?;
        let iter = match iter {
            Some(iter) => iter,
            None => return Err(self.core.fail(ErrorKind::GetItemsReturnedNull, subject, None)),
        };
        guarded(|| iter.collect::<HostResult<Vec<Value>>>())
            .map_err(|err| self.core.wrap(ErrorKind::GetItems, subject, err))
    }

    pub(super) fn drain_entries(
        &self,
        dictionary: &Value,
        ty: TypeKey,
    ) -> BindResult<Vec<(Value, Value)>> {
        let registry = &self.core.registry;
        let subject = self.core.type_name(ty);
        let (desc, dict) = match registry.dictionary(ty) {
            Some(found) => found,
            None => {
                let cause = HostError::NotSupported("type is not a dictionary".to_string());
                return Err(self.core.fail(ErrorKind::GetItems, subject, Some(cause)));
            }
        };
        let items = match &dict.items {
            Some(items) => items,
            None => {
                let cause =
                    HostError::NotSupported("dictionary cannot enumerate its entries".to_string());
                return Err(self.core.fail(ErrorKind::GetItems, subject, Some(cause)));
            }
        };

        let raw = CastPlan::Direct { declaring: desc.key }
            .apply(registry, dictionary)
            .and_then(|target| items(target))
            .map_err(|err| self.core.wrap(ErrorKind::GetItems, subject.as_str(), err))?;
        let raw = match raw {
            Some(raw) => raw,
            None => return Err(self.core.fail(ErrorKind::GetItemsReturnedNull, subject, None)),
        };

        // Probe results are per concrete dictionary type
        let shape_key = registry.descriptor_of(dictionary).map_or(desc.key, |d| d.key);
        guarded(|| {
            normalize(raw, dict, shape_key, &self.core.shapes)?.collect::<HostResult<Vec<_>>>()
        })
        .map_err(|err| self.core.wrap(ErrorKind::GetItems, subject, err))
    }
}
