//! Converters and deferring loaders

use std::sync::Arc;

use tracing::trace;
use weft_schema::{guarded, DeferringLoaderDescriptor, MemberDescriptor, TypeConverterDescriptor};
use weft_sdk::{
    ContentSource, DeferringLoader, HostError, ParamType, ServiceContext, TypeConverter, Value,
};

use super::{Binder, Dispatch};
use crate::error::{BindResult, ErrorKind};

impl<D: Dispatch> Binder<D> {
    pub(super) fn cached_converter(
        &self,
        converter: &TypeConverterDescriptor,
    ) -> BindResult<Option<Arc<dyn TypeConverter>>> {
        match converter.custom() {
            Some(custom) => self
                .core
                .converters
                .converter(custom)
                .map_err(|err| self.core.wrap(ErrorKind::TypeConverter, converter.name(), err)),
            None => Ok(None),
        }
    }

    pub(super) fn cached_loader(
        &self,
        loader: &DeferringLoaderDescriptor,
    ) -> BindResult<Option<Arc<dyn DeferringLoader>>> {
        match loader.custom() {
            Some(custom) => self
                .core
                .converters
                .loader(custom)
                .map_err(|err| self.core.wrap(ErrorKind::TypeConverter, loader.name(), err)),
            None => Ok(None),
        }
    }

    fn conversion_subject(
        &self,
        converter: &TypeConverterDescriptor,
        value: &Value,
        member: Option<&MemberDescriptor>,
    ) -> String {
        match member {
            Some(member) => format!(
                "{} ({}) via {}",
                self.core.member_subject(member),
                value.type_name(),
                converter.name()
            ),
            None => format!("{} via {}", value.type_name(), converter.name()),
        }
    }

    pub(super) fn convert_from(
        &self,
        ctx: &ServiceContext,
        converter: &TypeConverterDescriptor,
        value: &Value,
        member: Option<&MemberDescriptor>,
    ) -> BindResult<Value> {
        let instance = match self.cached_converter(converter)? {
            Some(instance) => instance,
            None => return Ok(value.clone()),
        };

        let bypass = self.core.ignore_can_convert_for_strings && value.is_str();
        let converted = guarded(|| {
            if !bypass && !instance.can_convert_from(ctx, value.kind()) {
                trace!(
                    converter = converter.name(),
                    kind = ?value.kind(),
                    "converter declined value"
                );
                return Ok(None);
            }
            instance.convert_from(ctx, value).map(Some)
        });
        match converted {
            Ok(Some(converted)) => Ok(converted),
            Ok(None) => Ok(value.clone()),
            Err(err) => Err(self.core.wrap(
                ErrorKind::TypeConverter,
                self.conversion_subject(converter, value, member),
                err,
            )),
        }
    }

    /// Converter instance that must exist for an explicit conversion
    fn required_converter(
        &self,
        converter: &TypeConverterDescriptor,
        value: &Value,
    ) -> BindResult<Arc<dyn TypeConverter>> {
        match self.cached_converter(converter)? {
            Some(instance) => Ok(instance),
            None => Err(self.core.fail(
                ErrorKind::TypeConverter,
                self.conversion_subject(converter, value, None),
                Some(HostError::NotSupported("converter has no instance".to_string())),
            )),
        }
    }

    pub(super) fn convert_to(
        &self,
        ctx: &ServiceContext,
        converter: &TypeConverterDescriptor,
        value: &Value,
        target: &ParamType,
    ) -> BindResult<Value> {
        let instance = self.required_converter(converter, value)?;
        guarded(|| instance.convert_to(ctx, value, target)).map_err(|err| {
            let subject = self.conversion_subject(converter, value, None);
            self.core.wrap(ErrorKind::TypeConverter, subject, err)
        })
    }

    pub(super) fn render(
        &self,
        ctx: &ServiceContext,
        converter: &TypeConverterDescriptor,
        value: &Value,
    ) -> BindResult<String> {
        let instance = self.required_converter(converter, value)?;
        guarded(|| instance.convert_to_string(ctx, value)).map_err(|err| {
            let subject = self.conversion_subject(converter, value, None);
            self.core.wrap(ErrorKind::TypeConverter, subject, err)
        })
    }

    fn required_loader(
        &self,
        loader: &DeferringLoaderDescriptor,
    ) -> BindResult<Arc<dyn DeferringLoader>> {
        match self.cached_loader(loader)? {
            Some(instance) => Ok(instance),
            None => {
                let kind = ErrorKind::DeferringLoaderInstanceNull;
                Err(self.core.fail(kind, loader.name(), None))
            }
        }
    }

    pub(super) fn load_deferred(
        &self,
        ctx: &ServiceContext,
        loader: &DeferringLoaderDescriptor,
        content: &mut dyn ContentSource,
    ) -> BindResult<Value> {
        let result = self.required_loader(loader).and_then(|instance| {
            guarded(|| instance.load(&mut *content, ctx))
                .map_err(|err| self.core.wrap(ErrorKind::DeferredLoad, loader.name(), err))
        });
        if result.is_err() {
            // Let the caller replay the content from the start
            if let Some(indexed) = content.as_indexed() {
                if indexed.current_index().is_some() {
                    indexed.set_current_index(None);
                }
            }
        }
        result
    }

    pub(super) fn save_deferred(
        &self,
        ctx: &ServiceContext,
        loader: &DeferringLoaderDescriptor,
        value: &Value,
    ) -> BindResult<Box<dyn ContentSource>> {
        let instance = self.required_loader(loader)?;
        guarded(|| instance.save(value, ctx))
            .map_err(|err| self.core.wrap(ErrorKind::DeferredSave, loader.name(), err))
    }
}
