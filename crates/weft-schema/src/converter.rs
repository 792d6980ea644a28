//! Converter descriptors
//!
//! A member (or a whole value type) may name a converter. The descriptor only
//! records *which* converter and how to build it; instances are created lazily
//! and cached by the binder's converter cache.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use weft_sdk::{DeferringLoader, HostResult, ParamType, TypeConverter};

/// Builds a converter instance. `Ok(None)` means "no instance available".
pub type ConverterFactory<C> = dyn Fn() -> HostResult<Option<Arc<C>>> + Send + Sync;

/// How values for a member are converted
pub enum ValueConverter<C: ?Sized> {
    /// Target representation is text: pass through
    String,
    /// Target representation is an untyped object: pass through
    Object,
    /// User converter
    Custom(CustomConverter<C>),
}

/// A user converter: identity plus lazy factory
pub struct CustomConverter<C: ?Sized> {
    converter_type: TypeId,
    name: &'static str,
    value_type: ParamType,
    factory: Arc<ConverterFactory<C>>,
}

/// Descriptor for a [`TypeConverter`]
pub type TypeConverterDescriptor = ValueConverter<dyn TypeConverter>;

/// Descriptor for a [`DeferringLoader`]
pub type DeferringLoaderDescriptor = ValueConverter<dyn DeferringLoader>;

impl<C: ?Sized + 'static> ValueConverter<C> {
    /// Converter identified by `K`, built by `factory`
    pub fn with_factory<K: 'static>(
        value_type: ParamType,
        factory: impl Fn() -> HostResult<Option<Arc<C>>> + Send + Sync + 'static,
    ) -> Self {
        ValueConverter::Custom(CustomConverter {
            converter_type: TypeId::of::<K>(),
            name: std::any::type_name::<K>(),
            value_type,
            factory: Arc::new(factory),
        })
    }

    /// Whether this is one of the pass-through markers
    pub fn is_builtin(&self) -> bool {
        !matches!(self, ValueConverter::Custom(_))
    }

    /// The user converter, if any
    pub fn custom(&self) -> Option<&CustomConverter<C>> {
        match self {
            ValueConverter::Custom(custom) => Some(custom),
            _ => None,
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            ValueConverter::String => "String",
            ValueConverter::Object => "Object",
            ValueConverter::Custom(custom) => custom.name,
        }
    }
}

impl ValueConverter<dyn TypeConverter> {
    /// Converter type `K`, built with `K::default()`
    pub fn of<K: TypeConverter + Default + 'static>(value_type: ParamType) -> Self {
        Self::with_factory::<K>(value_type, || {
            let converter: Arc<dyn TypeConverter> = Arc::new(K::default());
            Ok(Some(converter))
        })
    }
}

impl ValueConverter<dyn DeferringLoader> {
    /// Loader type `K`, built with `K::default()`
    pub fn of<K: DeferringLoader + Default + 'static>(value_type: ParamType) -> Self {
        Self::with_factory::<K>(value_type, || {
            let loader: Arc<dyn DeferringLoader> = Arc::new(K::default());
            Ok(Some(loader))
        })
    }
}

impl<C: ?Sized> CustomConverter<C> {
    /// Cache key
    pub fn converter_type(&self) -> TypeId {
        self.converter_type
    }

    /// Converter type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type of values the converter produces
    pub fn value_type(&self) -> &ParamType {
        &self.value_type
    }

    /// Run the factory
    pub fn create(&self) -> HostResult<Option<Arc<C>>> {
        (self.factory)()
    }
}

impl<C: ?Sized> Clone for CustomConverter<C> {
    fn clone(&self) -> Self {
        Self {
            converter_type: self.converter_type,
            name: self.name,
            value_type: self.value_type.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<C: ?Sized> Clone for ValueConverter<C> {
    fn clone(&self) -> Self {
        match self {
            ValueConverter::String => ValueConverter::String,
            ValueConverter::Object => ValueConverter::Object,
            ValueConverter::Custom(custom) => ValueConverter::Custom(custom.clone()),
        }
    }
}

impl<C: ?Sized> fmt::Debug for ValueConverter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueConverter::String => write!(f, "ValueConverter::String"),
            ValueConverter::Object => write!(f, "ValueConverter::Object"),
            ValueConverter::Custom(custom) => f
                .debug_struct("ValueConverter::Custom")
                .field("name", &custom.name)
                .field("value_type", &custom.value_type)
                .finish(),
        }
    }
}
