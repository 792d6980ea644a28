//! Converter instance cache
//!
//! Converter and deferring-loader instances are created lazily by their
//! descriptor's factory and cached by converter type. A factory that yields
//! no instance is cached as such. The cache belongs to the schema context and
//! may be shared by several binders through an `Arc`; entries live until
//! [`ConverterCache::clear`] is called at context teardown.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};
use weft_schema::{guarded, CustomConverter};
use weft_sdk::{DeferringLoader, HostResult, TypeConverter};

/// Shared cache of converter instances keyed by converter type
pub struct ConverterCache {
    converters: DashMap<TypeId, Option<Arc<dyn TypeConverter>>>,
    loaders: DashMap<TypeId, Option<Arc<dyn DeferringLoader>>>,
}

fn get_or_create<C: ?Sized>(
    map: &DashMap<TypeId, Option<Arc<C>>>,
    descriptor: &CustomConverter<C>,
) -> HostResult<Option<Arc<C>>> {
    let key = descriptor.converter_type();
    if let Some(entry) = map.get(&key) {
        trace!(converter = descriptor.name(), "converter cache hit");
        return Ok(entry.value().clone());
    }
    // Factory runs unlocked; a racing insert wins and ours is dropped
    let created = guarded(|| descriptor.create())?;
    debug!(
        converter = descriptor.name(),
        present = created.is_some(),
        "converter instance created"
    );
    Ok(map.entry(key).or_insert(created).value().clone())
}

impl ConverterCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            converters: DashMap::new(),
            loaders: DashMap::new(),
        }
    }

    /// Type converter instance for `descriptor`, creating it on first use
    pub fn converter(
        &self,
        descriptor: &CustomConverter<dyn TypeConverter>,
    ) -> HostResult<Option<Arc<dyn TypeConverter>>> {
        get_or_create(&self.converters, descriptor)
    }

    /// Deferring loader instance for `descriptor`, creating it on first use
    pub fn loader(
        &self,
        descriptor: &CustomConverter<dyn DeferringLoader>,
    ) -> HostResult<Option<Arc<dyn DeferringLoader>>> {
        get_or_create(&self.loaders, descriptor)
    }

    /// Number of cached entries (including cached "no instance" results)
    pub fn count(&self) -> usize {
        self.converters.len() + self.loaders.len()
    }

    /// Drop every cached instance
    pub fn clear(&self) {
        self.converters.clear();
        self.loaders.clear();
    }
}

impl Default for ConverterCache {
    fn default() -> Self {
        Self::new()
    }
}
