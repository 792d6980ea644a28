//! Dictionary iterator normalization
//!
//! A dictionary hands out its items in one of three shapes:
//! - a dedicated key/value enumerator, used as is
//! - a typed pair iterator over the dictionary's declared key/value types,
//!   adapted by the routine monomorphized at registration
//! - a generic iterator of boxed [`KeyValuePair`]s, downcast per element
//!
//! The opaque iterator case has to be probed. The probe result is cached per
//! dictionary type so later calls try the right shape first.

use std::any::Any;

use dashmap::DashMap;
use tracing::trace;
use weft_schema::{DictionaryCapability, PairIter, TypeKey};
use weft_sdk::{
    DictionaryEnumerator, DictionaryItems, HostError, HostResult, ItemIter, KeyValuePair,
};

/// Which opaque shape a dictionary type produced last time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterShape {
    Typed,
    Generic,
}

/// Per-type probe results
#[derive(Default)]
pub struct ShapeCache {
    shapes: DashMap<TypeKey, IterShape>,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shape(&self, key: TypeKey) -> Option<IterShape> {
        self.shapes.get(&key).map(|entry| *entry.value())
    }

    fn record(&self, key: TypeKey, shape: IterShape) {
        if self.shape(key) != Some(shape) {
            trace!(dictionary = %key, ?shape, "dictionary iterator shape recorded");
            self.shapes.insert(key, shape);
        }
    }
}

fn entries(mut enumerator: Box<dyn DictionaryEnumerator>) -> PairIter {
    Box::new(std::iter::from_fn(move || enumerator.next_entry().transpose()))
}

fn generic_pairs(iter: Box<dyn Any + Send>) -> Result<PairIter, Box<dyn Any + Send>> {
    let items = iter.downcast::<ItemIter>()?;
    let pairs = items.map(|item| {
        let item = item?;
        item.downcast_ref::<KeyValuePair>()
            .map(|pair| (pair.key.clone(), pair.value.clone()))
            .ok_or_else(|| HostError::InvalidCast {
                expected: "KeyValuePair".to_string(),
                got: item.type_name().to_string(),
            })
    });
    Ok(Box::new(pairs))
}

/// Turn whatever `dictionary` handed out into `(key, value)` pairs
pub fn normalize(
    items: DictionaryItems,
    dictionary: &DictionaryCapability,
    key: TypeKey,
    cache: &ShapeCache,
) -> HostResult<PairIter> {
    let opaque = match items {
        DictionaryItems::Entries(enumerator) => return Ok(entries(enumerator)),
        DictionaryItems::Iter(opaque) => opaque,
    };

    let typed_first = cache.shape(key) != Some(IterShape::Generic);
    let opaque = if typed_first {
        match (dictionary.normalize_typed)(opaque) {
            Ok(pairs) => {
                cache.record(key, IterShape::Typed);
                return Ok(pairs);
            }
            Err(other) => other,
        }
    } else {
        opaque
    };

    let opaque = match generic_pairs(opaque) {
        Ok(pairs) => {
            cache.record(key, IterShape::Generic);
            return Ok(pairs);
        }
        Err(other) => other,
    };

    if !typed_first {
        if let Ok(pairs) = (dictionary.normalize_typed)(opaque) {
            cache.record(key, IterShape::Typed);
            return Ok(pairs);
        }
    }

    Err(HostError::NotSupported(format!(
        "dictionary iterator is neither ({}, {}) pairs nor key/value pair objects",
        dictionary.key_type, dictionary.value_type
    )))
}
