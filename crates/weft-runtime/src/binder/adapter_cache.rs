//! Adapter cache for the compiling binder
//!
//! Stores synthesized adapters indexed by handle id. Lookups never hold a
//! shard lock while an adapter is synthesized or run; two callers racing on
//! a cold entry may both synthesize, and the first insert wins.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use tracing::trace;
use weft_schema::HandleId;

/// Thread-safe map from handle id to adapter
pub struct AdapterCache<A> {
    /// Handle id → adapter
    entries: DashMap<HandleId, A>,
    /// Adapters built, including ones that lost an insert race
    synthesized: AtomicUsize,
}

impl<A: Clone> AdapterCache<A> {
    pub fn new() -> Self {
        AdapterCache {
            entries: DashMap::new(),
            synthesized: AtomicUsize::new(0),
        }
    }

    /// Look up the adapter for `id`, synthesizing it on a miss
    pub fn get_or_synthesize(&self, id: HandleId, synthesize: impl FnOnce() -> A) -> A {
        if let Some(entry) = self.entries.get(&id) {
            trace!(handle = id.as_u64(), "adapter cache hit");
            return entry.value().clone();
        }
        let adapter = synthesize();
        self.synthesized.fetch_add(1, Ordering::Relaxed);
        self.entries.entry(id).or_insert(adapter).value().clone()
    }

    /// Check if an adapter exists for `id`
    pub fn contains(&self, id: HandleId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of cached adapters
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of synthesis runs so far
    pub fn synthesized(&self) -> usize {
        self.synthesized.load(Ordering::Relaxed)
    }
}

impl<A: Clone> Default for AdapterCache<A> {
    fn default() -> Self {
        Self::new()
    }
}
