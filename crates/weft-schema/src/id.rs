//! Identifiers handed out by the registry

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Index of a registered type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(u32);

impl TypeKey {
    pub(crate) fn new(index: u32) -> Self {
        TypeKey(index)
    }

    /// Position in the registry
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Code unit (assembly/crate-like) that owns types and members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u32);

impl ModuleId {
    pub(crate) fn new(index: u32) -> Self {
        ModuleId(index)
    }

    /// Position in the registry's module table
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a constructor, method or accessor.
///
/// Adapter caches are keyed by this id, so it must never be reused within a
/// process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    /// Allocate a fresh id
    pub fn new() -> Self {
        HandleId(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Numeric value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}
