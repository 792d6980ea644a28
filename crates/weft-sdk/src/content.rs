//! Content sources and iteration shapes
//!
//! Deferred subtrees are handed around as [`ContentSource`]s. Collections and
//! dictionaries hand out iterators in one of the shapes defined here; the
//! binder normalizes them.

use std::any::Any;

use crate::error::HostResult;
use crate::value::Value;

// ============================================================================
// Deferred content
// ============================================================================

/// Forward reader over recorded document nodes
pub trait ContentSource: Send {
    /// Next node, or `None` at the end
    fn read(&mut self) -> HostResult<Option<Value>>;

    /// Random-access view, for sources that support it
    fn as_indexed(&mut self) -> Option<&mut dyn IndexedContent> {
        None
    }
}

/// Random-access positioning over a content source
pub trait IndexedContent {
    /// Total number of nodes
    fn count(&self) -> usize;

    /// Current position; `None` means "unset" (before the first read)
    fn current_index(&self) -> Option<usize>;

    /// Move the cursor; `None` resets it to "unset"
    fn set_current_index(&mut self, index: Option<usize>);
}

/// In-memory indexed content source
#[derive(Debug, Clone, Default)]
pub struct NodeList {
    nodes: Vec<Value>,
    index: Option<usize>,
}

impl NodeList {
    /// Create a source over `nodes`, positioned at "unset"
    pub fn new(nodes: Vec<Value>) -> Self {
        Self { nodes, index: None }
    }

    /// Recorded nodes
    pub fn nodes(&self) -> &[Value] {
        &self.nodes
    }
}

impl ContentSource for NodeList {
    fn read(&mut self) -> HostResult<Option<Value>> {
        let next = self.index.map_or(0, |i| i + 1);
        if next >= self.nodes.len() {
            self.index = Some(self.nodes.len());
            return Ok(None);
        }
        self.index = Some(next);
        Ok(Some(self.nodes[next].clone()))
    }

    fn as_indexed(&mut self) -> Option<&mut dyn IndexedContent> {
        Some(self)
    }
}

impl IndexedContent for NodeList {
    fn count(&self) -> usize {
        self.nodes.len()
    }

    fn current_index(&self) -> Option<usize> {
        self.index
    }

    fn set_current_index(&mut self, index: Option<usize>) {
        self.index = index;
    }
}

// ============================================================================
// Iteration shapes
// ============================================================================

/// Generic item iterator returned by collections
pub type ItemIter = Box<dyn Iterator<Item = HostResult<Value>> + Send>;

/// Strongly typed key/value iterator for a dictionary declared over `K`/`V`
pub type TypedPairIter<K, V> = Box<dyn Iterator<Item = HostResult<(K, V)>> + Send>;

/// Dedicated key/value enumerator
pub trait DictionaryEnumerator: Send {
    /// Next entry, or `None` at the end
    fn next_entry(&mut self) -> HostResult<Option<(Value, Value)>>;
}

/// What a dictionary hands out when asked for its items
pub enum DictionaryItems {
    /// Dedicated key/value enumerator, used as is
    Entries(Box<dyn DictionaryEnumerator>),
    /// Opaque iterator: either a [`TypedPairIter`] for the dictionary's
    /// declared key/value types, or an [`ItemIter`] yielding boxed
    /// [`KeyValuePair`](crate::KeyValuePair)s
    Iter(Box<dyn Any + Send>),
}

impl DictionaryItems {
    /// Erase a typed pair iterator
    pub fn typed<K: Send + 'static, V: Send + 'static>(iter: TypedPairIter<K, V>) -> Self {
        DictionaryItems::Iter(Box::new(iter))
    }

    /// Erase a generic pair iterator
    pub fn generic(iter: ItemIter) -> Self {
        DictionaryItems::Iter(Box::new(iter))
    }
}

impl std::fmt::Debug for DictionaryItems {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DictionaryItems::Entries(_) => write!(f, "DictionaryItems::Entries"),
            DictionaryItems::Iter(_) => write!(f, "DictionaryItems::Iter"),
        }
    }
}
