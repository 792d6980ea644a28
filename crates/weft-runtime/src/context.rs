//! Invocation context: the mode tag and the line-info slot

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use weft_sdk::{LineInfo, SourceLocation};

/// Whether the binder builds an object graph or walks an existing one.
/// Failures are reported "while writing" or "while reading" accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindMode {
    /// Walking an existing object graph to serialize it
    Read,
    /// Building an object graph from markup
    #[default]
    Write,
}

impl fmt::Display for BindMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindMode::Read => write!(f, "reading"),
            BindMode::Write => write!(f, "writing"),
        }
    }
}

/// Per-binder state consulted when building errors.
///
/// The mode is fixed; the line-info provider may be swapped at any time by
/// the document walker.
pub struct InvocationContext {
    mode: BindMode,
    line_info: RwLock<Option<Arc<dyn LineInfo>>>,
}

impl InvocationContext {
    pub fn new(mode: BindMode) -> Self {
        Self {
            mode,
            line_info: RwLock::new(None),
        }
    }

    pub fn mode(&self) -> BindMode {
        self.mode
    }

    pub fn set_line_info(&self, provider: Option<Arc<dyn LineInfo>>) {
        *self.line_info.write() = provider;
    }

    /// Current position, if a provider is attached and has one.
    ///
    /// The provider is cloned out so no lock is held while it runs.
    pub fn location(&self) -> Option<SourceLocation> {
        let provider = self.line_info.read().clone()?;
        provider.location()
    }
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("mode", &self.mode)
            .field("line_info", &self.line_info.read().is_some())
            .finish()
    }
}
