//! Ambient context handed to host code and used to annotate failures

use std::fmt;

use crate::value::Value;

/// Source position inside the markup document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// 1-based line number
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

impl SourceLocation {
    /// Create a location
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, position {}", self.line, self.column)
    }
}

/// Supplies the position the document walker is currently at.
///
/// The binder only queries it while building an error, so implementations
/// may track a moving cursor.
pub trait LineInfo: Send + Sync {
    /// Whether position data is available right now
    fn has_line_info(&self) -> bool {
        true
    }

    /// Current line
    fn line_number(&self) -> u32;

    /// Current column
    fn line_position(&self) -> u32;

    /// Snapshot the current position, if any
    fn location(&self) -> Option<SourceLocation> {
        if self.has_line_info() {
            Some(SourceLocation::new(self.line_number(), self.line_position()))
        } else {
            None
        }
    }
}

/// Fixed position, handy for tests and single-node documents
impl LineInfo for SourceLocation {
    fn line_number(&self) -> u32 {
        self.line
    }

    fn line_position(&self) -> u32 {
        self.column
    }
}

/// Services available to converters, markup extensions and deferring loaders
#[derive(Debug, Clone, Default)]
pub struct ServiceContext {
    /// Object whose member is being assigned
    pub target_object: Option<Value>,
    /// Name of the member being assigned
    pub target_member: Option<String>,
    /// Base URI of the document
    pub base_uri: Option<String>,
}

impl ServiceContext {
    /// Empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Context targeting `member` on `object`
    pub fn for_target(object: Value, member: impl Into<String>) -> Self {
        Self {
            target_object: Some(object),
            target_member: Some(member.into()),
            base_uri: None,
        }
    }
}
