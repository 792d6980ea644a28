//! Error types raised by host object code

/// Result type for host calls
pub type HostResult<T> = Result<T, HostError>;

/// Failure raised by host object code (constructors, accessors, converters, ...)
///
/// The binder never surfaces these directly: it wraps them into its own error
/// taxonomy, except for the critical variants which propagate unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    /// Stack exhausted while running host code
    #[error("Stack overflow")]
    StackOverflow,

    /// Allocation failure in host code
    #[error("Out of memory")]
    OutOfMemory,

    /// The running thread was torn down
    #[error("Thread aborted")]
    ThreadAbort,

    /// Generic "call failed" wrapper around the real failure
    #[error("Invocation failed: {0}")]
    Invocation(Box<HostError>),

    /// Operation not supported (read-only member, write-only member, ...)
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Value could not be cast to the expected type
    #[error("Type mismatch: expected {expected}, got {got}")]
    InvalidCast {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Invalid argument
    #[error("Argument error: {0}")]
    Argument(String),

    /// More than one overload applies equally well
    #[error("Ambiguous match: {0}")]
    AmbiguousMatch(String),

    /// Member exists but the caller may not touch it
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Host code panicked
    #[error("Function panicked: {0}")]
    Panic(String),

    /// Any other host failure
    #[error("{0}")]
    Failed(String),
}

impl HostError {
    /// Wrap a failure the way a generic invocation mechanism would.
    pub fn invocation(inner: HostError) -> Self {
        HostError::Invocation(Box::new(inner))
    }

    /// Critical failures are never caught, wrapped or retried.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            HostError::StackOverflow | HostError::OutOfMemory | HostError::ThreadAbort
        )
    }

    /// Strip exactly one invocation-wrapper level.
    pub fn unwrap_invocation(self) -> HostError {
        match self {
            HostError::Invocation(inner) => *inner,
            other => other,
        }
    }

    /// Build an error from a caught panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        HostError::Panic(msg)
    }
}

impl From<String> for HostError {
    fn from(s: String) -> Self {
        HostError::Failed(s)
    }
}

impl From<&str> for HostError {
    fn from(s: &str) -> Self {
        HostError::Failed(s.to_string())
    }
}
