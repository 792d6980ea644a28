//! Binder error taxonomy
//!
//! Every failure leaving the binder is a [`BindError`]. Host failures are
//! wrapped exactly once into [`WrappedError`] (kind, mode, subject, location,
//! cause); critical host failures pass through as [`BindError::Critical`].

use std::fmt;

use weft_sdk::{HostError, SourceLocation};

use crate::context::BindMode;

/// Result type for binder operations
pub type BindResult<T> = Result<T, BindError>;

/// What the binder was doing when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnresolvedType,
    MissingConstructor,
    Construction,
    MissingFactoryMethod,
    MethodInvocation,
    FactoryReturnedNull,
    GetValue,
    SetValue,
    NotSupported,
    AddCollection,
    AddDictionary,
    GetItems,
    GetItemsReturnedNull,
    TypeConverter,
    AttachedProperty,
    Initialization,
    SetConnectionId,
    SetUriBase,
    ProvideValue,
    CreateDelegate,
    DeferringLoaderInstanceNull,
    DeferredLoad,
    DeferredSave,
}

impl ErrorKind {
    fn message(self) -> &'static str {
        match self {
            ErrorKind::UnresolvedType => "Cannot resolve type",
            ErrorKind::MissingConstructor => "No matching constructor found on type",
            ErrorKind::Construction => "Failed to create an instance of type",
            ErrorKind::MissingFactoryMethod => "No matching factory method",
            ErrorKind::MethodInvocation => "Failed to invoke factory method",
            ErrorKind::FactoryReturnedNull => "Factory method returned null",
            ErrorKind::GetValue => "Failed to get value of member",
            ErrorKind::SetValue => "Failed to set value of member",
            ErrorKind::NotSupported => "Operation not supported on member",
            ErrorKind::AddCollection => "Failed to add item to collection of type",
            ErrorKind::AddDictionary => "Failed to add entry to dictionary of type",
            ErrorKind::GetItems => "Failed to enumerate items of type",
            ErrorKind::GetItemsReturnedNull => "Item enumeration returned null for type",
            ErrorKind::TypeConverter => "Type conversion failed",
            ErrorKind::AttachedProperty => "Failed to read attached properties of",
            ErrorKind::Initialization => "Initialization hook failed on type",
            ErrorKind::SetConnectionId => "Failed to connect element to",
            ErrorKind::SetUriBase => "Failed to set base URI on type",
            ErrorKind::ProvideValue => "Markup extension failed to provide a value",
            ErrorKind::CreateDelegate => "Cannot bind delegate",
            ErrorKind::DeferringLoaderInstanceNull => "Deferring loader instance is null",
            ErrorKind::DeferredLoad => "Deferred load failed",
            ErrorKind::DeferredSave => "Deferred save failed",
        }
    }
}

/// A host failure annotated by the binder
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub struct WrappedError {
    /// Operation that failed
    pub kind: ErrorKind,
    /// Whether the binder was reading or writing
    pub mode: BindMode,
    /// Type, member, method or converter involved
    pub subject: String,
    /// Document position, when a line-info provider was attached
    pub location: Option<SourceLocation>,
    /// Underlying host failure
    #[source]
    pub cause: Option<HostError>,
}

impl fmt::Display for WrappedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' while {}", self.kind.message(), self.subject, self.mode)?;
        if let Some(location) = &self.location {
            write!(f, " ({})", location)?;
        }
        Ok(())
    }
}

/// Error returned by every binder operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindError {
    /// Non-recoverable host condition, never wrapped
    #[error(transparent)]
    Critical(HostError),

    /// Annotated failure
    #[error(transparent)]
    Wrapped(Box<WrappedError>),
}

impl BindError {
    /// Kind of a wrapped failure
    pub fn kind(&self) -> Option<ErrorKind> {
        self.wrapped().map(|w| w.kind)
    }

    /// Mode tag of a wrapped failure
    pub fn mode(&self) -> Option<BindMode> {
        self.wrapped().map(|w| w.mode)
    }

    /// Source position of a wrapped failure
    pub fn location(&self) -> Option<SourceLocation> {
        self.wrapped().and_then(|w| w.location)
    }

    /// Inner host failure
    pub fn cause(&self) -> Option<&HostError> {
        match self {
            BindError::Critical(err) => Some(err),
            BindError::Wrapped(w) => w.cause.as_ref(),
        }
    }

    /// Whether this is a critical pass-through
    pub fn is_critical(&self) -> bool {
        matches!(self, BindError::Critical(_))
    }

    fn wrapped(&self) -> Option<&WrappedError> {
        match self {
            BindError::Wrapped(w) => Some(w),
            BindError::Critical(_) => None,
        }
    }
}
