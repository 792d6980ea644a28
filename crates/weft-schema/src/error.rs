//! Registration errors

/// Errors raised while building the registration table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Name or native type registered twice
    #[error("Type '{0}' is already registered")]
    DuplicateType(String),

    /// Base type was not registered first
    #[error("Base type '{base}' of '{type_name}' is not registered")]
    UnknownBase {
        /// Type being registered
        type_name: String,
        /// Native name of the missing base
        base: &'static str,
    },
}
