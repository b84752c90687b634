use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// A field assignment violated its constraint
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Unknown account field: {0}")]
    UnknownField(String),

    /// A persistence operation was called without the state it needs
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AccountError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
