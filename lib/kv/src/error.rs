//! Error types for key-value operations.

use std::fmt;

/// Errors from key-value store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvError {
    /// The store could not be reached or is not initialized.
    Unavailable { reason: String },
    /// The store rejected the operation.
    OperationFailed {
        operation: &'static str,
        key: String,
        reason: String,
    },
}

impl fmt::Display for KvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => {
                write!(f, "key-value store unavailable: {reason}")
            }
            Self::OperationFailed {
                operation,
                key,
                reason,
            } => {
                write!(f, "key-value {operation} of '{key}' failed: {reason}")
            }
        }
    }
}

impl std::error::Error for KvError {}
