//! # Document Store Errors

use thiserror::Error;

use super::key::Key;

/// Result type for document store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(Key),

    /// A concurrent transaction changed something this one read.
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    #[error("Incomplete key: {0}")]
    IncompleteKey(Key),

    /// The store could not be reached; safe to retry.
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
