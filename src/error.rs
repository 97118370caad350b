//! Engine Error Types
//!
//! Unifies material, store and archive failures into the categories callers
//! act on. Kinds survive conversion; mapping them onto transport status codes
//! is left to the caller.

use thiserror::Error;

use crate::archive::{ArchiveError, PackedArchive};
use crate::document_store::StoreError;
use crate::material::MaterialError;

/// Engine result type
pub type EngineResult<T> = Result<T, EngineError>;

/// What went wrong, independent of which component noticed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    TransactionConflict,
    BlobFetchFailed,
    UploadFailed,
    StoreUnavailable,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput => "LESSON_INVALID_INPUT",
            Self::NotFound => "LESSON_NOT_FOUND",
            Self::TransactionConflict => "LESSON_TRANSACTION_CONFLICT",
            Self::BlobFetchFailed => "LESSON_BLOB_FETCH_FAILED",
            Self::UploadFailed => "LESSON_UPLOAD_FAILED",
            Self::StoreUnavailable => "LESSON_STORE_UNAVAILABLE",
            Self::Cancelled => "LESSON_CANCELLED",
            Self::Internal => "LESSON_INTERNAL",
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected before any transaction opened
    #[error("invalid input: {0}")]
    InvalidInput(#[from] MaterialError),

    #[error("not found: {0}")]
    NotFound(String),

    /// A concurrent write won; re-run the whole operation
    #[error("transaction conflict: {0}")]
    TransactionConflict(String),

    #[error("document store unavailable: {0}")]
    StoreUnavailable(String),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::TransactionConflict(_) => ErrorKind::TransactionConflict,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::Archive(e) => match e {
                ArchiveError::BlobFetchFailed { .. } => ErrorKind::BlobFetchFailed,
                ArchiveError::UploadFailed { .. } => ErrorKind::UploadFailed,
                ArchiveError::MissingGraphicType(_)
                | ArchiveError::InvalidGraphicType { .. }
                | ArchiveError::DuplicateEntry(_) => ErrorKind::InvalidInput,
                ArchiveError::Cancelled(_) => ErrorKind::Cancelled,
                ArchiveError::Writer(_) => ErrorKind::Internal,
            },
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Whether repeating the operation unchanged may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TransactionConflict
                | ErrorKind::StoreUnavailable
                | ErrorKind::BlobFetchFailed
                | ErrorKind::UploadFailed
        )
    }

    /// The assembled archive of a failed publish, if this is one
    pub fn into_unpublished(self) -> Option<PackedArchive> {
        match self {
            Self::Archive(e) => e.into_unpublished(),
            _ => None,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(key) => Self::NotFound(key.to_string()),
            StoreError::Conflict(msg) => Self::TransactionConflict(msg),
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}
