//! Archive errors

use thiserror::Error;

use super::plan::AssetRef;
use super::writer::PackedArchive;
use crate::blob_store::BlobError;
use crate::material::LessonId;

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A referenced blob could not be fetched (including timeouts).
    /// Nothing was published.
    #[error("failed to fetch {asset}: {source}")]
    BlobFetchFailed {
        asset: AssetRef,
        #[source]
        source: BlobError,
    },

    /// The archive was fully assembled but the upload failed. The archive
    /// is returned so the publish can be retried on its own.
    #[error("failed to publish {path}: {source}")]
    UploadFailed {
        path: String,
        #[source]
        source: BlobError,
        archive: Box<PackedArchive>,
    },

    #[error("graphic {0} has no known file type")]
    MissingGraphicType(i64),

    /// The extension would not yield a `graphics/<id>.<ext>` entry
    #[error("graphic {asset_id} has an invalid file type '{extension}'")]
    InvalidGraphicType { asset_id: i64, extension: String },

    #[error("duplicate archive entry: {0}")]
    DuplicateEntry(String),

    #[error("export of lesson {0} was cancelled")]
    Cancelled(LessonId),

    #[error("archive writer error: {0}")]
    Writer(String),
}

impl ArchiveError {
    /// Take back the assembled archive of a failed publish
    pub fn into_unpublished(self) -> Option<PackedArchive> {
        match self {
            ArchiveError::UploadFailed { archive, .. } => Some(*archive),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(e: zip::result::ZipError) -> Self {
        ArchiveError::Writer(e.to_string())
    }
}
