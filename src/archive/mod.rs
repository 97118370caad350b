//! # Lesson Archive Assembly
//!
//! Bundles a lesson snapshot and the media it references into one zip and
//! publishes it to the blob store.
//!
//! Layout of a published archive:
//!
//! ```text
//! lesson/<lessonID>.zip
//! ├── graphics/<assetID>.<ext>        one per graphic ref, in ref order
//! ├── lesson.json                     rendered snapshot
//! └── voices/<lessonID>/<fileID>.ogg  only when voices are enabled
//! ```
//!
//! Export is all-or-nothing. Fetches run concurrently up to a bound, but
//! entries are written by a single writer in plan order. Any fetch failure,
//! timeout or cancellation drops the in-progress archive and nothing is
//! published. A publish failure hands the finished archive back so the
//! upload can be retried without fetching again.

mod assembler;
mod errors;
mod plan;
mod writer;

pub use assembler::{ArchiveAssembler, ArchiveLocation, AssemblerSettings};
pub use errors::{ArchiveError, ArchiveResult};
pub use plan::{ArchivePlan, AssetRef, GraphicRef};
pub use writer::{ArchiveWriter, PackedArchive};

use crate::material::LessonId;

/// Content type of published archives
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Archive entry holding the rendered snapshot
pub const SNAPSHOT_ENTRY: &str = "lesson.json";

/// Blob store path an archive is published under
pub fn archive_path(lesson_id: LessonId) -> String {
    format!("lesson/{}.zip", lesson_id)
}
