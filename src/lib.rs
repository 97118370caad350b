//! lessonpack - lesson material versioning and packaging
//!
//! Records lessons as multi-lane timelines, versions them through
//! transactional create and merge-update, and exports a lesson as a zip of
//! its snapshot and referenced media.

pub mod archive;
pub mod blob_store;
pub mod cli;
pub mod config;
pub mod document_store;
pub mod error;
pub mod material;
pub mod revision;
pub mod transaction;

pub use archive::{ArchiveAssembler, ArchiveLocation, ArchivePlan, GraphicRef, PackedArchive};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, ErrorKind};
pub use material::{LessonId, LessonMaterial, LessonMaterialPatch, MaterialId};
pub use transaction::LessonMaterialService;
