//! # Lesson Material
//!
//! Timeline document model for recorded lessons.
//!
//! A `LessonMaterial` is one revision of a lesson's playable content. It
//! carries six independent lanes of timed entries:
//!
//! ```text
//! avatars     motion segments
//! graphics    show / hide / transition of a graphic asset
//! drawings    draw / clear / show / hide, with nested stroke units
//! embeddings  show / hide of externally hosted content
//! musics      start / stop of background music
//! speeches    narration segments (recorded voice or synthesis)
//! ```
//!
//! This module performs no I/O. Lane order is whatever the caller supplied;
//! nothing here sorts, filters, or drops entries.

mod document;
mod errors;
mod ids;
mod lanes;
mod patch;
mod validator;

pub use document::{LaneKind, LessonMaterial, TimedEntry};
pub use errors::{MaterialError, MaterialResult};
pub use ids::{LessonId, MaterialId};
pub use lanes::{
    Caption, DrawingAction, DrawingUnitAction, EmbeddingAction, GraphicAction, LessonAvatar,
    LessonDrawing, LessonDrawingStroke, LessonDrawingUnit, LessonEmbedding, LessonGraphic,
    LessonMusic, LessonSpeech, MusicAction, Position2D, Position3D, VoiceSource,
    VoiceSynthesisConfig,
};
pub use patch::LessonMaterialPatch;
