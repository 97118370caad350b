//! The LessonMaterial aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{MaterialError, MaterialResult};
use super::ids::{LessonId, MaterialId};
use super::lanes::{
    LessonAvatar, LessonDrawing, LessonDrawingUnit, LessonEmbedding, LessonGraphic, LessonMusic,
    LessonSpeech, VoiceSource, VoiceSynthesisConfig,
};
use super::validator;

/// One revision of one lesson's recorded content.
///
/// `id`, `version`, `created` and `updated` are owned by the store and the
/// update protocol; callers may leave them out of a create body. The six
/// lanes are required on the wire, even when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonMaterial {
    #[serde(default)]
    pub id: MaterialId,
    #[serde(rename = "lessonID", default)]
    pub lesson_id: LessonId,
    /// Revision ordinal among materials of the same lesson, starting at 1.
    #[serde(default)]
    pub version: u32,
    #[serde(rename = "userID", default)]
    pub user_id: i64,
    #[serde(rename = "avatarID", default)]
    pub avatar_id: i64,
    #[serde(default)]
    pub duration_sec: f32,
    #[serde(default)]
    pub avatar_light_color: String,
    #[serde(rename = "backgroundImageID", default)]
    pub background_image_id: i64,
    /// Display URL resolved from `background_image_id`. Never persisted.
    #[serde(
        rename = "backgroundImageURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub background_image_url: Option<String>,
    #[serde(default)]
    pub voice_synthesis_config: VoiceSynthesisConfig,
    pub avatars: Vec<LessonAvatar>,
    pub graphics: Vec<LessonGraphic>,
    pub drawings: Vec<LessonDrawing>,
    pub embeddings: Vec<LessonEmbedding>,
    pub musics: Vec<LessonMusic>,
    pub speeches: Vec<LessonSpeech>,
    #[serde(default)]
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub updated: DateTime<Utc>,
}

impl LessonMaterial {
    /// Empty timeline for a lesson; all lanes present and empty.
    pub fn new(lesson_id: LessonId) -> Self {
        Self {
            id: MaterialId::default(),
            lesson_id,
            version: 0,
            user_id: 0,
            avatar_id: 0,
            duration_sec: 0.0,
            avatar_light_color: String::new(),
            background_image_id: 0,
            background_image_url: None,
            voice_synthesis_config: VoiceSynthesisConfig::default(),
            avatars: Vec::new(),
            graphics: Vec::new(),
            drawings: Vec::new(),
            embeddings: Vec::new(),
            musics: Vec::new(),
            speeches: Vec::new(),
            created: DateTime::<Utc>::default(),
            updated: DateTime::<Utc>::default(),
        }
    }

    /// Parse a JSON body. Missing lanes are rejected here.
    pub fn from_json(bytes: &[u8]) -> MaterialResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Validate durations, elapsed times and the parent lesson id.
    pub fn validate(&self) -> MaterialResult<()> {
        if !self.lesson_id.is_set() {
            return Err(MaterialError::MissingLessonId);
        }
        validator::check_duration(|| "durationSec".to_string(), self.duration_sec)?;
        validator::check_lane(LaneKind::Avatars, &self.avatars)?;
        validator::check_lane(LaneKind::Graphics, &self.graphics)?;
        validator::check_drawings(&self.drawings)?;
        validator::check_lane(LaneKind::Embeddings, &self.embeddings)?;
        validator::check_lane(LaneKind::Musics, &self.musics)?;
        validator::check_lane(LaneKind::Speeches, &self.speeches)?;
        Ok(())
    }

    /// Number of entries in one lane.
    pub fn lane_len(&self, kind: LaneKind) -> usize {
        match kind {
            LaneKind::Avatars => self.avatars.len(),
            LaneKind::Graphics => self.graphics.len(),
            LaneKind::Drawings => self.drawings.len(),
            LaneKind::Embeddings => self.embeddings.len(),
            LaneKind::Musics => self.musics.len(),
            LaneKind::Speeches => self.speeches.len(),
        }
    }

    /// Elapsed times of one lane, in stored order.
    pub fn elapsed_times(&self, kind: LaneKind) -> Vec<f32> {
        fn times<T: TimedEntry>(entries: &[T]) -> Vec<f32> {
            entries.iter().map(TimedEntry::elapsed_time).collect()
        }
        match kind {
            LaneKind::Avatars => times(&self.avatars),
            LaneKind::Graphics => times(&self.graphics),
            LaneKind::Drawings => times(&self.drawings),
            LaneKind::Embeddings => times(&self.embeddings),
            LaneKind::Musics => times(&self.musics),
            LaneKind::Speeches => times(&self.speeches),
        }
    }

    /// Graphic asset ids referenced by the graphics lane, first appearance
    /// order, without duplicates.
    pub fn graphic_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::new();
        for graphic in &self.graphics {
            if !ids.contains(&graphic.graphic_id) {
                ids.push(graphic.graphic_id);
            }
        }
        ids
    }

    /// Pre-recorded voice ids used by speeches, first appearance order,
    /// without duplicates.
    pub fn voice_file_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::new();
        for speech in &self.speeches {
            if let VoiceSource::Recorded(voice_id) = speech.voice_source() {
                if !ids.contains(&voice_id) {
                    ids.push(voice_id);
                }
            }
        }
        ids
    }

    /// Structural equality ignoring identity, timestamps and the computed URL.
    pub fn content_eq(&self, other: &LessonMaterial) -> bool {
        self.without_identity() == other.without_identity()
    }

    fn without_identity(&self) -> LessonMaterial {
        LessonMaterial {
            id: MaterialId::default(),
            version: 0,
            background_image_url: None,
            created: DateTime::<Utc>::default(),
            updated: DateTime::<Utc>::default(),
            ..self.clone()
        }
    }
}

/// The six lanes of a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    Avatars,
    Graphics,
    Drawings,
    Embeddings,
    Musics,
    Speeches,
}

impl LaneKind {
    pub const ALL: [LaneKind; 6] = [
        LaneKind::Avatars,
        LaneKind::Graphics,
        LaneKind::Drawings,
        LaneKind::Embeddings,
        LaneKind::Musics,
        LaneKind::Speeches,
    ];

    /// JSON field name of the lane
    pub fn as_str(&self) -> &'static str {
        match self {
            LaneKind::Avatars => "avatars",
            LaneKind::Graphics => "graphics",
            LaneKind::Drawings => "drawings",
            LaneKind::Embeddings => "embeddings",
            LaneKind::Musics => "musics",
            LaneKind::Speeches => "speeches",
        }
    }
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything placed on a timeline.
pub trait TimedEntry {
    /// Seconds from lesson start.
    fn elapsed_time(&self) -> f32;

    /// Length of the entry, for entries that span time.
    fn duration_sec(&self) -> Option<f32> {
        None
    }
}

impl TimedEntry for LessonAvatar {
    fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    fn duration_sec(&self) -> Option<f32> {
        Some(self.duration_sec)
    }
}

impl TimedEntry for LessonGraphic {
    fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }
}

impl TimedEntry for LessonDrawing {
    fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    fn duration_sec(&self) -> Option<f32> {
        Some(self.duration_sec)
    }
}

impl TimedEntry for LessonDrawingUnit {
    fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    fn duration_sec(&self) -> Option<f32> {
        Some(self.duration_sec)
    }
}

impl TimedEntry for LessonEmbedding {
    fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }
}

impl TimedEntry for LessonMusic {
    fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }
}

impl TimedEntry for LessonSpeech {
    fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    fn duration_sec(&self) -> Option<f32> {
        Some(self.duration_sec)
    }
}
