//! Partial updates for LessonMaterial
//!
//! Every updatable field is an `Option`: `None` means the caller did not
//! supply the field and the stored value is kept, `Some(v)` overwrites it,
//! including when `v` is `0`, `""` or an empty lane. A JSON `null` counts
//! as not supplied.
//!
//! `id`, `lessonID`, `version`, `created` and `updated` are not part of a
//! patch; they are ignored if present in the body.

use serde::{Deserialize, Serialize};

use super::document::{LaneKind, LessonMaterial};
use super::errors::MaterialResult;
use super::lanes::{
    LessonAvatar, LessonDrawing, LessonEmbedding, LessonGraphic, LessonMusic, LessonSpeech,
    VoiceSynthesisConfig,
};
use super::validator;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LessonMaterialPatch {
    #[serde(rename = "userID", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(rename = "avatarID", skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_light_color: Option<String>,
    #[serde(rename = "backgroundImageID", skip_serializing_if = "Option::is_none")]
    pub background_image_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_synthesis_config: Option<VoiceSynthesisConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatars: Option<Vec<LessonAvatar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphics: Option<Vec<LessonGraphic>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drawings: Option<Vec<LessonDrawing>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<LessonEmbedding>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub musics: Option<Vec<LessonMusic>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speeches: Option<Vec<LessonSpeech>>,
}

macro_rules! merge_present {
    ($patch:expr, $target:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$patch.$field {
                $target.$field = value.clone();
            }
        )+
    };
}

impl LessonMaterialPatch {
    pub fn from_json(bytes: &[u8]) -> MaterialResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// True when no field is supplied.
    pub fn is_empty(&self) -> bool {
        self.supplied_fields().is_empty()
    }

    /// Wire names of the supplied fields.
    pub fn supplied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        let mut note = |present: bool, name: &'static str| {
            if present {
                fields.push(name);
            }
        };
        note(self.user_id.is_some(), "userID");
        note(self.avatar_id.is_some(), "avatarID");
        note(self.duration_sec.is_some(), "durationSec");
        note(self.avatar_light_color.is_some(), "avatarLightColor");
        note(self.background_image_id.is_some(), "backgroundImageID");
        note(self.voice_synthesis_config.is_some(), "voiceSynthesisConfig");
        note(self.avatars.is_some(), LaneKind::Avatars.as_str());
        note(self.graphics.is_some(), LaneKind::Graphics.as_str());
        note(self.drawings.is_some(), LaneKind::Drawings.as_str());
        note(self.embeddings.is_some(), LaneKind::Embeddings.as_str());
        note(self.musics.is_some(), LaneKind::Musics.as_str());
        note(self.speeches.is_some(), LaneKind::Speeches.as_str());
        fields
    }

    /// Validate the supplied fields only.
    pub fn validate(&self) -> MaterialResult<()> {
        if let Some(duration) = self.duration_sec {
            validator::check_duration(|| "durationSec".to_string(), duration)?;
        }
        if let Some(avatars) = &self.avatars {
            validator::check_lane(LaneKind::Avatars, avatars)?;
        }
        if let Some(graphics) = &self.graphics {
            validator::check_lane(LaneKind::Graphics, graphics)?;
        }
        if let Some(drawings) = &self.drawings {
            validator::check_drawings(drawings)?;
        }
        if let Some(embeddings) = &self.embeddings {
            validator::check_lane(LaneKind::Embeddings, embeddings)?;
        }
        if let Some(musics) = &self.musics {
            validator::check_lane(LaneKind::Musics, musics)?;
        }
        if let Some(speeches) = &self.speeches {
            validator::check_lane(LaneKind::Speeches, speeches)?;
        }
        Ok(())
    }

    /// Overwrite the supplied fields of `target`; everything else is kept.
    pub fn apply_to(&self, target: &mut LessonMaterial) {
        merge_present!(
            self,
            target,
            user_id,
            avatar_id,
            duration_sec,
            avatar_light_color,
            background_image_id,
            voice_synthesis_config,
            avatars,
            graphics,
            drawings,
            embeddings,
            musics,
            speeches,
        );
    }
}
