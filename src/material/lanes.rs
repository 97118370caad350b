//! Lane entry types
//!
//! Field names on the wire (`elapsedTime`, `durationSec`, `graphicID`, ...)
//! are the compatibility surface for anything rendering or consuming a
//! lesson, so every rename here is load-bearing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Speech synthesis parameters, either lesson-wide or per speech.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VoiceSynthesisConfig {
    pub language_code: String,
    pub name: String,
    pub speaking_rate: f32,
    pub pitch: f32,
    pub volume_gain_db: f32,
}

/// Avatar motion segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonAvatar {
    pub elapsed_time: f32,
    pub duration_sec: f32,
    #[serde(default)]
    pub moving: Position3D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphicAction {
    Show,
    Hide,
    Transition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonGraphic {
    pub elapsed_time: f32,
    #[serde(rename = "graphicID")]
    pub graphic_id: i64,
    pub action: GraphicAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingAction {
    Draw,
    Clear,
    Show,
    Hide,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDrawing {
    pub elapsed_time: f32,
    pub duration_sec: f32,
    pub action: DrawingAction,
    #[serde(default)]
    pub units: Vec<LessonDrawingUnit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingUnitAction {
    Draw,
    Undo,
}

/// One stroke unit inside a drawing action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDrawingUnit {
    pub elapsed_time: f32,
    pub duration_sec: f32,
    pub action: DrawingUnitAction,
    pub stroke: LessonDrawingStroke,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LessonDrawingStroke {
    #[serde(skip_serializing_if = "is_false")]
    pub eraser: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub line_width: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<Position2D>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingAction {
    Show,
    Hide,
}

/// Externally hosted content (a video service, a slide deck, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonEmbedding {
    pub elapsed_time: f32,
    pub action: EmbeddingAction,
    #[serde(rename = "contentID")]
    pub content_id: String,
    #[serde(rename = "type")]
    pub service_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicAction {
    Start,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonMusic {
    pub elapsed_time: f32,
    pub action: MusicAction,
    #[serde(rename = "backgroundMusicID")]
    pub background_music_id: i64,
    pub volume: f32,
    pub is_fading: bool,
    pub is_loop: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Caption {
    #[serde(rename = "sizeVW")]
    pub size_vw: i8,
    pub body: String,
    pub body_color: String,
    pub border_color: String,
    pub horizontal_align: String,
    pub vertical_align: String,
}

/// Narration segment.
///
/// A speech either plays pre-recorded audio (`voiceID`) or is synthesized
/// from its subtitle with `synthesisConfig`; see [`LessonSpeech::voice_source`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSpeech {
    pub elapsed_time: f32,
    pub duration_sec: f32,
    #[serde(rename = "voiceID", default)]
    pub voice_id: i64,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub caption: Caption,
    #[serde(default)]
    pub is_synthesis: bool,
    #[serde(default)]
    pub synthesis_config: VoiceSynthesisConfig,
}

/// Where the audio of a speech comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceSource<'a> {
    /// Pre-recorded voice file.
    Recorded(i64),
    /// Synthesized at playback time.
    Synthesized(&'a VoiceSynthesisConfig),
    /// Neither a recording nor synthesis (subtitle only).
    Silent,
}

impl LessonSpeech {
    pub fn voice_source(&self) -> VoiceSource<'_> {
        if self.is_synthesis {
            VoiceSource::Synthesized(&self.synthesis_config)
        } else if self.voice_id != 0 {
            VoiceSource::Recorded(self.voice_id)
        } else {
            VoiceSource::Silent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphic_wire_names() {
        let graphic = LessonGraphic {
            elapsed_time: 1.5,
            graphic_id: 101,
            action: GraphicAction::Show,
        };
        let value = serde_json::to_value(&graphic).unwrap();
        assert_eq!(value["elapsedTime"], 1.5);
        assert_eq!(value["graphicID"], 101);
        assert_eq!(value["action"], "show");
    }

    #[test]
    fn test_embedding_service_name_is_type() {
        let json = r#"{"elapsedTime":0,"action":"hide","contentID":"abc","type":"youtube"}"#;
        let embedding: LessonEmbedding = serde_json::from_str(json).unwrap();
        assert_eq!(embedding.service_name, "youtube");
        assert_eq!(embedding.action, EmbeddingAction::Hide);
    }

    #[test]
    fn test_empty_stroke_omits_optional_fields() {
        let value = serde_json::to_value(LessonDrawingStroke::default()).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let json = r#"{"elapsedTime":0,"action":"spin","graphicID":1}"#;
        assert!(serde_json::from_str::<LessonGraphic>(json).is_err());
    }

    #[test]
    fn test_voice_source() {
        let mut speech = LessonSpeech {
            elapsed_time: 0.0,
            duration_sec: 2.0,
            voice_id: 9,
            subtitle: "hello".into(),
            caption: Caption::default(),
            is_synthesis: false,
            synthesis_config: VoiceSynthesisConfig::default(),
        };
        assert_eq!(speech.voice_source(), VoiceSource::Recorded(9));

        speech.is_synthesis = true;
        assert!(matches!(speech.voice_source(), VoiceSource::Synthesized(_)));

        speech.is_synthesis = false;
        speech.voice_id = 0;
        assert_eq!(speech.voice_source(), VoiceSource::Silent);
    }
}
