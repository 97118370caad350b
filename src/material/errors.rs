//! # Lesson Material Errors

use thiserror::Error;

/// Result type for material validation and parsing
pub type MaterialResult<T> = Result<T, MaterialError>;

/// Reasons a lesson material (or a patch for one) is rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MaterialError {
    #[error("lessonID must be set")]
    MissingLessonId,

    #[error("{field} must be a non-negative number, got {value}")]
    NegativeDuration { field: String, value: f32 },

    #[error("{field} must be a non-negative number, got {value}")]
    NegativeElapsedTime { field: String, value: f32 },

    #[error("malformed lesson material: {0}")]
    Malformed(String),
}

impl MaterialError {
    /// Dotted path of the offending field, when there is one
    pub fn field(&self) -> Option<&str> {
        match self {
            MaterialError::NegativeDuration { field, .. }
            | MaterialError::NegativeElapsedTime { field, .. } => Some(field),
            MaterialError::MissingLessonId => Some("lessonID"),
            MaterialError::Malformed(_) => None,
        }
    }
}

impl From<serde_json::Error> for MaterialError {
    fn from(err: serde_json::Error) -> Self {
        MaterialError::Malformed(err.to_string())
    }
}
