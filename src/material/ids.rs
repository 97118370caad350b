//! Identifier newtypes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the parent Lesson of a material revision.
///
/// Zero is never a valid lesson id.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LessonId(i64);

impl LessonId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> i64 {
        self.0
    }

    /// True when the id refers to an actual lesson.
    pub const fn is_set(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for LessonId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Store-assigned identifier of one LessonMaterial document.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MaterialId(i64);

impl MaterialId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MaterialId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
