//! Document keys

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::material::{LessonId, MaterialId};

/// Composite key: the parent lesson plus the material id.
///
/// A key without an id is incomplete; putting under it allocates an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub ancestor: LessonId,
    pub id: Option<MaterialId>,
}

impl Key {
    pub fn new(ancestor: LessonId, id: MaterialId) -> Self {
        Self {
            ancestor,
            id: Some(id),
        }
    }

    pub fn incomplete(ancestor: LessonId) -> Self {
        Self { ancestor, id: None }
    }

    pub fn is_complete(&self) -> bool {
        self.id.is_some()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "Lesson({})/LessonMaterial({})", self.ancestor, id),
            None => write!(f, "Lesson({})/LessonMaterial(?)", self.ancestor),
        }
    }
}

/// Ordering of ancestor-scoped queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryOrder {
    CreatedAsc,
    /// Newest first
    #[default]
    CreatedDesc,
}
