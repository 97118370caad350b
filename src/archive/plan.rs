//! Deterministic archive plans

use std::collections::HashSet;
use std::fmt;

use super::errors::{ArchiveError, ArchiveResult};
use super::SNAPSHOT_ENTRY;
use crate::material::LessonId;

/// A graphic asset and the file extension it is stored with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphicRef {
    pub asset_id: i64,
    pub extension: String,
}

impl GraphicRef {
    pub fn new(asset_id: i64, extension: impl Into<String>) -> Self {
        Self {
            asset_id,
            extension: extension.into(),
        }
    }
}

/// A blob the archive needs to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRef {
    Graphic(GraphicRef),
    Voice { lesson_id: LessonId, file_id: i64 },
}

impl AssetRef {
    /// Where the blob lives in the material bucket
    pub fn source_path(&self) -> String {
        match self {
            AssetRef::Graphic(graphic) => {
                format!("graphic/{}.{}", graphic.asset_id, graphic.extension)
            }
            AssetRef::Voice { lesson_id, file_id } => {
                format!("voice/{}/{}.ogg", lesson_id, file_id)
            }
        }
    }

    /// Where the blob lands inside the archive
    pub fn entry_path(&self) -> String {
        match self {
            AssetRef::Graphic(graphic) => {
                format!("graphics/{}.{}", graphic.asset_id, graphic.extension)
            }
            AssetRef::Voice { lesson_id, file_id } => {
                format!("voices/{}/{}.ogg", lesson_id, file_id)
            }
        }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::Graphic(graphic) => write!(f, "graphic {}", graphic.asset_id),
            AssetRef::Voice { file_id, .. } => write!(f, "voice {}", file_id),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum PlannedEntry {
    Asset(AssetRef),
    Snapshot(Vec<u8>),
}

impl PlannedEntry {
    pub(crate) fn entry_path(&self) -> String {
        match self {
            PlannedEntry::Asset(asset) => asset.entry_path(),
            PlannedEntry::Snapshot(_) => SNAPSHOT_ENTRY.to_string(),
        }
    }
}

/// Ordered list of everything one archive will contain.
///
/// Order is graphics in reference order, then the snapshot, then voices in
/// reference order. The plan is fixed before any fetch starts.
#[derive(Debug, Clone)]
pub struct ArchivePlan {
    lesson_id: LessonId,
    entries: Vec<PlannedEntry>,
}

impl ArchivePlan {
    pub fn new(
        lesson_id: LessonId,
        snapshot: Vec<u8>,
        graphics: &[GraphicRef],
        voice_file_ids: &[i64],
    ) -> ArchiveResult<Self> {
        let mut entries = Vec::with_capacity(graphics.len() + voice_file_ids.len() + 1);

        for graphic in graphics {
            if graphic.extension.is_empty() {
                return Err(ArchiveError::MissingGraphicType(graphic.asset_id));
            }
            if !graphic.extension.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return Err(ArchiveError::InvalidGraphicType {
                    asset_id: graphic.asset_id,
                    extension: graphic.extension.clone(),
                });
            }
            entries.push(PlannedEntry::Asset(AssetRef::Graphic(graphic.clone())));
        }
        entries.push(PlannedEntry::Snapshot(snapshot));
        for &file_id in voice_file_ids {
            entries.push(PlannedEntry::Asset(AssetRef::Voice { lesson_id, file_id }));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            let path = entry.entry_path();
            if !seen.insert(path.clone()) {
                return Err(ArchiveError::DuplicateEntry(path));
            }
        }

        Ok(Self { lesson_id, entries })
    }

    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entry_paths(&self) -> Vec<String> {
        self.entries.iter().map(PlannedEntry::entry_path).collect()
    }

    /// Blobs that must be fetched, in plan order
    pub fn assets(&self) -> Vec<&AssetRef> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                PlannedEntry::Asset(asset) => Some(asset),
                PlannedEntry::Snapshot(_) => None,
            })
            .collect()
    }

    pub(crate) fn into_entries(self) -> Vec<PlannedEntry> {
        self.entries
    }
}
