//! Lesson material service
//!
//! Create and merge-update run inside one document store transaction each;
//! export reads the current revision and hands a plan to the archive
//! assembler.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::retry::{with_store_retry, with_store_retry_async};
use crate::archive::{
    ArchiveAssembler, ArchiveError, ArchiveLocation, ArchivePlan, AssemblerSettings, GraphicRef,
};
use crate::blob_store::BlobStore;
use crate::config::EngineConfig;
use crate::document_store::{DocumentStore, Key};
use crate::error::{EngineError, EngineResult};
use crate::material::{LessonId, LessonMaterial, LessonMaterialPatch, MaterialError, MaterialId};
use crate::revision::{CurrentRevision, RevisionResolver};

/// Create, update, read and export lesson material.
pub struct LessonMaterialService<D: DocumentStore, B: BlobStore + ?Sized> {
    documents: Arc<D>,
    blobs: Arc<B>,
    assembler: ArchiveAssembler<B>,
    config: EngineConfig,
}

impl<D: DocumentStore, B: BlobStore + ?Sized> LessonMaterialService<D, B> {
    pub fn new(documents: Arc<D>, blobs: Arc<B>, config: EngineConfig) -> Self {
        let assembler =
            ArchiveAssembler::new(blobs.clone(), AssemblerSettings::from_config(&config));
        Self {
            documents,
            blobs,
            assembler,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn documents(&self) -> &Arc<D> {
        &self.documents
    }

    pub fn blobs(&self) -> &Arc<B> {
        &self.blobs
    }

    pub fn assembler(&self) -> &ArchiveAssembler<B> {
        &self.assembler
    }

    /// Store `document` as the next revision of `lesson_id`.
    ///
    /// Identity and timestamps in the body are replaced: the store assigns
    /// the id, the version is the lesson's revision count plus one (never
    /// reusing a version a removed revision held), and
    /// `created == updated == now`.
    pub fn create(
        &self,
        lesson_id: LessonId,
        mut document: LessonMaterial,
    ) -> EngineResult<LessonMaterial> {
        document.lesson_id = lesson_id;
        document.id = MaterialId::default();
        document.background_image_url = None;
        document.validate()?;

        let stored = with_store_retry(&self.config.store_retry, "create", || {
            self.documents.run_in_transaction(|tx| -> EngineResult<LessonMaterial> {
                let mut revision = document.clone();
                revision.version = RevisionResolver::new_revision_version(tx, lesson_id)?;
                let now = Utc::now();
                revision.created = now;
                revision.updated = now;

                let key = tx.put(Key::incomplete(lesson_id), &revision)?;
                revision.id = key
                    .id
                    .ok_or_else(|| EngineError::Internal(format!("store returned {}", key)))?;
                Ok(revision)
            })
        })?;

        info!(
            event = "LESSON_MATERIAL_CREATED",
            lesson_id = %lesson_id,
            material_id = %stored.id,
            version = stored.version,
        );
        Ok(self.with_display_url(stored))
    }

    /// Merge `patch` into the existing material `id` of `lesson_id`.
    ///
    /// Supplied fields overwrite, everything else is kept. `id`, `lessonID`,
    /// `version` and `created` never change; `updated` always moves forward.
    pub fn update(
        &self,
        id: MaterialId,
        lesson_id: LessonId,
        patch: &LessonMaterialPatch,
    ) -> EngineResult<LessonMaterial> {
        if !lesson_id.is_set() {
            return Err(MaterialError::MissingLessonId.into());
        }
        patch.validate()?;
        let key = Key::new(lesson_id, id);

        let merged = with_store_retry(&self.config.store_retry, "update", || {
            self.documents.run_in_transaction(|tx| -> EngineResult<LessonMaterial> {
                let existing = tx.get(&key)?;

                let mut merged = existing.clone();
                patch.apply_to(&mut merged);
                merged.id = existing.id;
                merged.lesson_id = existing.lesson_id;
                merged.version = existing.version;
                merged.created = existing.created;
                merged.background_image_url = None;
                merged.updated = next_update_time(existing.updated);

                tx.put(key, &merged)?;
                Ok(merged)
            })
        })?;

        info!(
            event = "LESSON_MATERIAL_UPDATED",
            lesson_id = %lesson_id,
            material_id = %id,
            fields = ?patch.supplied_fields(),
        );
        Ok(self.with_display_url(merged))
    }

    /// Latest revision and revision count of a lesson
    pub fn current_revision(&self, lesson_id: LessonId) -> EngineResult<CurrentRevision> {
        with_store_retry(&self.config.store_retry, "current", || {
            self.read_current_revision(lesson_id)
        })
    }

    /// The most recently created material of a lesson
    pub fn current(&self, lesson_id: LessonId) -> EngineResult<LessonMaterial> {
        let revision = self.current_revision(lesson_id)?;
        self.displayed_latest(lesson_id, revision)
    }

    /// Package the current revision of a lesson and publish it.
    ///
    /// `graphic_types` maps each graphic id to its file extension; every
    /// graphic the revision references must have one. Voices are included
    /// when enabled in the configuration.
    pub async fn export(
        &self,
        lesson_id: LessonId,
        graphic_types: &HashMap<i64, String>,
        cancel: &CancellationToken,
    ) -> EngineResult<ArchiveLocation> {
        let revision = with_store_retry_async(
            &self.config.store_retry,
            "export",
            cancel,
            || ArchiveError::Cancelled(lesson_id).into(),
            || future::ready(self.read_current_revision(lesson_id)),
        )
        .await?;
        let material = self.displayed_latest(lesson_id, revision)?;
        let snapshot =
            serde_json::to_vec(&material).map_err(|e| EngineError::Internal(e.to_string()))?;

        let graphics = material
            .graphic_ids()
            .into_iter()
            .map(|graphic_id| match graphic_types.get(&graphic_id) {
                Some(extension) => Ok(GraphicRef::new(graphic_id, extension.clone())),
                None => Err(ArchiveError::MissingGraphicType(graphic_id)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let voices = if self.config.include_voices {
            material.voice_file_ids()
        } else {
            Vec::new()
        };

        let plan = ArchivePlan::new(lesson_id, snapshot, &graphics, &voices)?;
        Ok(self.assembler.publish_plan(plan, cancel).await?)
    }

    fn read_current_revision(&self, lesson_id: LessonId) -> EngineResult<CurrentRevision> {
        self.documents
            .run_in_transaction(|tx| -> EngineResult<CurrentRevision> {
                Ok(RevisionResolver::current_revision(tx, lesson_id)?)
            })
    }

    fn displayed_latest(
        &self,
        lesson_id: LessonId,
        revision: CurrentRevision,
    ) -> EngineResult<LessonMaterial> {
        let latest = revision.latest.ok_or_else(|| {
            EngineError::NotFound(format!("no lesson material under Lesson({})", lesson_id))
        })?;
        Ok(self.with_display_url(latest))
    }

    fn with_display_url(&self, mut material: LessonMaterial) -> LessonMaterial {
        material.background_image_url = self
            .config
            .background_image_url(material.background_image_id);
        material
    }
}

/// `now`, or just after `previous` when the clock has not moved past it
fn next_update_time(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + ChronoDuration::microseconds(1)
    }
}
