//! Fetch, write and publish

use futures_util::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::errors::{ArchiveError, ArchiveResult};
use super::plan::{ArchivePlan, GraphicRef, PlannedEntry};
use super::writer::{ArchiveWriter, PackedArchive};
use super::{archive_path, ARCHIVE_CONTENT_TYPE, SNAPSHOT_ENTRY};
use crate::blob_store::{BlobError, BlobStore};
use crate::config::EngineConfig;
use crate::material::LessonId;

#[derive(Debug, Clone, PartialEq)]
pub struct AssemblerSettings {
    pub bucket: String,
    /// Upper bound on fetches running at once; at least 1
    pub max_in_flight: usize,
    pub fetch_timeout: Duration,
    pub publish_timeout: Duration,
}

impl AssemblerSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            bucket: config.material_bucket.clone(),
            max_in_flight: config.max_in_flight_fetches,
            fetch_timeout: config.fetch_timeout(),
            publish_timeout: config.publish_timeout(),
        }
    }
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Where a published archive ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLocation {
    pub bucket: String,
    pub path: String,
    pub size: usize,
    pub entries: usize,
}

/// Assembles lesson archives against one blob store.
///
/// Holds no per-export state; each call builds its own writer, so one
/// assembler can serve concurrent exports of different lessons.
pub struct ArchiveAssembler<B: BlobStore + ?Sized> {
    blobs: Arc<B>,
    settings: AssemblerSettings,
}

impl<B: BlobStore + ?Sized> ArchiveAssembler<B> {
    pub fn new(blobs: Arc<B>, settings: AssemblerSettings) -> Self {
        Self { blobs, settings }
    }

    pub fn settings(&self) -> &AssemblerSettings {
        &self.settings
    }

    /// Archive `snapshot` plus the given graphics and publish the result.
    pub async fn build_and_publish(
        &self,
        lesson_id: LessonId,
        snapshot: Vec<u8>,
        graphic_refs: &[GraphicRef],
        cancel: &CancellationToken,
    ) -> ArchiveResult<ArchiveLocation> {
        let plan = ArchivePlan::new(lesson_id, snapshot, graphic_refs, &[])?;
        self.publish_plan(plan, cancel).await
    }

    /// Assemble every entry of `plan`, then publish.
    pub async fn publish_plan(
        &self,
        plan: ArchivePlan,
        cancel: &CancellationToken,
    ) -> ArchiveResult<ArchiveLocation> {
        let lesson_id = plan.lesson_id();
        let archive = self.assemble(plan, cancel).await?;

        if cancel.is_cancelled() {
            warn!(event = "ARCHIVE_ABORTED", lesson_id = %lesson_id, reason = "cancelled");
            return Err(ArchiveError::Cancelled(lesson_id));
        }

        self.publish(archive).await
    }

    /// Fetch every asset of `plan` and write the archive in plan order.
    ///
    /// Fetches complete in any order; finished ones wait until every entry
    /// before them has been written. The first failure or a cancellation
    /// drops all outstanding fetches and the partial archive.
    pub async fn assemble(
        &self,
        plan: ArchivePlan,
        cancel: &CancellationToken,
    ) -> ArchiveResult<PackedArchive> {
        let lesson_id = plan.lesson_id();
        if cancel.is_cancelled() {
            warn!(event = "ARCHIVE_ABORTED", lesson_id = %lesson_id, reason = "cancelled");
            return Err(ArchiveError::Cancelled(lesson_id));
        }

        let entries = plan.into_entries();
        let total = entries.len();
        let mut writer = ArchiveWriter::new(lesson_id);

        let mut fetches = pin!(stream::iter(entries.into_iter().enumerate().map(
            |(index, entry)| async move { (index, self.resolve(entry).await) }
        ))
        .buffer_unordered(self.settings.max_in_flight.max(1)));

        let mut ready: BTreeMap<usize, (String, Vec<u8>)> = BTreeMap::new();
        let mut next_index = 0;

        while next_index < total {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(
                        event = "ARCHIVE_ABORTED",
                        lesson_id = %lesson_id,
                        reason = "cancelled",
                        entries_written = next_index,
                    );
                    return Err(ArchiveError::Cancelled(lesson_id));
                }
                fetched = fetches.next() => fetched,
            };

            let Some((index, result)) = fetched else {
                return Err(ArchiveError::Writer(format!(
                    "fetches ended after {} of {} entries",
                    next_index, total
                )));
            };

            match result {
                Ok(entry) => {
                    ready.insert(index, entry);
                }
                Err(e) => {
                    warn!(
                        event = "ARCHIVE_ABORTED",
                        lesson_id = %lesson_id,
                        reason = %e,
                        entries_written = next_index,
                    );
                    return Err(e);
                }
            }

            while let Some((path, data)) = ready.remove(&next_index) {
                writer.add_entry(&path, &data)?;
                next_index += 1;
            }
        }

        let archive = writer.finish()?;
        info!(
            event = "ARCHIVE_ASSEMBLED",
            lesson_id = %lesson_id,
            entries = archive.entries().len(),
            size = archive.size(),
        );
        Ok(archive)
    }

    /// Upload a finished archive to `lesson/<lessonID>.zip`.
    ///
    /// On failure the archive comes back inside `UploadFailed`, so this can
    /// be called again with the same bytes.
    pub async fn publish(&self, archive: PackedArchive) -> ArchiveResult<ArchiveLocation> {
        let lesson_id = archive.lesson_id();
        let path = archive_path(lesson_id);

        let upload = self.blobs.put_object(
            &self.settings.bucket,
            &path,
            ARCHIVE_CONTENT_TYPE,
            archive.bytes(),
        );
        let outcome = match timeout(self.settings.publish_timeout, upload).await {
            Ok(result) => result,
            Err(_) => Err(BlobError::Timeout(format!(
                "publish of {} exceeded {:?}",
                path, self.settings.publish_timeout
            ))),
        };

        if let Err(source) = outcome {
            warn!(
                event = "ARCHIVE_ABORTED",
                lesson_id = %lesson_id,
                path = %path,
                reason = %source,
            );
            return Err(ArchiveError::UploadFailed {
                path,
                source,
                archive: Box::new(archive),
            });
        }

        let location = ArchiveLocation {
            bucket: self.settings.bucket.clone(),
            path,
            size: archive.size(),
            entries: archive.entries().len(),
        };
        info!(
            event = "ARCHIVE_PUBLISHED",
            lesson_id = %lesson_id,
            bucket = %location.bucket,
            path = %location.path,
            size = location.size,
        );
        Ok(location)
    }

    async fn resolve(&self, entry: PlannedEntry) -> ArchiveResult<(String, Vec<u8>)> {
        let asset = match entry {
            PlannedEntry::Snapshot(bytes) => return Ok((SNAPSHOT_ENTRY.to_string(), bytes)),
            PlannedEntry::Asset(asset) => asset,
        };

        let source_path = asset.source_path();
        let fetch = self.blobs.get_object(&self.settings.bucket, &source_path);
        match timeout(self.settings.fetch_timeout, fetch).await {
            Ok(Ok(bytes)) => Ok((asset.entry_path(), bytes)),
            Ok(Err(source)) => Err(ArchiveError::BlobFetchFailed { asset, source }),
            Err(_) => Err(ArchiveError::BlobFetchFailed {
                source: BlobError::Timeout(format!(
                    "fetch of {} exceeded {:?}",
                    source_path, self.settings.fetch_timeout
                )),
                asset,
            }),
        }
    }
}
