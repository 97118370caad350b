//! Scoped zip writer
//!
//! `ArchiveWriter` owns the zip container for the duration of one export.
//! `finish` consumes it and yields the archive bytes; on any other exit the
//! writer is dropped and its partial contents are discarded.

use std::fmt;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::errors::{ArchiveError, ArchiveResult};
use crate::material::LessonId;

pub struct ArchiveWriter {
    lesson_id: LessonId,
    zip: Option<ZipWriter<Cursor<Vec<u8>>>>,
    entries: Vec<String>,
}

impl ArchiveWriter {
    pub fn new(lesson_id: LessonId) -> Self {
        Self {
            lesson_id,
            zip: Some(ZipWriter::new(Cursor::new(Vec::new()))),
            entries: Vec::new(),
        }
    }

    /// Append one entry. Entries are stored in call order.
    pub fn add_entry(&mut self, path: &str, data: &[u8]) -> ArchiveResult<()> {
        let zip = self
            .zip
            .as_mut()
            .ok_or_else(|| ArchiveError::Writer("writer already finished".into()))?;

        // Fixed timestamp so identical inputs give identical bytes
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        zip.start_file(path, options)?;
        zip.write_all(data)
            .map_err(|e| ArchiveError::Writer(e.to_string()))?;
        self.entries.push(path.to_string());

        debug!(
            event = "ARCHIVE_ENTRY_WRITTEN",
            lesson_id = %self.lesson_id,
            path,
            size = data.len(),
        );
        Ok(())
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Write the central directory and hand back the finished archive.
    pub fn finish(mut self) -> ArchiveResult<PackedArchive> {
        let zip = self
            .zip
            .take()
            .ok_or_else(|| ArchiveError::Writer("writer already finished".into()))?;
        let bytes = zip.finish()?.into_inner();

        Ok(PackedArchive {
            lesson_id: self.lesson_id,
            bytes,
            entries: std::mem::take(&mut self.entries),
        })
    }
}

impl Drop for ArchiveWriter {
    fn drop(&mut self) {
        if self.zip.take().is_some() {
            debug!(
                event = "ARCHIVE_WRITER_DISCARDED",
                lesson_id = %self.lesson_id,
                entries_written = self.entries.len(),
            );
        }
    }
}

/// A fully assembled archive, ready to publish
#[derive(Clone, PartialEq, Eq)]
pub struct PackedArchive {
    lesson_id: LessonId,
    bytes: Vec<u8>,
    entries: Vec<String>,
}

impl PackedArchive {
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Entry paths in archive order
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for PackedArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedArchive")
            .field("lesson_id", &self.lesson_id)
            .field("size", &self.bytes.len())
            .field("entries", &self.entries)
            .finish()
    }
}
