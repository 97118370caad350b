//! Current revision and next version of a lesson

use crate::document_store::{QueryOrder, StoreResult, Transaction};
use crate::material::{LessonId, LessonMaterial};

/// Latest revision of a lesson together with how many revisions exist.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentRevision {
    /// Newest revision by creation time, ties broken by highest id.
    /// `None` when the lesson has no revisions.
    pub latest: Option<LessonMaterial>,
    pub revision_count: u32,
    /// Highest `version` carried by any stored revision
    pub highest_version: u32,
}

impl CurrentRevision {
    pub fn is_empty(&self) -> bool {
        self.revision_count == 0
    }

    /// Version to assign to the next revision.
    ///
    /// Equal to the revision count plus one while revisions are only ever
    /// added. A removed revision lowers the count but not the highest
    /// version, so a version is never handed out twice.
    pub fn next_version(&self) -> u32 {
        self.revision_count.max(self.highest_version).saturating_add(1)
    }
}

/// Stateless resolver over a document store transaction.
///
/// The store orders `CreatedDesc` queries by creation time and then by id,
/// both descending, so the first row is the latest revision.
#[derive(Debug, Clone, Copy, Default)]
pub struct RevisionResolver;

impl RevisionResolver {
    pub fn current_revision(
        tx: &mut dyn Transaction,
        lesson_id: LessonId,
    ) -> StoreResult<CurrentRevision> {
        let revisions = tx.query_by_ancestor(lesson_id, QueryOrder::CreatedDesc, None)?;
        let revision_count = u32::try_from(revisions.len()).unwrap_or(u32::MAX);
        let highest_version = revisions.iter().map(|m| m.version).max().unwrap_or(0);

        Ok(CurrentRevision {
            latest: revisions.into_iter().next(),
            revision_count,
            highest_version,
        })
    }

    pub fn new_revision_version(
        tx: &mut dyn Transaction,
        lesson_id: LessonId,
    ) -> StoreResult<u32> {
        Ok(Self::current_revision(tx, lesson_id)?.next_version())
    }
}
