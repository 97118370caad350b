//! # Document Store
//!
//! Keyed, transactional storage for LessonMaterial documents with
//! ancestor-scoped queries.
//!
//! Every document lives under exactly one ancestor (its Lesson). The store
//! is the sole authority for id assignment: putting a document under an
//! incomplete key allocates a fresh id, and the stored copy always carries
//! the id and lesson id of its key.
//!
//! Transactions are serializable. A transaction that read a key or an
//! ancestor scope which another transaction changed before it committed
//! fails with `StoreError::Conflict`; nothing it wrote becomes visible.

mod errors;
mod key;
mod local;

pub use errors::{StoreError, StoreResult};
pub use key::{Key, QueryOrder};
pub use local::LocalDocumentStore;

use crate::material::{LessonId, LessonMaterial};

/// Operations available inside one transaction.
pub trait Transaction {
    /// Read a document. Fails with `NotFound` if absent.
    fn get(&mut self, key: &Key) -> StoreResult<LessonMaterial>;

    /// Buffer a write. Returns the complete key, allocating an id if needed.
    fn put(&mut self, key: Key, document: &LessonMaterial) -> StoreResult<Key>;

    /// All documents under `ancestor`, ordered by creation time. Ties are
    /// broken by id in the same direction. `None` means no limit.
    fn query_by_ancestor(
        &mut self,
        ancestor: LessonId,
        order: QueryOrder,
        limit: Option<usize>,
    ) -> StoreResult<Vec<LessonMaterial>>;
}

/// A transactional document store.
pub trait DocumentStore: Send + Sync {
    /// Run `f` inside a transaction and commit its writes atomically.
    ///
    /// If `f` fails, nothing is written. Conflicts detected at commit are
    /// reported as `StoreError::Conflict` converted into `E`; the store never
    /// re-runs `f` on its own.
    fn run_in_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
        E: From<StoreError>;

    fn get(&self, key: &Key) -> StoreResult<LessonMaterial> {
        self.run_in_transaction(|tx| tx.get(key))
    }

    fn put(&self, key: Key, document: &LessonMaterial) -> StoreResult<Key> {
        self.run_in_transaction(|tx| tx.put(key, document))
    }

    fn query_by_ancestor(
        &self,
        ancestor: LessonId,
        order: QueryOrder,
        limit: Option<usize>,
    ) -> StoreResult<Vec<LessonMaterial>> {
        self.run_in_transaction(|tx| tx.query_by_ancestor(ancestor, order, limit))
    }
}
