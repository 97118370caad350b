//! # Local Document Store
//!
//! Optimistic, serializable store kept in memory, optionally backed by a
//! JSON snapshot file.
//!
//! Every committed write stamps a store-wide generation on the written
//! document and on its ancestor scope. A transaction remembers the
//! generation of each key and scope it read; commit re-checks them under
//! the store lock and refuses if anything moved.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::errors::{StoreError, StoreResult};
use super::key::{Key, QueryOrder};
use super::{DocumentStore, Transaction};
use crate::material::{LessonId, LessonMaterial, MaterialId};

type Slot = (LessonId, MaterialId);

#[derive(Debug, Clone)]
struct StoredEntry {
    generation: u64,
    document: LessonMaterial,
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    next_id: i64,
    generation: u64,
    documents: BTreeMap<Slot, StoredEntry>,
    /// Generation of the last write under each ancestor
    scopes: HashMap<LessonId, u64>,
}

impl StoreState {
    fn scope_generation(&self, ancestor: LessonId) -> u64 {
        self.scopes.get(&ancestor).copied().unwrap_or(0)
    }

    fn apply(&mut self, writes: BTreeMap<Slot, LessonMaterial>) {
        self.generation += 1;
        let generation = self.generation;
        for (slot, document) in writes {
            self.scopes.insert(slot.0, generation);
            self.documents.insert(
                slot,
                StoredEntry {
                    generation,
                    document,
                },
            );
        }
    }
}

/// On-disk form of the store
#[derive(Serialize, Deserialize)]
struct Snapshot {
    next_id: i64,
    generation: u64,
    documents: Vec<SnapshotEntry>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEntry {
    generation: u64,
    document: LessonMaterial,
}

impl Snapshot {
    fn capture(state: &StoreState) -> Self {
        Self {
            next_id: state.next_id,
            generation: state.generation,
            documents: state
                .documents
                .values()
                .map(|entry| SnapshotEntry {
                    generation: entry.generation,
                    document: entry.document.clone(),
                })
                .collect(),
        }
    }

    fn restore(self) -> StoreState {
        let mut state = StoreState {
            next_id: self.next_id,
            generation: self.generation,
            ..Default::default()
        };
        for entry in self.documents {
            let slot = (entry.document.lesson_id, entry.document.id);
            let scope = state.scopes.entry(slot.0).or_insert(0);
            *scope = (*scope).max(entry.generation);
            state.documents.insert(
                slot,
                StoredEntry {
                    generation: entry.generation,
                    document: entry.document,
                },
            );
        }
        state
    }
}

/// In-process document store
#[derive(Debug)]
pub struct LocalDocumentStore {
    state: Mutex<StoreState>,
    path: Option<PathBuf>,
    unavailable: AtomicU32,
}

impl LocalDocumentStore {
    /// Create a store that lives only in memory
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            path: None,
            unavailable: AtomicU32::new(0),
        }
    }

    /// Open a store persisted at `path`, loading it if it exists.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let state = if path.exists() {
            let bytes = fs::read(&path).map_err(|e| StoreError::IoError(e.to_string()))?;
            let snapshot: Snapshot = serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Snapshot(format!("{}: {}", path.display(), e)))?;
            snapshot.restore()
        } else {
            StoreState::default()
        };

        Ok(Self {
            state: Mutex::new(state),
            path: Some(path),
            unavailable: AtomicU32::new(0),
        })
    }

    /// Number of stored documents
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.lock()?.documents.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove a document.
    ///
    /// Not part of the lesson material protocol; collaborators that own
    /// deletion call it directly.
    pub fn delete(&self, key: &Key) -> StoreResult<()> {
        let id = key.id.ok_or(StoreError::IncompleteKey(*key))?;
        let mut state = self.lock()?;
        let mut next = state.clone();
        if next.documents.remove(&(key.ancestor, id)).is_none() {
            return Err(StoreError::NotFound(*key));
        }
        next.generation += 1;
        let generation = next.generation;
        next.scopes.insert(key.ancestor, generation);
        self.persist(&next)?;
        *state = next;
        Ok(())
    }

    /// Make the next `attempts` transactions fail with `Unavailable`.
    pub fn set_unavailable(&self, attempts: u32) {
        self.unavailable.store(attempts, Ordering::SeqCst);
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))
    }

    fn check_available(&self) -> StoreResult<()> {
        let was_down = self
            .unavailable
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if was_down {
            Err(StoreError::Unavailable("store temporarily unreachable".into()))
        } else {
            Ok(())
        }
    }

    fn allocate_id(&self) -> StoreResult<MaterialId> {
        let mut state = self.lock()?;
        state.next_id += 1;
        Ok(MaterialId::new(state.next_id))
    }

    fn commit(&self, tx: LocalTransaction<'_>) -> StoreResult<()> {
        let mut state = self.lock()?;

        for (slot, observed) in &tx.key_reads {
            let current = state.documents.get(slot).map(|entry| entry.generation);
            match (observed, current) {
                (Some(seen), Some(now)) if *seen == now => {}
                (None, None) => {}
                (Some(_), None) => return Err(StoreError::NotFound(Key::new(slot.0, slot.1))),
                _ => {
                    return Err(StoreError::Conflict(format!(
                        "{} changed since it was read",
                        Key::new(slot.0, slot.1)
                    )))
                }
            }
        }

        for (ancestor, observed) in &tx.scope_reads {
            if state.scope_generation(*ancestor) != *observed {
                return Err(StoreError::Conflict(format!(
                    "documents under Lesson({}) changed since they were queried",
                    ancestor
                )));
            }
        }

        if tx.writes.is_empty() {
            return Ok(());
        }

        if self.path.is_some() {
            let mut next = state.clone();
            next.apply(tx.writes);
            self.persist(&next)?;
            *state = next;
        } else {
            state.apply(tx.writes);
        }

        Ok(())
    }

    fn persist(&self, state: &StoreState) -> StoreResult<()> {
        match &self.path {
            Some(path) => write_snapshot(path, state),
            None => Ok(()),
        }
    }
}

impl DocumentStore for LocalDocumentStore {
    fn run_in_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.check_available()?;

        let mut tx = LocalTransaction::new(self);
        let value = f(&mut tx)?;
        self.commit(tx)?;

        Ok(value)
    }
}

/// Write the snapshot to a temp file, then rename it over the old one.
fn write_snapshot(path: &Path, state: &StoreState) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(&Snapshot::capture(state))
        .map_err(|e| StoreError::Snapshot(e.to_string()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::IoError(e.to_string()))?;
    }

    let temp_path = path.with_extension("json.tmp");
    let mut file = File::create(&temp_path).map_err(|e| StoreError::IoError(e.to_string()))?;
    file.write_all(&bytes)
        .and_then(|_| file.sync_all())
        .map_err(|e| StoreError::IoError(e.to_string()))?;

    fs::rename(&temp_path, path).map_err(|e| StoreError::IoError(e.to_string()))
}

struct LocalTransaction<'a> {
    store: &'a LocalDocumentStore,
    key_reads: HashMap<Slot, Option<u64>>,
    scope_reads: HashMap<LessonId, u64>,
    writes: BTreeMap<Slot, LessonMaterial>,
}

impl<'a> LocalTransaction<'a> {
    fn new(store: &'a LocalDocumentStore) -> Self {
        Self {
            store,
            key_reads: HashMap::new(),
            scope_reads: HashMap::new(),
            writes: BTreeMap::new(),
        }
    }
}

impl Transaction for LocalTransaction<'_> {
    fn get(&mut self, key: &Key) -> StoreResult<LessonMaterial> {
        let id = key.id.ok_or(StoreError::IncompleteKey(*key))?;
        let slot = (key.ancestor, id);

        if let Some(document) = self.writes.get(&slot) {
            return Ok(document.clone());
        }

        let store = self.store;
        let state = store.lock()?;
        let entry = state.documents.get(&slot);
        self.key_reads
            .entry(slot)
            .or_insert(entry.map(|e| e.generation));

        entry
            .map(|e| e.document.clone())
            .ok_or(StoreError::NotFound(*key))
    }

    fn put(&mut self, key: Key, document: &LessonMaterial) -> StoreResult<Key> {
        let id = match key.id {
            Some(id) => id,
            None => self.store.allocate_id()?,
        };

        let mut stored = document.clone();
        stored.id = id;
        stored.lesson_id = key.ancestor;
        self.writes.insert((key.ancestor, id), stored);

        Ok(Key::new(key.ancestor, id))
    }

    fn query_by_ancestor(
        &mut self,
        ancestor: LessonId,
        order: QueryOrder,
        limit: Option<usize>,
    ) -> StoreResult<Vec<LessonMaterial>> {
        let store = self.store;
        let mut found: BTreeMap<MaterialId, LessonMaterial> = {
            let state = store.lock()?;
            self.scope_reads
                .entry(ancestor)
                .or_insert(state.scope_generation(ancestor));
            state
                .documents
                .range(
                    (ancestor, MaterialId::new(i64::MIN))..=(ancestor, MaterialId::new(i64::MAX)),
                )
                .map(|((_, id), entry)| (*id, entry.document.clone()))
                .collect()
        };

        for ((lesson_id, id), document) in &self.writes {
            if *lesson_id == ancestor {
                found.insert(*id, document.clone());
            }
        }

        let mut documents: Vec<LessonMaterial> = found.into_values().collect();
        documents.sort_by(|a, b| (a.created, a.id).cmp(&(b.created, b.id)));
        if order == QueryOrder::CreatedDesc {
            documents.reverse();
        }
        if let Some(limit) = limit {
            documents.truncate(limit);
        }

        Ok(documents)
    }
}
