//! Revision Versioning Tests
//!
//! - version = number of existing revisions + 1
//! - concurrent creates for one lesson never share a version
//! - current = latest created, ties broken by highest id

use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

use lessonpack::blob_store::MemoryBlobStore;
use lessonpack::document_store::{DocumentStore, Key, LocalDocumentStore};
use lessonpack::revision::RevisionResolver;
use lessonpack::{
    EngineConfig, EngineError, ErrorKind, LessonId, LessonMaterial, LessonMaterialService,
};
use tempfile::TempDir;

type Service = LessonMaterialService<LocalDocumentStore, MemoryBlobStore>;

fn service_over(store: LocalDocumentStore) -> Service {
    LessonMaterialService::new(
        Arc::new(store),
        Arc::new(MemoryBlobStore::new()),
        EngineConfig::default(),
    )
}

/// Create, re-running the whole operation on conflict as a caller would.
fn create_with_retry(service: &Service, lesson: LessonId) -> (LessonMaterial, usize) {
    let mut conflicts = 0;
    loop {
        match service.create(lesson, LessonMaterial::new(lesson)) {
            Ok(stored) => return (stored, conflicts),
            Err(EngineError::TransactionConflict(_)) => conflicts += 1,
            Err(e) => panic!("create failed: {}", e),
        }
    }
}

// =============================================================================
// Sequential Versioning
// =============================================================================

/// First revision of a lesson is version 1, with created == updated.
#[test]
fn test_first_revision() {
    let service = service_over(LocalDocumentStore::in_memory());
    let mut body = LessonMaterial::new(LessonId::new(7));
    body.avatar_id = 5;
    body.duration_sec = 12.5;

    let stored = service.create(LessonId::new(7), body).unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(stored.created, stored.updated);
    assert_eq!(stored.avatar_id, 5);
    assert_eq!(stored.duration_sec, 12.5);
}

/// The n+1th revision gets version n+1, not 2.
#[test]
fn test_version_counts_all_revisions() {
    let service = service_over(LocalDocumentStore::in_memory());
    let lesson = LessonId::new(7);

    for expected in 1..=5 {
        let stored = service.create(lesson, LessonMaterial::new(lesson)).unwrap();
        assert_eq!(stored.version, expected);
    }

    let revision = service.current_revision(lesson).unwrap();
    assert_eq!(revision.revision_count, 5);
    assert_eq!(revision.latest.map(|m| m.version), Some(5));
}

/// Removing a revision does not free its version for the next create.
#[test]
fn test_version_not_reused_after_removal() {
    let store = Arc::new(LocalDocumentStore::in_memory());
    let service: Service = LessonMaterialService::new(
        store.clone(),
        Arc::new(MemoryBlobStore::new()),
        EngineConfig::default(),
    );
    let lesson = LessonId::new(7);

    let first = service.create(lesson, LessonMaterial::new(lesson)).unwrap();
    let second = service.create(lesson, LessonMaterial::new(lesson)).unwrap();
    store.delete(&Key::new(lesson, first.id)).unwrap();
    let third = service.create(lesson, LessonMaterial::new(lesson)).unwrap();

    assert_eq!((first.version, second.version, third.version), (1, 2, 3));
    let current = service.current_revision(lesson).unwrap();
    assert_eq!(current.revision_count, 2);
    assert_eq!(current.latest.map(|m| m.id), Some(third.id));
}

/// Versions are counted per lesson.
#[test]
fn test_versions_independent_per_lesson() {
    let service = service_over(LocalDocumentStore::in_memory());

    service.create(LessonId::new(1), LessonMaterial::new(LessonId::new(1))).unwrap();
    service.create(LessonId::new(1), LessonMaterial::new(LessonId::new(1))).unwrap();
    let other = service
        .create(LessonId::new(2), LessonMaterial::new(LessonId::new(2)))
        .unwrap();

    assert_eq!(other.version, 1);
}

/// Updates do not create revisions and do not change the version.
#[test]
fn test_update_is_not_a_revision() {
    let service = service_over(LocalDocumentStore::in_memory());
    let lesson = LessonId::new(7);
    let stored = service.create(lesson, LessonMaterial::new(lesson)).unwrap();

    let patch = lessonpack::LessonMaterialPatch {
        avatar_id: Some(9),
        ..Default::default()
    };
    let merged = service.update(stored.id, lesson, &patch).unwrap();
    assert_eq!(merged.version, 1);

    let next = service.create(lesson, LessonMaterial::new(lesson)).unwrap();
    assert_eq!(next.version, 2);
}

/// The resolver counts through the caller's transaction.
#[test]
fn test_resolver_inside_transaction() {
    let store = LocalDocumentStore::in_memory();
    let service = service_over(store);
    let lesson = LessonId::new(7);
    service.create(lesson, LessonMaterial::new(lesson)).unwrap();
    service.create(lesson, LessonMaterial::new(lesson)).unwrap();

    let next = service
        .documents()
        .run_in_transaction(|tx| RevisionResolver::new_revision_version(tx, lesson))
        .unwrap();
    assert_eq!(next, 3);
}

// =============================================================================
// Concurrent Creates
// =============================================================================

/// Two concurrent creates: one gets version 1, the other version 2.
#[test]
fn test_two_concurrent_creates() {
    let service = Arc::new(service_over(LocalDocumentStore::in_memory()));
    let lesson = LessonId::new(9);
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                create_with_retry(&service, lesson).0.version
            })
        })
        .collect();

    let versions: BTreeSet<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(versions, BTreeSet::from([1, 2]));
}

/// Many concurrent creates get exactly the versions 1..=N.
#[test]
fn test_many_concurrent_creates_unique_versions() {
    const WRITERS: usize = 8;
    let service = Arc::new(service_over(LocalDocumentStore::in_memory()));
    let lesson = LessonId::new(9);
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                create_with_retry(&service, lesson).0.version
            })
        })
        .collect();

    let versions: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let unique: BTreeSet<u32> = versions.iter().copied().collect();
    assert_eq!(unique.len(), WRITERS);
    assert_eq!(unique, (1..=WRITERS as u32).collect::<BTreeSet<u32>>());
}

// =============================================================================
// Durability
// =============================================================================

/// Versions continue from the persisted count after reopening.
#[test]
fn test_versions_continue_after_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("documents.json");
    let lesson = LessonId::new(7);

    {
        let service = service_over(LocalDocumentStore::open(&path).unwrap());
        service.create(lesson, LessonMaterial::new(lesson)).unwrap();
        service.create(lesson, LessonMaterial::new(lesson)).unwrap();
    }

    let service = service_over(LocalDocumentStore::open(&path).unwrap());
    let third = service.create(lesson, LessonMaterial::new(lesson)).unwrap();
    assert_eq!(third.version, 3);
}

/// A lesson with no revisions reports NotFound.
#[test]
fn test_current_of_empty_lesson() {
    let service = service_over(LocalDocumentStore::in_memory());
    let err = service.current(LessonId::new(404)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!err.is_retryable());
}
