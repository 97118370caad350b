//! # Lesson Material Transactions
//!
//! `LessonMaterialService` is the entry point for creating, updating,
//! reading and exporting lesson material. It is built once with its
//! document store, blob store and configuration and shares nothing else.
//!
//! Create and update each run as one serializable transaction. The version
//! of a new revision is counted inside the same transaction that writes
//! it, so two creates racing on one lesson cannot both commit with the same
//! version; the loser gets `TransactionConflict` and may re-run.
//!
//! The service never re-runs application logic on its own. Only a store
//! that reports itself unavailable before doing any work is retried, with
//! bounded doubling backoff.

mod retry;
mod service;

pub use service::LessonMaterialService;
