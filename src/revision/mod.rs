//! # Revision Resolution
//!
//! Determines the current revision of a lesson and the version the next
//! revision must carry. Both are computed from the full ancestor-scoped
//! result set, never from a single row, and always through a caller's
//! open transaction so that counting and writing share one conflict scope.
//!
//! The next version is one past both the revision count and the highest
//! stored version, so a removed revision never frees its version.

mod resolver;

pub use resolver::{CurrentRevision, RevisionResolver};
