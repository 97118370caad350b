//! # Blob Store
//!
//! Byte storage addressed by `(bucket, path)`, used for lesson media and
//! published lesson archives.
//!
//! `put_object` is atomic: a reader sees either the previous object or the
//! complete new one, never a prefix.

pub mod errors;
pub mod backend;
pub mod local;
pub mod memory;
pub mod signed_url;

pub use errors::{BlobError, BlobResult};
pub use backend::BlobStore;
pub use local::LocalBlobStore;
pub use memory::{MemoryBlobStore, PutRecord};
pub use signed_url::{SignedUrl, SignedUrlGenerator, UrlMethod};
