//! # In-Memory Blob Store
//!
//! Keeps objects in process memory and records every write. Used by tests
//! and by callers that stage media before handing it to a real store.
//! Individual paths can be made to fail, and reads can be slowed down, to
//! exercise abort, timeout and cancellation handling.

use async_trait::async_trait;
use chrono::Duration;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use super::backend::BlobStore;
use super::errors::{BlobError, BlobResult};
use super::signed_url::{SignedUrl, SignedUrlGenerator, UrlMethod};

#[derive(Debug, Clone)]
struct StoredBlob {
    content_type: String,
    data: Vec<u8>,
}

/// One recorded `put_object` call, successful or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRecord {
    pub bucket: String,
    pub path: String,
    pub content_type: String,
    pub size: usize,
}

/// In-memory blob store
#[derive(Debug)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<(String, String), StoredBlob>>,
    puts: RwLock<Vec<PutRecord>>,
    failing_gets: RwLock<HashSet<String>>,
    failing_puts: RwLock<HashSet<String>>,
    get_delay: RwLock<Option<std::time::Duration>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    signer: SignedUrlGenerator,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            puts: RwLock::new(Vec::new()),
            failing_gets: RwLock::new(HashSet::new()),
            failing_puts: RwLock::new(HashSet::new()),
            get_delay: RwLock::new(None),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            signer: SignedUrlGenerator::new(b"memory-blob-store"),
        }
    }

    /// Seed an object without recording a put
    pub fn insert(&self, bucket: &str, path: &str, content_type: &str, data: &[u8]) {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(
                (bucket.to_string(), path.to_string()),
                StoredBlob {
                    content_type: content_type.to_string(),
                    data: data.to_vec(),
                },
            );
        }
    }

    pub fn object(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        let objects = self.objects.read().ok()?;
        objects
            .get(&(bucket.to_string(), path.to_string()))
            .map(|blob| blob.data.clone())
    }

    pub fn content_type(&self, bucket: &str, path: &str) -> Option<String> {
        let objects = self.objects.read().ok()?;
        objects
            .get(&(bucket.to_string(), path.to_string()))
            .map(|blob| blob.content_type.clone())
    }

    /// Every `put_object` call so far, in call order
    pub fn puts(&self) -> Vec<PutRecord> {
        self.puts.read().map(|puts| puts.clone()).unwrap_or_default()
    }

    /// `put_object` calls that targeted `path`
    pub fn puts_to(&self, path: &str) -> usize {
        self.puts().iter().filter(|put| put.path == path).count()
    }

    /// Make reads of `path` fail with `Unavailable`
    pub fn fail_get(&self, path: &str) {
        if let Ok(mut failing) = self.failing_gets.write() {
            failing.insert(path.to_string());
        }
    }

    /// Make writes to `path` fail with `Unavailable`
    pub fn fail_put(&self, path: &str) {
        if let Ok(mut failing) = self.failing_puts.write() {
            failing.insert(path.to_string());
        }
    }

    /// Let writes to `path` succeed again
    pub fn heal_put(&self, path: &str) {
        if let Ok(mut failing) = self.failing_puts.write() {
            failing.remove(path);
        }
    }

    /// Delay every read by `delay`
    pub fn set_get_delay(&self, delay: std::time::Duration) {
        if let Ok(mut slot) = self.get_delay.write() {
            *slot = Some(delay);
        }
    }

    /// Highest number of reads that were in progress at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Reads currently in progress
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn is_failing(set: &RwLock<HashSet<String>>, path: &str) -> bool {
        set.read().map(|failing| failing.contains(path)).unwrap_or(false)
    }
}

/// Keeps the in-flight count right even when a read is dropped mid-way
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get_object(&self, bucket: &str, path: &str) -> BlobResult<Vec<u8>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.get_delay.read().ok().and_then(|slot| *slot);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if Self::is_failing(&self.failing_gets, path) {
            return Err(BlobError::Unavailable(format!("{}/{}", bucket, path)));
        }

        self.object(bucket, path)
            .ok_or_else(|| BlobError::ObjectNotFound(format!("{}/{}", bucket, path)))
    }

    async fn put_object(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        data: &[u8],
    ) -> BlobResult<()> {
        if let Ok(mut puts) = self.puts.write() {
            puts.push(PutRecord {
                bucket: bucket.to_string(),
                path: path.to_string(),
                content_type: content_type.to_string(),
                size: data.len(),
            });
        }

        if Self::is_failing(&self.failing_puts, path) {
            return Err(BlobError::Unavailable(format!("{}/{}", bucket, path)));
        }

        self.insert(bucket, path, content_type, data);
        Ok(())
    }

    fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        method: UrlMethod,
        content_type: &str,
        ttl: Duration,
    ) -> BlobResult<SignedUrl> {
        Ok(self.signer.generate(bucket, path, method, content_type, ttl))
    }
}
