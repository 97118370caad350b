//! # Blob Store Trait

use async_trait::async_trait;
use chrono::Duration;

use super::errors::BlobResult;
use super::signed_url::{SignedUrl, UrlMethod};

/// Backend trait for blob storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a whole object
    async fn get_object(&self, bucket: &str, path: &str) -> BlobResult<Vec<u8>>;

    /// Write a whole object atomically, replacing any previous content
    async fn put_object(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        data: &[u8],
    ) -> BlobResult<()>;

    /// Issue a time-limited URL granting `method` access to one object
    fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        method: UrlMethod,
        content_type: &str,
        ttl: Duration,
    ) -> BlobResult<SignedUrl>;
}
