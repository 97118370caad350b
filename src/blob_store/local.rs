//! # Local Filesystem Blob Store
//!
//! Objects live at `<root>/<bucket>/<path>`. Content types are accepted but
//! not recorded.

use async_trait::async_trait;
use chrono::Duration;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::backend::BlobStore;
use super::errors::{BlobError, BlobResult};
use super::signed_url::{SignedUrl, SignedUrlGenerator, UrlMethod};

/// Local filesystem blob store
#[derive(Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
    signer: SignedUrlGenerator,
}

impl LocalBlobStore {
    /// Create a new local store rooted at `root`
    pub fn new(root: PathBuf, signing_secret: &[u8]) -> Self {
        Self {
            root,
            signer: SignedUrlGenerator::new(signing_secret),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map `(bucket, path)` to a file under the root, rejecting anything
    /// that could escape it.
    fn object_path(&self, bucket: &str, path: &str) -> BlobResult<PathBuf> {
        let invalid = || BlobError::InvalidPath(format!("{}/{}", bucket, path));

        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            return Err(invalid());
        }
        if path.is_empty() || path.contains('\\') {
            return Err(invalid());
        }
        let relative = Path::new(path);
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(invalid());
        }

        Ok(self.root.join(bucket).join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn get_object(&self, bucket: &str, path: &str) -> BlobResult<Vec<u8>> {
        let full_path = self.object_path(bucket, path)?;

        fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BlobError::ObjectNotFound(format!("{}/{}", bucket, path))
            } else {
                BlobError::IoError(e.to_string())
            }
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        path: &str,
        _content_type: &str,
        data: &[u8],
    ) -> BlobResult<()> {
        let full_path = self.object_path(bucket, path)?;
        let (parent, file_name) = match (full_path.parent(), full_path.file_name()) {
            (Some(parent), Some(name)) => {
                (parent.to_path_buf(), name.to_string_lossy().into_owned())
            }
            _ => return Err(BlobError::InvalidPath(format!("{}/{}", bucket, path))),
        };

        fs::create_dir_all(&parent)
            .await
            .map_err(|e| BlobError::IoError(e.to_string()))?;

        // Write beside the target, then rename over it
        let temp_path = parent.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));
        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &full_path).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(BlobError::IoError(e.to_string()));
        }

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
        self.object_path(bucket, path)?;
        Ok(self.signer.generate(bucket, path, method, content_type, ttl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_store() -> (LocalBlobStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp.path().to_path_buf(), b"secret");
        (store, temp)
    }

    #[tokio::test]
    async fn test_write_read() {
        let (store, _temp) = create_store();

        store
            .put_object("material", "graphic/101.png", "image/png", b"png")
            .await
            .unwrap();
        let data = store.get_object("material", "graphic/101.png").await.unwrap();
        assert_eq!(data, b"png");
    }

    #[tokio::test]
    async fn test_overwrite_replaces_content() {
        let (store, _temp) = create_store();

        store.put_object("material", "lesson/3.zip", "application/zip", b"old").await.unwrap();
        store.put_object("material", "lesson/3.zip", "application/zip", b"new").await.unwrap();

        let data = store.get_object("material", "lesson/3.zip").await.unwrap();
        assert_eq!(data, b"new");
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let (store, temp) = create_store();

        store.put_object("material", "lesson/3.zip", "application/zip", b"zip").await.unwrap();

        let names: Vec<String> = std::fs::read_dir(temp.path().join("material/lesson"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["3.zip".to_string()]);
    }

    #[tokio::test]
    async fn test_not_found() {
        let (store, _temp) = create_store();

        let result = store.get_object("material", "graphic/404.png").await;
        assert!(matches!(result, Err(BlobError::ObjectNotFound(_))));
    }

    #[tokio::test]
    async fn test_escaping_paths_rejected() {
        let (store, _temp) = create_store();

        for path in ["../outside", "/etc/passwd", "a/../../b", ""] {
            let result = store.put_object("material", path, "text/plain", b"x").await;
            assert!(matches!(result, Err(BlobError::InvalidPath(_))), "{}", path);
        }
        let result = store.get_object("..", "file").await;
        assert!(matches!(result, Err(BlobError::InvalidPath(_))));
    }

    #[test]
    fn test_signed_url_verifies() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp.path().to_path_buf(), b"secret");

        let signed = store
            .signed_url(
                "material",
                "graphic/1.png",
                UrlMethod::Put,
                "image/png",
                Duration::minutes(5),
            )
            .unwrap();
        assert!(SignedUrlGenerator::new(b"secret").verify(&signed).is_ok());
    }
}
