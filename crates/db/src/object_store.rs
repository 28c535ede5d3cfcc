//! Object storage for photos, logos and course videos.
//!
//! [`ObjectStore`] is the contract the upload handlers use; the
//! [`LocalObjectStore`] adapter writes under a directory that the API server
//! also serves statically.

use std::path::PathBuf;

use async_trait::async_trait;
use atelier_core::storage::validate_object_path;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::store::StoreError;

/// Bytes written per chunk (and per progress callback).
const CHUNK_SIZE: usize = 64 * 1024;

/// Progress report for an in-flight upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UploadProgress {
    pub bytes_written: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Completion percentage in `[0, 100]`.
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        self.bytes_written as f64 * 100.0 / self.total_bytes as f64
    }
}

/// Callback invoked after each chunk is persisted.
pub type ProgressFn<'a> = &'a (dyn Fn(UploadProgress) + Send + Sync);

/// Blob storage returning a stable URL per stored object.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` at `path`, replacing any existing object, and return its
    /// public URL.
    async fn upload(
        &self,
        path: &str,
        data: &[u8],
        progress: ProgressFn<'_>,
    ) -> Result<String, StoreError>;

    /// Remove the object at `path`. Returns `false` if nothing was there.
    async fn delete(&self, path: &str) -> Result<bool, StoreError>;

    /// Public URL of the object at `path`.
    fn url_for(&self, path: &str) -> String;
}

/// Filesystem-backed object store.
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    /// `root` is the directory objects are written under; `public_base_url`
    /// is the URL prefix they are served from (e.g. `/uploads`).
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        validate_object_path(path).map_err(|e| StoreError::InvalidPath(e.to_string()))?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(
        &self,
        path: &str,
        data: &[u8],
        progress: ProgressFn<'_>,
    ) -> Result<String, StoreError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let total_bytes = data.len() as u64;
        let mut file = tokio::fs::File::create(&target).await?;
        let mut bytes_written = 0u64;
        for chunk in data.chunks(CHUNK_SIZE) {
            file.write_all(chunk).await?;
            bytes_written += chunk.len() as u64;
            progress(UploadProgress {
                bytes_written,
                total_bytes,
            });
        }
        file.flush().await?;

        tracing::debug!(path, bytes = total_bytes, "Object stored");
        Ok(self.url_for(path))
    }

    async fn delete(&self, path: &str) -> Result<bool, StoreError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{path}", self.public_base_url)
    }
}
