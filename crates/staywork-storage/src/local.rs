use std::path::{Path, PathBuf};

use async_trait::async_trait;
use staywork_core::StorageBackend;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::traits::{Bucket, ObjectStorage, StorageError, StorageResult};

/// Local filesystem storage implementation. Each logical bucket maps to a
/// subdirectory of the base path, named after the configured bucket.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    public_bucket: String,
    private_bucket: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, ensuring both bucket directories
    /// exist.
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        public_bucket: String,
        private_bucket: String,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        for bucket in [&public_bucket, &private_bucket] {
            let dir = base_path.join(bucket);
            fs::create_dir_all(&dir).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create bucket directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(LocalStorage {
            base_path,
            base_url,
            public_bucket,
            private_bucket,
        })
    }

    fn bucket_name(&self, bucket: Bucket) -> &str {
        match bucket {
            Bucket::Public => &self.public_bucket,
            Bucket::Private => &self.private_bucket,
        }
    }

    /// Convert a bucket and key to a filesystem path with security validation.
    /// Keys containing traversal sequences are rejected before touching the
    /// filesystem.
    fn key_to_path(&self, bucket: Bucket, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }
        Ok(self.base_path.join(self.bucket_name(bucket)).join(key))
    }

    async fn ensure_parent_dir(path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn put(
        &self,
        bucket: Bucket,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<()> {
        let path = self.key_to_path(bucket, key)?;
        let size = data.len();

        Self::ensure_parent_dir(&path).await?;

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            "Local storage put successful"
        );

        Ok(())
    }

    async fn get(&self, bucket: Bucket, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(bucket, key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            bucket = %bucket,
            key = %key,
            size_bytes = data.len(),
            "Local storage get successful"
        );

        Ok(data)
    }

    async fn copy(
        &self,
        src_bucket: Bucket,
        src_key: &str,
        dst_bucket: Bucket,
        dst_key: &str,
    ) -> StorageResult<()> {
        let from_path = self.key_to_path(src_bucket, src_key)?;
        let to_path = self.key_to_path(dst_bucket, dst_key)?;

        if !fs::try_exists(&from_path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(src_key.to_string()));
        }

        Self::ensure_parent_dir(&to_path).await?;

        fs::copy(&from_path, &to_path).await.map_err(|e| {
            StorageError::CopyFailed(format!(
                "Failed to copy {} to {}: {}",
                from_path.display(),
                to_path.display(),
                e
            ))
        })?;

        tracing::info!(
            src_bucket = %src_bucket,
            src_key = %src_key,
            dst_bucket = %dst_bucket,
            dst_key = %dst_key,
            "Local storage copy successful"
        );

        Ok(())
    }

    async fn delete(&self, bucket: Bucket, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(bucket, key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(bucket = %bucket, key = %key, "Local storage delete successful");

        Ok(())
    }

    async fn exists(&self, bucket: Bucket, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(bucket, key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.public_bucket,
            key
        )
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
