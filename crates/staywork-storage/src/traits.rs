//! Storage abstraction trait
//!
//! This module defines the ObjectStorage trait that all storage backends must
//! implement.

use async_trait::async_trait;
use staywork_core::{AppError, StorageBackend};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Copy failed: {0}")]
    CopyFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err.to_string())
    }
}

/// Logical bucket an object lives in. The physical name comes from
/// configuration; the code only ever distinguishes public from private.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Public,
    Private,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Public => "public",
            Bucket::Private => "private",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket-addressed object storage.
///
/// All backends (S3, local filesystem) implement this trait so the image
/// service can relocate objects between the public and private buckets without
/// coupling to backend details.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store an object under `key` in the given bucket, overwriting any
    /// existing object.
    async fn put(
        &self,
        bucket: Bucket,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Fetch an object's bytes.
    async fn get(&self, bucket: Bucket, key: &str) -> StorageResult<Vec<u8>>;

    /// Copy an object, possibly across buckets. The source is left in place.
    async fn copy(
        &self,
        src_bucket: Bucket,
        src_key: &str,
        dst_bucket: Bucket,
        dst_key: &str,
    ) -> StorageResult<()>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, bucket: Bucket, key: &str) -> StorageResult<()>;

    /// Check whether an object exists.
    async fn exists(&self, bucket: Bucket, key: &str) -> StorageResult<bool>;

    /// Public delivery URL for an object in the public bucket.
    fn public_url(&self, key: &str) -> String;

    /// Which backend this is.
    fn backend(&self) -> StorageBackend;
}
