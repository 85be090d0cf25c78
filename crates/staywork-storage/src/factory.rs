use std::sync::Arc;

use staywork_core::{StorageBackend, StorageConfig};

use crate::{LocalStorage, ObjectStorage, S3Storage, StorageError, StorageResult};

/// Create a storage backend based on configuration
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStorage>> {
    match config.backend {
        StorageBackend::S3 => {
            let region = config
                .s3_region
                .clone()
                .ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
                })?;

            let storage = S3Storage::new(
                config.public_bucket.clone(),
                config.private_bucket.clone(),
                region,
                config.s3_endpoint.clone(),
                config.cdn_endpoint.clone(),
            )
            .await?;
            Ok(Arc::new(storage))
        }

        StorageBackend::Local => {
            let base_path = config.local_root.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.local_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;

            let storage = LocalStorage::new(
                base_path,
                base_url,
                config.public_bucket.clone(),
                config.private_bucket.clone(),
            )
            .await?;
            Ok(Arc::new(storage))
        }
    }
}
