//! Image moderation orchestration
//!
//! Uploads always land in the private bucket first; the classifier verdict
//! decides where the object ends up. Relocation across the APPROVED boundary
//! is copy-then-delete: the copy must succeed before the database row changes,
//! and a failed cleanup after a committed status change is logged for
//! reconciliation rather than unwound.

use std::sync::Arc;

use chrono::Utc;
use staywork_core::models::{Image, ImageStatus};
use staywork_core::{decide_image_status, AppError, AppResult, RejectThresholds};
use staywork_db::ImageStore;
use staywork_storage::{Bucket, ObjectStorage};
use uuid::Uuid;

use crate::classifier::SafeSearchClassifier;

fn bucket_for(status: ImageStatus) -> Bucket {
    if status.is_public() {
        Bucket::Public
    } else {
        Bucket::Private
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

#[derive(Clone)]
pub struct ImageService {
    images: Arc<dyn ImageStore>,
    storage: Arc<dyn ObjectStorage>,
    classifier: Arc<dyn SafeSearchClassifier>,
    thresholds: RejectThresholds,
}

impl ImageService {
    pub fn new(
        images: Arc<dyn ImageStore>,
        storage: Arc<dyn ObjectStorage>,
        classifier: Arc<dyn SafeSearchClassifier>,
        thresholds: RejectThresholds,
    ) -> Self {
        Self {
            images,
            storage,
            classifier,
            thresholds,
        }
    }

    /// Upload and classify an image.
    ///
    /// A classifier failure is not an upload failure: the image stays PENDING
    /// in the private bucket awaiting manual review.
    #[tracing::instrument(skip(self, data), fields(user_id = %user_id, size_bytes = data.len()))]
    pub async fn upload(
        &self,
        user_id: Uuid,
        data: Vec<u8>,
        content_type: &str,
    ) -> AppResult<Image> {
        if data.is_empty() {
            return Err(AppError::Validation("image data is empty".to_string()));
        }

        let id = Uuid::new_v4();
        let storage_key = format!("{}/{}.{}", user_id, id, extension_for(content_type));

        self.storage
            .put(Bucket::Private, &storage_key, data.clone(), content_type)
            .await?;

        let safe_search = match self.classifier.classify(&data).await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    image_id = %id,
                    "Classifier unavailable, image held as PENDING"
                );
                None
            }
        };

        let mut status = decide_image_status(safe_search.as_ref(), &self.thresholds);
        let mut public_url = None;

        if status == ImageStatus::Approved {
            match self.move_object(&storage_key, Bucket::Private, Bucket::Public).await {
                Ok(()) => public_url = Some(self.storage.public_url(&storage_key)),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        image_id = %id,
                        "Failed to publish approved image, degrading to PENDING"
                    );
                    status = ImageStatus::Pending;
                }
            }
        }

        let now = Utc::now();
        let image = Image {
            id,
            user_id,
            storage_key,
            public_url,
            status,
            safe_search,
            created_at: now,
            updated_at: now,
        };
        self.images.insert(&image).await?;

        tracing::info!(image_id = %id, status = %image.status, "Image uploaded");
        Ok(image)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Image> {
        self.images.get(id).await
    }

    /// Fetch the raw bytes from whichever bucket the current status implies.
    pub async fn content(&self, id: Uuid) -> AppResult<Vec<u8>> {
        let image = self.images.get(id).await?;
        let data = self
            .storage
            .get(bucket_for(image.status), &image.storage_key)
            .await?;
        Ok(data)
    }

    /// Change an image's status, relocating the backing object when the
    /// change crosses the APPROVED boundary.
    ///
    /// Unchanged status is a strict no-op: no bucket operation, no timestamp
    /// update. A failed copy aborts before any database write. If the copy
    /// succeeds but persisting fails, the object is intentionally left in
    /// both buckets and a reconciliation record is logged.
    #[tracing::instrument(skip(self), fields(image_id = %id, new_status = %new_status))]
    pub async fn update_status(&self, id: Uuid, new_status: ImageStatus) -> AppResult<Image> {
        let image = self.images.get(id).await?;

        if image.status == new_status {
            return Ok(image);
        }

        let src = bucket_for(image.status);
        let dst = bucket_for(new_status);

        if src != dst {
            self.storage
                .copy(src, &image.storage_key, dst, &image.storage_key)
                .await?;
        }

        let public_url = new_status
            .is_public()
            .then(|| self.storage.public_url(&image.storage_key));

        if let Err(e) = self
            .images
            .update_status(id, new_status, public_url.as_deref())
            .await
        {
            if src != dst {
                tracing::error!(
                    image_id = %id,
                    storage_key = %image.storage_key,
                    src_bucket = %src,
                    dst_bucket = %dst,
                    error = %e,
                    "RECONCILE: status persist failed after copy, object present in both buckets"
                );
            }
            return Err(e);
        }

        if src != dst {
            if let Err(e) = self.storage.delete(src, &image.storage_key).await {
                tracing::error!(
                    image_id = %id,
                    storage_key = %image.storage_key,
                    src_bucket = %src,
                    error = %e,
                    "RECONCILE: source cleanup failed after relocation"
                );
            }
        }

        self.images.get(id).await
    }

    async fn move_object(&self, key: &str, src: Bucket, dst: Bucket) -> AppResult<()> {
        self.storage.copy(src, key, dst, key).await?;
        if let Err(e) = self.storage.delete(src, key).await {
            tracing::error!(
                storage_key = %key,
                src_bucket = %src,
                error = %e,
                "RECONCILE: source cleanup failed after relocation"
            );
        }
        Ok(())
    }
}
