use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use staywork_core::StorageBackend;

use crate::traits::{Bucket, ObjectStorage, StorageError, StorageResult};

/// S3 storage implementation
///
/// Works against AWS S3 or any S3-compatible provider (MinIO, DigitalOcean
/// Spaces) via a custom endpoint. Cross-bucket copies use server-side
/// CopyObject so image bytes never transit the application.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    public_bucket: String,
    private_bucket: String,
    region: String,
    endpoint_url: Option<String>,
    cdn_endpoint: Option<String>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `public_bucket` / `private_bucket` - bucket names for the two
    ///   visibility tiers
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible
    ///   providers (e.g., "http://localhost:9000" for MinIO)
    /// * `cdn_endpoint` - Optional CDN base URL for public delivery
    pub async fn new(
        public_bucket: String,
        private_bucket: String,
        region: String,
        endpoint_url: Option<String>,
        cdn_endpoint: Option<String>,
    ) -> StorageResult<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()));

        if let Some(ref endpoint) = endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if endpoint_url.is_some() {
            // S3-compatible providers typically only support path-style.
            builder = builder.force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        Ok(S3Storage {
            client,
            public_bucket,
            private_bucket,
            region,
            endpoint_url,
            cdn_endpoint,
        })
    }

    fn bucket_name(&self, bucket: Bucket) -> &str {
        match bucket {
            Bucket::Public => &self.public_bucket,
            Bucket::Private => &self.private_bucket,
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put(
        &self,
        bucket: Bucket,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        let bucket_name = self.bucket_name(bucket);
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        self.client
            .put_object()
            .bucket(bucket_name)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket_name,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 put failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %bucket_name,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 put successful"
        );

        Ok(())
    }

    async fn get(&self, bucket: Bucket, key: &str) -> StorageResult<Vec<u8>> {
        let bucket_name = self.bucket_name(bucket);
        let start = std::time::Instant::now();

        let output = self
            .client
            .get_object()
            .bucket(bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    StorageError::NotFound(key.to_string())
                } else {
                    tracing::error!(
                        error = %service_err,
                        bucket = %bucket_name,
                        key = %key,
                        "S3 get failed"
                    );
                    StorageError::DownloadFailed(service_err.to_string())
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?
            .into_bytes();

        tracing::info!(
            bucket = %bucket_name,
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 get successful"
        );

        Ok(data.to_vec())
    }

    async fn copy(
        &self,
        src_bucket: Bucket,
        src_key: &str,
        dst_bucket: Bucket,
        dst_key: &str,
    ) -> StorageResult<()> {
        let src_bucket_name = self.bucket_name(src_bucket);
        let dst_bucket_name = self.bucket_name(dst_bucket);
        let start = std::time::Instant::now();

        // CopyObject takes "{source-bucket}/{source-key}".
        let copy_source = format!("{}/{}", src_bucket_name, src_key);

        self.client
            .copy_object()
            .copy_source(&copy_source)
            .bucket(dst_bucket_name)
            .key(dst_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e.into_service_error(),
                    copy_source = %copy_source,
                    dst_bucket = %dst_bucket_name,
                    dst_key = %dst_key,
                    "S3 copy failed"
                );
                StorageError::CopyFailed(format!(
                    "Failed to copy {} to {}/{}",
                    copy_source, dst_bucket_name, dst_key
                ))
            })?;

        tracing::info!(
            src_bucket = %src_bucket_name,
            src_key = %src_key,
            dst_bucket = %dst_bucket_name,
            dst_key = %dst_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 copy successful"
        );

        Ok(())
    }

    async fn delete(&self, bucket: Bucket, key: &str) -> StorageResult<()> {
        let bucket_name = self.bucket_name(bucket);
        let start = std::time::Instant::now();

        // DeleteObject succeeds for missing keys, matching the trait contract.
        self.client
            .delete_object()
            .bucket(bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e.into_service_error(),
                    bucket = %bucket_name,
                    key = %key,
                    "S3 delete failed"
                );
                StorageError::DeleteFailed(key.to_string())
            })?;

        tracing::info!(
            bucket = %bucket_name,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, bucket: Bucket, key: &str) -> StorageResult<bool> {
        let bucket_name = self.bucket_name(bucket);

        match self
            .client
            .head_object()
            .bucket(bucket_name)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(StorageError::BackendError(service_err.to_string()))
                }
            }
        }
    }

    /// Public delivery URL for an object in the public bucket.
    ///
    /// Prefers the CDN endpoint when configured. For custom S3-compatible
    /// endpoints, uses path-style URLs; otherwise the standard AWS format.
    fn public_url(&self, key: &str) -> String {
        if let Some(ref cdn) = self.cdn_endpoint {
            return format!("{}/{}", cdn.trim_end_matches('/'), key);
        }
        if let Some(ref endpoint) = self.endpoint_url {
            return format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.public_bucket,
                key
            );
        }
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.public_bucket, self.region, key
        )
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
