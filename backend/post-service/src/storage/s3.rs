/// S3 blob store for post images
///
/// Works against AWS S3 or any S3-compatible endpoint (MinIO, LocalStack) when
/// `S3_ENDPOINT_URL` is set.
use super::BlobStore;
use crate::config::S3Config;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the default AWS credential chain plus `cfg`
    pub async fn from_config(cfg: &S3Config) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &cfg.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        tracing::info!(bucket = %cfg.bucket, region = %cfg.region, "S3 blob store configured");
        Self::new(Client::from_conf(builder.build()), cfg.bucket.clone())
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<()> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 put {} failed: {}", key, e)))?;

        tracing::debug!(blob = %key, size, "Uploaded blob to S3");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Ok(None)
            }
            Err(e) => {
                return Err(AppError::Storage(format!("S3 get {} failed: {}", key, e)));
            }
        };

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("S3 read {} failed: {}", key, e)))?;

        Ok(Some(body.into_bytes()))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(AppError::Storage(format!("S3 head {} failed: {}", key, e))),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        // DeleteObject succeeds for keys that do not exist
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 delete {} failed: {}", key, e)))?;

        tracing::debug!(blob = %key, "Deleted blob from S3");
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 bucket {} unreachable: {}", self.bucket, e)))?;

        Ok(())
    }
}
