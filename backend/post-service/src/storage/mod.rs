/// Blob storage for post images
///
/// Images are addressed by key (`posts/<name>`). Three backends implement
/// [`BlobStore`]: the local public disk, S3-compatible object storage, and an
/// in-memory map for tests.
pub mod local;
pub mod memory;
pub mod s3;

pub use local::LocalBlobStore;
pub use memory::InMemoryBlobStore;
pub use s3::S3BlobStore;

use crate::config::{StorageConfig, StorageDriver};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Namespace that post images are stored under
pub const POSTS_DIR: &str = "posts";

/// Storage of raw file bytes addressed by key
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<()>;

    /// `None` when nothing is stored under `key`
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Removing a missing key succeeds
    async fn delete(&self, key: &str) -> Result<()>;

    async fn health_check(&self) -> Result<()>;
}

/// Key of a post image inside the blob store
pub fn post_image_key(name: &str) -> String {
    format!("{}/{}", POSTS_DIR, name)
}

/// Stored names consist of ASCII alphanumerics and dots, never `..`
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
}

/// Content type for a stored name, from its extension
pub fn content_type_for(name: &str) -> mime::Mime {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpeg" | "jpg" => mime::IMAGE_JPEG,
        "png" => mime::IMAGE_PNG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "svg" => mime::IMAGE_SVG,
        "webp" => "image/webp"
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// Build the blob store selected by configuration
pub async fn build_blob_store(cfg: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match cfg.driver {
        StorageDriver::Local => {
            let store = LocalBlobStore::new(cfg.local_root.clone());
            store.initialize().await?;
            Arc::new(store)
        }
        StorageDriver::S3 => {
            let s3_cfg = cfg.s3.as_ref().ok_or_else(|| {
                AppError::Internal("S3 storage selected without S3 configuration".to_string())
            })?;
            Arc::new(S3BlobStore::from_config(s3_cfg).await)
        }
        StorageDriver::Memory => Arc::new(InMemoryBlobStore::new()),
    };

    tracing::info!(driver = ?cfg.driver, "Blob store initialized");
    Ok(store)
}
