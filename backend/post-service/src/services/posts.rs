/// Post service - handles post listing, creation, lookup, update and deletion
///
/// Each operation validates the request, touches the record store and the
/// blob store, and hands a model back to the handler. There is no transaction
/// spanning the two stores: a failure between the blob write and the record
/// write leaves the blob behind, and that is logged with the blob name.
use crate::db::{PostRepository, PER_PAGE};
use crate::error::{AppError, Result};
use crate::metrics::{record_blob_operation, record_post_operation};
use crate::models::{NewPost, Page, Post, PostChanges, PostForm, PostTitle, UploadedFile};
use crate::storage::{content_type_for, post_image_key, BlobStore};
use crate::validation::{validate_create, validate_update, ImageKind};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;

/// Length of the random part of a stored image name
pub const IMAGE_NAME_LENGTH: usize = 40;

pub const MSG_POST_NOT_FOUND: &str = "Error: Data tidak ditemukan.";
pub const MSG_UNKNOWN_ID: &str = "ID tidak ditemukan";
pub const MSG_DELETE_NOT_FOUND: &str = "Post not found";

/// Random 40-character alphanumeric name with the given extension
pub fn generate_image_name(extension: &str) -> String {
    let stem: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(IMAGE_NAME_LENGTH)
        .map(char::from)
        .collect();
    format!("{}.{}", stem, extension)
}

/// Extension for an update image, which skips the image rules
fn update_extension(file: &UploadedFile) -> String {
    ImageKind::sniff(&file.bytes)
        .map(|kind| kind.extension().to_string())
        .or_else(|| file.client_extension())
        .unwrap_or_else(|| "bin".to_string())
}

fn outcome<T>(result: &Result<T>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(AppError::Validation(_)) => "invalid",
        Err(AppError::NotFound(_)) | Err(AppError::UnknownId(_)) => "not_found",
        Err(_) => "error",
    }
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    blobs: Arc<dyn BlobStore>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { posts, blobs }
    }

    /// Newest-first page of posts; pages below 1 are treated as page 1
    pub async fn list(&self, page: u64) -> Result<Page<Post>> {
        let result = self.posts.paginate(page.max(1), PER_PAGE).await;
        record_post_operation("list", outcome(&result));
        result
    }

    /// Validate, store the image, then insert the record
    pub async fn create(&self, form: PostForm) -> Result<Post> {
        let result = self.create_inner(form).await;
        record_post_operation("create", outcome(&result));
        result
    }

    async fn create_inner(&self, form: PostForm) -> Result<Post> {
        validate_create(&form)?;

        let PostForm {
            title,
            content,
            image,
        } = form;
        let image = image.ok_or_else(|| AppError::Internal("validated image missing".into()))?;
        let extension = ImageKind::sniff(&image.bytes)
            .map(ImageKind::extension)
            .unwrap_or("bin");

        let name = generate_image_name(extension);
        self.put_image(&name, image).await?;

        let new_post = NewPost {
            image: name.clone(),
            title: title.unwrap_or_default(),
            content: content.unwrap_or_default(),
        };

        match self.posts.create(new_post).await {
            Ok(post) => {
                tracing::info!(post_id = post.id, image = %post.image, "Post created");
                Ok(post)
            }
            Err(err) => {
                tracing::warn!(
                    blob = %post_image_key(&name),
                    error = %err,
                    "Post insert failed after image upload; blob left orphaned"
                );
                Err(err)
            }
        }
    }

    /// Title of a post
    pub async fn get(&self, id: i64) -> Result<PostTitle> {
        let result = match self.posts.find_title(id).await {
            Ok(Some(title)) => Ok(title),
            Ok(None) => Err(AppError::NotFound(MSG_POST_NOT_FOUND.to_string())),
            Err(err) => Err(err),
        };
        record_post_operation("show", outcome(&result));
        result
    }

    /// Replace title/content and optionally the image of an existing post
    pub async fn update(&self, id: i64, form: PostForm) -> Result<Post> {
        let current = self.find_for_update(id).await?;
        self.apply_update(current, form).await
    }

    /// Resolve a post for update; unknown ids map to "ID tidak ditemukan"
    pub async fn find_for_update(&self, id: i64) -> Result<Post> {
        let result = match self.posts.find(id).await {
            Ok(Some(post)) => Ok(post),
            Ok(None) => Err(AppError::UnknownId(MSG_UNKNOWN_ID.to_string())),
            Err(err) => Err(err),
        };
        if result.is_err() {
            record_post_operation("update", outcome(&result));
        }
        result
    }

    /// Validate and write an update to a post already resolved by
    /// [`PostService::find_for_update`]
    pub async fn apply_update(&self, current: Post, form: PostForm) -> Result<Post> {
        let result = self.update_inner(current, form).await;
        record_post_operation("update", outcome(&result));
        result
    }

    async fn update_inner(&self, current: Post, form: PostForm) -> Result<Post> {
        let id = current.id;
        validate_update(&form)?;

        let PostForm {
            title,
            content,
            image,
        } = form;

        let new_image = match image {
            Some(file) => {
                let name = generate_image_name(&update_extension(&file));
                self.put_image(&name, file).await?;
                self.remove_image(&current.image).await;
                Some(name)
            }
            None => None,
        };

        let changes = PostChanges {
            image: new_image.clone(),
            title: title.unwrap_or_default(),
            content: content.unwrap_or_default(),
        };

        match self.posts.update(id, changes).await {
            Ok(Some(post)) => {
                tracing::info!(post_id = id, image = %post.image, "Post updated");
                Ok(post)
            }
            Ok(None) => {
                if let Some(name) = &new_image {
                    tracing::warn!(
                        post_id = id,
                        blob = %post_image_key(name),
                        "Post vanished during update; new image left orphaned"
                    );
                }
                Err(AppError::UnknownId(MSG_UNKNOWN_ID.to_string()))
            }
            Err(err) => {
                if let Some(name) = &new_image {
                    tracing::warn!(
                        post_id = id,
                        blob = %post_image_key(name),
                        dangling = %post_image_key(&current.image),
                        error = %err,
                        "Post update failed after image replacement"
                    );
                }
                Err(err)
            }
        }
    }

    /// Resolve a post for deletion; unknown ids map to "Post not found"
    pub async fn find_for_delete(&self, id: i64) -> Result<Post> {
        self.posts
            .find(id)
            .await?
            .ok_or_else(|| AppError::UnknownId(MSG_DELETE_NOT_FOUND.to_string()))
    }

    /// Delete the post's image (best-effort) and then its record
    pub async fn delete(&self, post: &Post) -> Result<()> {
        self.remove_image(&post.image).await;

        let result = match self.posts.delete(post.id).await {
            Ok(true) => {
                tracing::info!(post_id = post.id, "Post deleted");
                Ok(())
            }
            Ok(false) => {
                tracing::debug!(post_id = post.id, "Post already deleted");
                Ok(())
            }
            Err(err) => Err(err),
        };
        record_post_operation("delete", outcome(&result));
        result
    }

    /// Bytes of a stored post image
    pub async fn image(&self, name: &str) -> Result<Option<bytes::Bytes>> {
        self.blobs.get(&post_image_key(name)).await
    }

    /// Probe both stores
    pub async fn health_check(&self) -> Result<()> {
        self.posts.health_check().await?;
        self.blobs.health_check().await
    }

    async fn put_image(&self, name: &str, file: UploadedFile) -> Result<()> {
        let key = post_image_key(name);
        let content_type = content_type_for(name);
        let result = self
            .blobs
            .put(&key, file.bytes, content_type.essence_str())
            .await;
        record_blob_operation("put", result.is_ok());
        result
    }

    /// A missing blob is fine; other failures are logged and swallowed
    async fn remove_image(&self, name: &str) {
        let key = post_image_key(name);
        let result = self.blobs.delete(&key).await;
        record_blob_operation("delete", result.is_ok());
        if let Err(err) = result {
            tracing::warn!(blob = %key, error = %err, "Failed to delete post image");
        }
    }
}
