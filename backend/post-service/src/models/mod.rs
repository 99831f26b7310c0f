/// Data models for post-service
///
/// This module defines structures for:
/// - Post: Persisted blog post referencing its stored image by name
/// - PostForm: Parsed create/update request body
/// - ApiResponse / Paginator: Response envelopes returned by handlers
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// A persisted blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Post {
    pub id: i64,
    /// File name of the image inside the `posts/` blob namespace
    pub image: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Title-only projection returned by the show endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PostTitle {
    pub title: String,
}

/// Fields for inserting a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub image: String,
    pub title: String,
    pub content: String,
}

/// Fields written by an update; `image: None` keeps the current image
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub image: Option<String>,
    pub title: String,
    pub content: String,
}

/// An uploaded file part
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name, if any
    pub file_name: Option<String>,
    /// Client-supplied content type, if any
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Lowercased extension of the client file name
    pub fn client_extension(&self) -> Option<String> {
        self.file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    }
}

/// Create/update request body after parsing. Blank strings and empty files
/// are already normalized to `None`.
#[derive(Debug, Clone, Default, Validate)]
pub struct PostForm {
    #[validate(
        required(message = "The title field is required."),
        length(max = 255, message = "The title may not be greater than 255 characters.")
    )]
    pub title: Option<String>,

    #[validate(required(message = "The content field is required."))]
    pub content: Option<String>,

    pub image: Option<UploadedFile>,
}

/// `{status, message, data}` envelope used by list/create/show/delete
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: None,
        }
    }
}

/// `{message, data}` envelope used by update
#[derive(Debug, Serialize)]
pub struct MessageResponse<T: Serialize> {
    pub message: String,
    pub data: T,
}

/// One page of results from the record store
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Length-aware paginator as serialized to clients
#[derive(Debug, Serialize)]
pub struct Paginator<T: Serialize> {
    pub current_page: u64,
    pub data: Vec<T>,
    pub first_page_url: String,
    pub from: Option<u64>,
    pub last_page: u64,
    pub last_page_url: String,
    pub next_page_url: Option<String>,
    pub path: String,
    pub per_page: u64,
    pub prev_page_url: Option<String>,
    pub to: Option<u64>,
    pub total: u64,
}

impl<T: Serialize> Paginator<T> {
    /// Build the paginator for `page`; `path` is the absolute URL without query
    pub fn from_page(page: Page<T>, path: &str) -> Self {
        let per_page = page.per_page.max(1);
        let last_page = page.total.div_ceil(per_page).max(1);
        let url = |n: u64| format!("{}?page={}", path, n);

        let (from, to) = if page.items.is_empty() {
            (None, None)
        } else {
            let from = (page.page - 1) * per_page + 1;
            (Some(from), Some(from + page.items.len() as u64 - 1))
        };

        Paginator {
            current_page: page.page,
            first_page_url: url(1),
            from,
            last_page,
            last_page_url: url(last_page),
            next_page_url: (page.page < last_page).then(|| url(page.page + 1)),
            path: path.to_string(),
            per_page,
            prev_page_url: (page.page > 1).then(|| url(page.page - 1)),
            to,
            total: page.total,
            data: page.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(items: Vec<u32>, total: u64, current: u64) -> Page<u32> {
        Page {
            items,
            total,
            page: current,
            per_page: 5,
        }
    }

    #[test]
    fn first_of_three_pages() {
        let p = Paginator::from_page(page(vec![1, 2, 3, 4, 5], 12, 1), "http://localhost/api/posts");
        assert_eq!(p.last_page, 3);
        assert_eq!(p.from, Some(1));
        assert_eq!(p.to, Some(5));
        assert_eq!(p.prev_page_url, None);
        assert_eq!(
            p.next_page_url.as_deref(),
            Some("http://localhost/api/posts?page=2")
        );
        assert_eq!(p.last_page_url, "http://localhost/api/posts?page=3");
    }

    #[test]
    fn partial_last_page() {
        let p = Paginator::from_page(page(vec![11, 12], 12, 3), "/api/posts");
        assert_eq!(p.from, Some(11));
        assert_eq!(p.to, Some(12));
        assert_eq!(p.next_page_url, None);
        assert_eq!(p.prev_page_url.as_deref(), Some("/api/posts?page=2"));
    }

    #[test]
    fn empty_store_has_one_empty_page() {
        let p = Paginator::from_page(page(vec![], 0, 1), "/api/posts");
        assert_eq!(p.last_page, 1);
        assert_eq!(p.from, None);
        assert_eq!(p.to, None);
        assert_eq!(p.total, 0);
    }

    #[test]
    fn client_extension_is_normalized() {
        let file = UploadedFile {
            file_name: Some("Photo.JPG".into()),
            content_type: None,
            bytes: Bytes::new(),
        };
        assert_eq!(file.client_extension().as_deref(), Some("jpg"));

        let nameless = UploadedFile {
            file_name: None,
            ..file
        };
        assert_eq!(nameless.client_extension(), None);
    }
}
