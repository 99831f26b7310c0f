/// HTTP handlers for post-service endpoints
///
/// This module contains handlers for:
/// - Posts: list, create, show, update and delete
/// - Images: public access to stored post images
/// - Health: liveness and readiness probes
///
/// `form` turns multipart, JSON and urlencoded bodies into a `PostForm`.
pub mod form;
pub mod health;
pub mod images;
pub mod posts;

// Re-export handler functions at module level
pub use health::{health_summary, liveness_check, readiness_summary, HealthState};
pub use images::serve_image;
pub use posts::{create_post, delete_post, get_post, list_posts, update_post};
