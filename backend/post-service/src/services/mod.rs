/// Business logic layer for post-service
///
/// This module provides high-level operations:
/// - Post service: listing, creation with image upload, title lookup,
///   update with optional image replacement, deletion with the stored image
pub mod posts;

// Re-export commonly used services
pub use posts::{generate_image_name, PostService};
