/// Database access layer
///
/// This module provides:
/// - The `PostRepository` record store interface
/// - `PgPostRepository` backed by PostgreSQL
/// - `InMemoryPostRepository` for tests and local runs without a database
/// - Pool creation and embedded migrations
pub mod memory;
pub mod post_repo;

pub use memory::InMemoryPostRepository;
pub use post_repo::PgPostRepository;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{NewPost, Page, Post, PostChanges, PostTitle};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Posts shown per page when listing
pub const PER_PAGE: u64 = 5;

/// Record store for posts
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Newest-first page of posts (`page` is 1-based)
    async fn paginate(&self, page: u64, per_page: u64) -> Result<Page<Post>>;

    async fn find(&self, id: i64) -> Result<Option<Post>>;

    /// Title-only projection of a post
    async fn find_title(&self, id: i64) -> Result<Option<PostTitle>>;

    async fn create(&self, post: NewPost) -> Result<Post>;

    /// Apply `changes`; `None` when the post no longer exists
    async fn update(&self, id: i64, changes: PostChanges) -> Result<Option<Post>>;

    /// `true` when a row was removed
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn health_check(&self) -> Result<()>;
}

/// Create the PostgreSQL pool for the service
pub async fn create_pool(cfg: &DatabaseConfig) -> Result<PgPool> {
    tracing::info!(
        max_connections = cfg.max_connections,
        "Creating database pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .connect(&cfg.url)
        .await?;

    Ok(pool)
}

/// Apply the embedded migrations in `migrations/`
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
