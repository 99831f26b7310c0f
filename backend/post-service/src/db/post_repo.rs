use super::PostRepository;
use crate::error::Result;
use crate::models::{NewPost, Page, Post, PostChanges, PostTitle};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

/// PostgreSQL-backed record store
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn paginate(&self, page: u64, per_page: u64) -> Result<Page<Post>> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM posts")
            .fetch_one(&self.pool)
            .await?
            .get("count");

        let offset = page.saturating_sub(1).saturating_mul(per_page);
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, image, title, content, created_at, updated_at
            FROM posts
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::try_from(per_page).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            items: posts,
            total: total.max(0) as u64,
            page,
            per_page,
        })
    }

    async fn find(&self, id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, image, title, content, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_title(&self, id: i64) -> Result<Option<PostTitle>> {
        let title = sqlx::query_as::<_, PostTitle>("SELECT title FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(title)
    }

    async fn create(&self, post: NewPost) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (image, title, content)
            VALUES ($1, $2, $3)
            RETURNING id, image, title, content, created_at, updated_at
            "#,
        )
        .bind(&post.image)
        .bind(&post.title)
        .bind(&post.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET image = COALESCE($2, image),
                title = $3,
                content = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, image, title, content, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.image.as_deref())
        .bind(&changes.title)
        .bind(&changes.content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
