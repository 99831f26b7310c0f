use super::PostRepository;
use crate::error::Result;
use crate::models::{NewPost, Page, Post, PostChanges, PostTitle};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    next_id: i64,
    posts: BTreeMap<i64, Post>,
}

/// Record store kept in process memory. Ids start at 1 and are never reused.
#[derive(Default)]
pub struct InMemoryPostRepository {
    state: RwLock<State>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.posts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Insert a fully-formed post, e.g. with a fixed `created_at`
    pub async fn insert(&self, post: Post) {
        let mut state = self.state.write().await;
        state.next_id = state.next_id.max(post.id);
        state.posts.insert(post.id, post);
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn paginate(&self, page: u64, per_page: u64) -> Result<Page<Post>> {
        let state = self.state.read().await;

        let mut posts: Vec<&Post> = state.posts.values().collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let offset = page.saturating_sub(1).saturating_mul(per_page);
        let items = posts
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(per_page).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(Page {
            items,
            total: state.posts.len() as u64,
            page,
            per_page,
        })
    }

    async fn find(&self, id: i64) -> Result<Option<Post>> {
        Ok(self.state.read().await.posts.get(&id).cloned())
    }

    async fn find_title(&self, id: i64) -> Result<Option<PostTitle>> {
        Ok(self.state.read().await.posts.get(&id).map(|p| PostTitle {
            title: p.title.clone(),
        }))
    }

    async fn create(&self, post: NewPost) -> Result<Post> {
        let mut state = self.state.write().await;
        state.next_id += 1;

        let now = Utc::now();
        let post = Post {
            id: state.next_id,
            image: post.image,
            title: post.title,
            content: post.content,
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(post.id, post.clone());

        Ok(post)
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let mut state = self.state.write().await;
        let Some(post) = state.posts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(image) = changes.image {
            post.image = image;
        }
        post.title = changes.title;
        post.content = changes.content;
        post.updated_at = Utc::now();

        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.state.write().await.posts.remove(&id).is_some())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
