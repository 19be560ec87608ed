use anyhow::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::post::{Post, PostStatus};
use crate::infra::store::PostStore;

/// In-memory store with the same compare-and-swap contract as the Postgres
/// implementation. Backs the integration tests.
#[derive(Clone)]
pub struct MemoryPostStore {
    posts: Arc<RwLock<HashMap<i64, Post>>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self {
            posts: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

fn newest_first(posts: &mut Vec<Post>) {
    posts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[axum::async_trait]
impl PostStore for MemoryPostStore {
    async fn insert(&self, post: Post) -> Result<Post> {
        let mut post = post;
        post.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        post.version = 0;

        let mut posts = self.posts.write().await;
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn get(&self, post_id: i64) -> Result<Option<Post>> {
        let posts = self.posts.read().await;
        Ok(posts.get(&post_id).cloned())
    }

    async fn get_by_share_token(&self, share_token: &str) -> Result<Option<Post>> {
        let posts = self.posts.read().await;
        Ok(posts
            .values()
            .find(|post| post.share_token.as_deref() == Some(share_token))
            .cloned())
    }

    async fn save(&self, post: &Post) -> Result<bool> {
        let mut posts = self.posts.write().await;
        let Some(stored) = posts.get_mut(&post.id) else {
            return Ok(false);
        };
        if stored.version != post.version {
            return Ok(false);
        }

        let mut updated = post.clone();
        updated.version = post.version + 1;
        *stored = updated;
        Ok(true)
    }

    async fn delete(&self, post_id: i64) -> Result<bool> {
        let mut posts = self.posts.write().await;
        Ok(posts.remove(&post_id).is_some())
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Post>> {
        let posts = self.posts.read().await;
        let mut result: Vec<Post> = posts
            .values()
            .filter(|post| post.author_id == author_id)
            .cloned()
            .collect();
        newest_first(&mut result);
        Ok(result)
    }

    async fn list_public(&self) -> Result<Vec<Post>> {
        let posts = self.posts.read().await;
        let mut result: Vec<Post> = posts
            .values()
            .filter(|post| post.status == PostStatus::Published && post.is_public)
            .cloned()
            .collect();
        newest_first(&mut result);
        Ok(result)
    }

    async fn slug_exists(&self, slug: &str, exclude_post: Option<i64>) -> Result<bool> {
        let posts = self.posts.read().await;
        Ok(posts.values().any(|post| {
            post.slug.as_deref() == Some(slug) && Some(post.id) != exclude_post
        }))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
