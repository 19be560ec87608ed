use anyhow::anyhow;
use std::sync::Arc;
use time::OffsetDateTime;

use crate::app::tokens::TokenSource;
use crate::domain::engagement::{CommentsDoc, FavoritesDoc, LikesDoc, MetricsDoc, ViewsDoc};
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostStatus};
use crate::infra::store::PostStore;

/// Read-modify-write attempts before a mutation gives up on a post whose
/// row keeps changing underneath it.
const MAX_SAVE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub slug: Option<String>,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image_url: Option<String>,
    pub allow_comments: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image_url: Option<String>,
    pub allow_comments: Option<bool>,
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn PostStore>,
    tokens: Arc<dyn TokenSource>,
}

impl PostService {
    pub fn new(store: Arc<dyn PostStore>, tokens: Arc<dyn TokenSource>) -> Self {
        Self { store, tokens }
    }

    pub async fn create_post(&self, author_id: i64, new_post: NewPost) -> Result<Post, DomainError> {
        if let Some(slug) = &new_post.slug {
            if self.store.slug_exists(slug, None).await? {
                return Err(DomainError::InvalidState("slug already exists"));
            }
        }

        let now = OffsetDateTime::now_utc();
        let post = Post {
            id: 0,
            author_id,
            title: new_post.title,
            slug: new_post.slug,
            share_token: None,
            content: new_post.content,
            excerpt: new_post.excerpt,
            cover_image_url: new_post.cover_image_url,
            status: PostStatus::Draft,
            is_public: false,
            allow_comments: new_post.allow_comments,
            views: ViewsDoc::default(),
            likes: LikesDoc::default(),
            favorites: FavoritesDoc::default(),
            comments: CommentsDoc::default(),
            metrics: MetricsDoc::default(),
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let post = self.store.insert(post).await?;
        tracing::info!(post_id = post.id, author_id, "post created");
        Ok(post)
    }

    pub async fn update_post(
        &self,
        author_id: i64,
        post_id: i64,
        changes: PostChanges,
    ) -> Result<Post, DomainError> {
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut post = self.owned_post(post_id, author_id).await?;

            if let Some(slug) = &changes.slug {
                if post.slug.as_deref() != Some(slug.as_str())
                    && self.store.slug_exists(slug, Some(post_id)).await?
                {
                    return Err(DomainError::InvalidState("slug already exists"));
                }
            }

            if let Some(title) = &changes.title {
                post.title = title.clone();
            }
            if let Some(slug) = &changes.slug {
                post.slug = Some(slug.clone());
            }
            if let Some(content) = &changes.content {
                post.content = content.clone();
            }
            if let Some(excerpt) = &changes.excerpt {
                post.excerpt = Some(excerpt.clone());
            }
            if let Some(cover_image_url) = &changes.cover_image_url {
                post.cover_image_url = Some(cover_image_url.clone());
            }
            if let Some(allow_comments) = changes.allow_comments {
                post.allow_comments = allow_comments;
            }
            post.updated_at = OffsetDateTime::now_utc();

            if self.store.save(&post).await? {
                tracing::info!(post_id, author_id, "post updated");
                return Ok(post);
            }
        }

        Err(save_contention(post_id))
    }

    pub async fn publish_post(&self, author_id: i64, post_id: i64) -> Result<Post, DomainError> {
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut post = self.owned_post(post_id, author_id).await?;

            // The share token is minted on first publish and kept for the
            // lifetime of the post; republishing never rotates it.
            if post.share_token.is_none() {
                post.share_token = Some(self.tokens.share_token());
            }
            post.status = PostStatus::Published;
            post.is_public = true;
            post.updated_at = OffsetDateTime::now_utc();

            if self.store.save(&post).await? {
                tracing::info!(post_id, author_id, "post published");
                return Ok(post);
            }
        }

        Err(save_contention(post_id))
    }

    pub async fn unpublish_post(&self, author_id: i64, post_id: i64) -> Result<Post, DomainError> {
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut post = self.owned_post(post_id, author_id).await?;

            post.status = PostStatus::Draft;
            post.is_public = false;
            post.updated_at = OffsetDateTime::now_utc();

            if self.store.save(&post).await? {
                tracing::info!(post_id, author_id, "post unpublished");
                return Ok(post);
            }
        }

        Err(save_contention(post_id))
    }

    pub async fn delete_post(&self, author_id: i64, post_id: i64) -> Result<(), DomainError> {
        self.owned_post(post_id, author_id).await?;
        self.store.delete(post_id).await?;
        tracing::info!(post_id, author_id, "post deleted");
        Ok(())
    }

    pub async fn my_posts(&self, author_id: i64) -> Result<Vec<Post>, DomainError> {
        Ok(self.store.list_by_author(author_id).await?)
    }

    pub async fn get_post(&self, author_id: i64, post_id: i64) -> Result<Post, DomainError> {
        self.owned_post(post_id, author_id).await
    }

    pub async fn list_public_posts(&self) -> Result<Vec<Post>, DomainError> {
        Ok(self.store.list_public().await?)
    }

    pub async fn toggle_favorite(&self, author_id: i64, post_id: i64) -> Result<Post, DomainError> {
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut post = self.owned_post(post_id, author_id).await?;

            let is_favorite = post.favorites.toggle();
            post.updated_at = OffsetDateTime::now_utc();

            if self.store.save(&post).await? {
                tracing::info!(post_id, author_id, is_favorite, "favorite toggled");
                return Ok(post);
            }
        }

        Err(save_contention(post_id))
    }

    async fn owned_post(&self, post_id: i64, author_id: i64) -> Result<Post, DomainError> {
        let post = self
            .store
            .get(post_id)
            .await?
            .ok_or(DomainError::NotFound("post not found"))?;

        if post.author_id != author_id {
            return Err(DomainError::Unauthorized(
                "you don't have permission to access this post",
            ));
        }

        Ok(post)
    }
}

fn save_contention(post_id: i64) -> DomainError {
    DomainError::Storage(anyhow!(
        "post {} kept changing concurrently, giving up",
        post_id
    ))
}
