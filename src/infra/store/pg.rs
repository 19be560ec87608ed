use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::config::AppConfig;
use crate::domain::post::{Post, PostStatus};
use crate::infra::store::PostStore;

/// Postgres-backed store. Engagement documents live in JSONB columns on the
/// post row; the compare-and-swap predicate rides on the `version` column.
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

const POST_COLUMNS: &str = "id, author_id, title, slug, share_token, content, excerpt, \
     cover_image_url, status, is_public, allow_comments, views, likes, favorites, \
     comments, metrics, version, created_at, updated_at";

impl PgPostStore {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.db_idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(config.db_max_lifetime_seconds))
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool })
    }

    fn row_to_post(row: &sqlx::postgres::PgRow) -> Result<Post> {
        let status: String = row.get("status");
        let status = PostStatus::from_db(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown post status: {}", status))?;

        // Documents deserialize leniently: a missing or malformed field reads
        // back as its zero value instead of failing the whole row.
        Ok(Post {
            id: row.get("id"),
            author_id: row.get("author_id"),
            title: row.get("title"),
            slug: row.get("slug"),
            share_token: row.get("share_token"),
            content: row.get("content"),
            excerpt: row.get("excerpt"),
            cover_image_url: row.get("cover_image_url"),
            status,
            is_public: row.get("is_public"),
            allow_comments: row.get("allow_comments"),
            views: serde_json::from_value(row.get("views")).unwrap_or_default(),
            likes: serde_json::from_value(row.get("likes")).unwrap_or_default(),
            favorites: serde_json::from_value(row.get("favorites")).unwrap_or_default(),
            comments: serde_json::from_value(row.get("comments")).unwrap_or_default(),
            metrics: serde_json::from_value(row.get("metrics")).unwrap_or_default(),
            version: row.get("version"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[axum::async_trait]
impl PostStore for PgPostStore {
    async fn insert(&self, post: Post) -> Result<Post> {
        let row = sqlx::query(
            "INSERT INTO posts (author_id, title, slug, share_token, content, excerpt, \
                                cover_image_url, status, is_public, allow_comments, \
                                views, likes, favorites, comments, metrics, version, \
                                created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, 0, $16, $17) \
             RETURNING id",
        )
        .bind(post.author_id)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.share_token)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.cover_image_url)
        .bind(post.status.as_db())
        .bind(post.is_public)
        .bind(post.allow_comments)
        .bind(serde_json::to_value(&post.views)?)
        .bind(serde_json::to_value(&post.likes)?)
        .bind(serde_json::to_value(&post.favorites)?)
        .bind(serde_json::to_value(&post.comments)?)
        .bind(serde_json::to_value(&post.metrics)?)
        .bind(post.created_at)
        .bind(post.updated_at)
        .fetch_one(&self.pool)
        .await?;

        let mut post = post;
        post.id = row.get("id");
        post.version = 0;
        Ok(post)
    }

    async fn get(&self, post_id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS))
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_post).transpose()
    }

    async fn get_by_share_token(&self, share_token: &str) -> Result<Option<Post>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE share_token = $1",
            POST_COLUMNS
        ))
        .bind(share_token)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_post).transpose()
    }

    async fn save(&self, post: &Post) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE posts \
             SET title = $1, slug = $2, share_token = $3, content = $4, excerpt = $5, \
                 cover_image_url = $6, status = $7, is_public = $8, allow_comments = $9, \
                 views = $10, likes = $11, favorites = $12, comments = $13, metrics = $14, \
                 updated_at = $15, version = version + 1 \
             WHERE id = $16 AND version = $17",
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.share_token)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.cover_image_url)
        .bind(post.status.as_db())
        .bind(post.is_public)
        .bind(post.allow_comments)
        .bind(serde_json::to_value(&post.views)?)
        .bind(serde_json::to_value(&post.likes)?)
        .bind(serde_json::to_value(&post.favorites)?)
        .bind(serde_json::to_value(&post.comments)?)
        .bind(serde_json::to_value(&post.metrics)?)
        .bind(post.updated_at)
        .bind(post.id)
        .bind(post.version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, post_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE author_id = $1 \
             ORDER BY created_at DESC, id DESC",
            POST_COLUMNS
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_post).collect()
    }

    async fn list_public(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts \
             WHERE status = 'PUBLISHED' AND is_public \
             ORDER BY created_at DESC, id DESC",
            POST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_post).collect()
    }

    async fn slug_exists(&self, slug: &str, exclude_post: Option<i64>) -> Result<bool> {
        let exists: bool = match exclude_post {
            Some(post_id) => {
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM posts WHERE slug = $1 AND id <> $2)",
                )
                .bind(slug)
                .bind(post_id)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE slug = $1)")
                    .bind(slug)
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(exists)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
