//! Durable post storage. The engines only ever talk to the [`PostStore`]
//! port; the Postgres implementation backs production and the in-memory one
//! backs tests and embedding.

pub mod memory;
pub mod pg;

use anyhow::Result;

use crate::domain::post::Post;

pub use memory::MemoryPostStore;
pub use pg::PgPostStore;

/// Keyed access to posts plus a compare-and-swap save.
///
/// `save` succeeds only when the caller's `version` still matches the stored
/// row, so concurrent mutations of the same post serialize: the loser reloads
/// and retries. Mutations of different posts never contend.
#[axum::async_trait]
pub trait PostStore: Send + Sync {
    /// Persist a new post, assigning its id. The returned post carries the
    /// assigned id and the initial version.
    async fn insert(&self, post: Post) -> Result<Post>;

    async fn get(&self, post_id: i64) -> Result<Option<Post>>;

    async fn get_by_share_token(&self, share_token: &str) -> Result<Option<Post>>;

    /// Write the post back if `post.version` still matches the stored row.
    /// Returns false on a version conflict (caller reloads and retries).
    async fn save(&self, post: &Post) -> Result<bool>;

    async fn delete(&self, post_id: i64) -> Result<bool>;

    /// All posts by one author, newest first (created_at desc, id desc).
    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Post>>;

    /// Published public posts, newest first.
    async fn list_public(&self) -> Result<Vec<Post>>;

    async fn slug_exists(&self, slug: &str, exclude_post: Option<i64>) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}
