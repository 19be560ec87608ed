use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::engagement::{
    total_comments, CommentsDoc, FavoritesDoc, LikesDoc, MetricsDoc, ViewsDoc,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub slug: Option<String>,
    pub share_token: Option<String>,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image_url: Option<String>,
    pub status: PostStatus,
    pub is_public: bool,
    pub allow_comments: bool,
    pub views: ViewsDoc,
    pub likes: LikesDoc,
    pub favorites: FavoritesDoc,
    pub comments: CommentsDoc,
    pub metrics: MetricsDoc,
    /// Optimistic-concurrency counter, bumped by every store save.
    #[serde(skip)]
    pub version: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Post {
    /// Re-derive the metrics counters from the engagement documents.
    /// Runs inside every read-modify-write, so persisted metrics are never
    /// stale relative to the documents they summarize.
    pub fn refresh_metrics(&mut self) {
        self.metrics = MetricsDoc {
            views: self.views.count,
            likes: self.likes.count,
            comments: total_comments(&self.comments.entries),
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "DRAFT" => Some(Self::Draft),
            "PUBLISHED" => Some(Self::Published),
            "ARCHIVED" => Some(Self::Archived),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
            Self::Archived => "ARCHIVED",
        }
    }

    /// Lenient parse for filter params ("published", "Draft", ...).
    pub fn parse(value: &str) -> Option<Self> {
        Self::from_db(value.to_ascii_uppercase().as_str())
    }
}
