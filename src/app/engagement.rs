use std::sync::Arc;
use time::OffsetDateTime;

use crate::app::geo::{self, GeoLocator};
use crate::app::tokens::TokenSource;
use crate::domain::engagement::{CommentEntry, Identity, LikeToggle, ReplyEntry, ViewEntry};
use crate::domain::error::DomainError;
use crate::domain::post::Post;
use crate::infra::store::PostStore;

const MAX_SAVE_ATTEMPTS: usize = 5;

/// Request-side context for one public view.
#[derive(Debug, Clone, Default)]
pub struct ViewContext {
    pub viewer_guest_id: Option<String>,
    pub guest_name: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub user_id: Option<i64>,
    pub guest_name: Option<String>,
    pub guest_identifier: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct NewReply {
    pub parent_comment_id: String,
    pub user_id: Option<i64>,
    pub guest_name: Option<String>,
    pub content: String,
}

/// The mutation engines over a post's engagement documents. Every operation
/// is a full read-modify-write of the post row: mutate the document, re-derive
/// the metrics counters, save with compare-and-swap, retry on conflict.
#[derive(Clone)]
pub struct EngagementService {
    store: Arc<dyn PostStore>,
    tokens: Arc<dyn TokenSource>,
    geo: Arc<dyn GeoLocator>,
}

impl EngagementService {
    pub fn new(
        store: Arc<dyn PostStore>,
        tokens: Arc<dyn TokenSource>,
        geo: Arc<dyn GeoLocator>,
    ) -> Self {
        Self { store, tokens, geo }
    }

    /// Public read by share token. Records a view entry (repeat views all
    /// count) before returning the post; recording never blocks on a missing
    /// viewer id and geolocation degrades to "Unknown".
    pub async fn get_public_post(
        &self,
        share_token: &str,
        ip_address: &str,
        context: ViewContext,
    ) -> Result<Post, DomainError> {
        let location = geo::lookup(self.geo.as_ref(), ip_address);

        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut post = self.post_by_share_token(share_token).await?;

            if !post.is_public {
                return Err(DomainError::Unauthorized("post is not public"));
            }

            post.views.record(ViewEntry {
                viewer_guest_id: context.viewer_guest_id.clone(),
                guest_name: context.guest_name.clone(),
                ip_address: ip_address.to_string(),
                country: location.country.clone(),
                city: location.city.clone(),
                region: location.region.clone(),
                viewed_at: OffsetDateTime::now_utc(),
                referrer: context.referrer.clone(),
                user_agent: context.user_agent.clone(),
            });
            post.refresh_metrics();
            post.updated_at = OffsetDateTime::now_utc();

            if self.store.save(&post).await? {
                tracing::info!(
                    post_id = post.id,
                    views = post.views.count,
                    unique_viewers = post.views.unique_viewers,
                    "view recorded"
                );
                return Ok(post);
            }
        }

        Err(save_contention_message("view recording"))
    }

    /// Toggle the like held by `identity`: one call likes, the next call by
    /// the same identity unlikes.
    pub async fn toggle_like(
        &self,
        share_token: &str,
        identity: Identity,
        ip_address: &str,
    ) -> Result<(Post, LikeToggle), DomainError> {
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut post = self.post_by_share_token(share_token).await?;

            let toggle = post
                .likes
                .toggle(&identity, ip_address, OffsetDateTime::now_utc());
            post.refresh_metrics();
            post.updated_at = OffsetDateTime::now_utc();

            if self.store.save(&post).await? {
                match toggle {
                    LikeToggle::Added => {
                        tracing::info!(post_id = post.id, likes = post.likes.count, "post liked")
                    }
                    LikeToggle::Removed => {
                        tracing::info!(post_id = post.id, likes = post.likes.count, "post unliked")
                    }
                }
                return Ok((post, toggle));
            }
        }

        Err(save_contention_message("like toggle"))
    }

    pub async fn add_comment(
        &self,
        share_token: &str,
        new_comment: NewComment,
        ip_address: &str,
    ) -> Result<(Post, CommentEntry), DomainError> {
        let comment_id = self.tokens.comment_id();
        // A guest without a stable identifier gets one minted, so later likes
        // or replies from the same browser can be attributed.
        let guest_identifier = match (&new_comment.user_id, new_comment.guest_identifier) {
            (Some(_), identifier) => identifier,
            (None, Some(identifier)) => Some(identifier),
            (None, None) => Some(self.tokens.guest_identifier()),
        };

        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut post = self.post_by_share_token(share_token).await?;

            if !post.allow_comments {
                return Err(DomainError::InvalidState(
                    "comments are disabled for this post",
                ));
            }

            let entry = CommentEntry {
                comment_id: comment_id.clone(),
                user_id: new_comment.user_id,
                guest_name: new_comment.guest_name.clone(),
                guest_identifier: guest_identifier.clone(),
                ip_address: Some(ip_address.to_string()),
                content: new_comment.content.clone(),
                created_at: OffsetDateTime::now_utc(),
                replies: Vec::new(),
            };

            post.comments.add_comment(entry.clone());
            post.refresh_metrics();
            post.updated_at = OffsetDateTime::now_utc();

            if self.store.save(&post).await? {
                tracing::info!(
                    post_id = post.id,
                    comment_id = %entry.comment_id,
                    comments = post.comments.count,
                    "comment added"
                );
                return Ok((post, entry));
            }
        }

        Err(save_contention_message("comment"))
    }

    /// Reply to a top-level comment. The parent is looked up among top-level
    /// entries only, so a reply id as `parent_comment_id` yields NotFound.
    pub async fn add_reply(
        &self,
        share_token: &str,
        new_reply: NewReply,
    ) -> Result<(Post, ReplyEntry), DomainError> {
        let reply_id = self.tokens.reply_id();

        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut post = self.post_by_share_token(share_token).await?;

            if !post.allow_comments {
                return Err(DomainError::InvalidState(
                    "comments are disabled for this post",
                ));
            }

            let reply = ReplyEntry {
                comment_id: reply_id.clone(),
                user_id: new_reply.user_id,
                guest_name: new_reply.guest_name.clone(),
                content: new_reply.content.clone(),
                created_at: OffsetDateTime::now_utc(),
            };

            if !post.comments.add_reply(&new_reply.parent_comment_id, reply.clone()) {
                return Err(DomainError::NotFound("parent comment not found"));
            }
            post.refresh_metrics();
            post.updated_at = OffsetDateTime::now_utc();

            if self.store.save(&post).await? {
                tracing::info!(
                    post_id = post.id,
                    reply_id = %reply.comment_id,
                    parent_comment_id = %new_reply.parent_comment_id,
                    comments = post.comments.count,
                    "reply added"
                );
                return Ok((post, reply));
            }
        }

        Err(save_contention_message("reply"))
    }

    async fn post_by_share_token(&self, share_token: &str) -> Result<Post, DomainError> {
        self.store
            .get_by_share_token(share_token)
            .await?
            .ok_or(DomainError::NotFound("post not found"))
    }
}

fn save_contention_message(operation: &str) -> DomainError {
    DomainError::Storage(anyhow::anyhow!(
        "{} kept conflicting with concurrent writes, giving up",
        operation
    ))
}
