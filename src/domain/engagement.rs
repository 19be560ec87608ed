//! Typed engagement documents stored alongside each post, plus the pure
//! mutation logic over them. Serialized field names match the legacy
//! snake_case document format exactly (`viewer_guest_id`, `is_favorite`,
//! `comment_id`, ...), so existing stored rows keep reading back.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use time::OffsetDateTime;

/// Who performed a like, comment or reply: a registered user or a guest
/// fingerprint. A user id always wins over a guest identifier when both
/// are supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(i64),
    Guest {
        identifier: String,
        name: Option<String>,
    },
}

impl Identity {
    pub fn resolve(
        user_id: Option<i64>,
        guest_identifier: Option<String>,
        guest_name: Option<String>,
    ) -> Option<Self> {
        if let Some(user_id) = user_id {
            return Some(Self::User(user_id));
        }
        guest_identifier.map(|identifier| Self::Guest {
            identifier,
            name: guest_name,
        })
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewsDoc {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub unique_viewers: u64,
    #[serde(default)]
    pub entries: Vec<ViewEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_guest_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    pub ip_address: String,
    pub country: String,
    pub city: String,
    pub region: String,
    #[serde(with = "time::serde::rfc3339")]
    pub viewed_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl ViewsDoc {
    /// Append a view (repeat views are kept, there is no deduplication) and
    /// recompute the distinct non-empty `viewer_guest_id` cardinality.
    pub fn record(&mut self, entry: ViewEntry) {
        self.entries.push(entry);
        self.count = self.entries.len() as u64;
        let distinct: HashSet<&str> = self
            .entries
            .iter()
            .filter_map(|e| e.viewer_guest_id.as_deref())
            .filter(|id| !id.is_empty())
            .collect();
        self.unique_viewers = distinct.len() as u64;
    }
}

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LikesDoc {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub entries: Vec<LikeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_identifier: Option<String>,
    pub ip_address: String,
    #[serde(with = "time::serde::rfc3339")]
    pub liked_at: OffsetDateTime,
}

impl LikeEntry {
    fn matches(&self, identity: &Identity) -> bool {
        match identity {
            Identity::User(user_id) => self.user_id == Some(*user_id),
            Identity::Guest { identifier, .. } => {
                self.guest_identifier.as_deref() == Some(identifier.as_str())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    Added,
    Removed,
}

impl LikesDoc {
    /// Toggle the like held by `identity`: remove the matching entry when one
    /// exists (scanning in insertion order), append a fresh one otherwise.
    /// Keeps the invariant of at most one entry per identity, and
    /// `count == entries.len()` afterwards.
    pub fn toggle(&mut self, identity: &Identity, ip_address: &str, now: OffsetDateTime) -> LikeToggle {
        let toggle = match self.entries.iter().position(|e| e.matches(identity)) {
            Some(index) => {
                self.entries.remove(index);
                LikeToggle::Removed
            }
            None => {
                let entry = match identity {
                    Identity::User(user_id) => LikeEntry {
                        user_id: Some(*user_id),
                        guest_name: None,
                        guest_identifier: None,
                        ip_address: ip_address.to_string(),
                        liked_at: now,
                    },
                    Identity::Guest { identifier, name } => LikeEntry {
                        user_id: None,
                        guest_name: name.clone(),
                        guest_identifier: Some(identifier.clone()),
                        ip_address: ip_address.to_string(),
                        liked_at: now,
                    },
                };
                self.entries.push(entry);
                LikeToggle::Added
            }
        };
        self.count = self.entries.len() as u64;
        toggle
    }
}

// ---------------------------------------------------------------------------
// Favorites
// ---------------------------------------------------------------------------

/// A post has exactly one owning author, so the favorite marker is a single
/// flag rather than a per-user set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FavoritesDoc {
    #[serde(default)]
    pub is_favorite: bool,
}

impl FavoritesDoc {
    pub fn toggle(&mut self) -> bool {
        self.is_favorite = !self.is_favorite;
        self.is_favorite
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentsDoc {
    /// Top-level comments plus their direct replies, flattened.
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub entries: Vec<CommentEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentEntry {
    pub comment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub replies: Vec<ReplyEntry>,
}

/// Replies carry no reply list of their own; threading stops one level down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyEntry {
    pub comment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub fn total_comments(entries: &[CommentEntry]) -> u64 {
    entries
        .iter()
        .map(|entry| 1 + entry.replies.len() as u64)
        .sum()
}

impl CommentsDoc {
    pub fn add_comment(&mut self, entry: CommentEntry) {
        self.entries.push(entry);
        self.count = total_comments(&self.entries);
    }

    /// Attach a reply to the top-level comment with the given id.
    ///
    /// Only top-level entries are searched: a reply id passed as the parent
    /// is never found, so replying to a reply fails. Known limitation kept
    /// for compatibility with already-stored threads.
    pub fn add_reply(&mut self, parent_comment_id: &str, reply: ReplyEntry) -> bool {
        let Some(parent) = self
            .entries
            .iter_mut()
            .find(|entry| entry.comment_id == parent_comment_id)
        else {
            return false;
        };
        parent.replies.push(reply);
        self.count = total_comments(&self.entries);
        true
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Derived counters, recomputed from the documents above after every
/// mutation. Never mutated independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsDoc {
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
}
