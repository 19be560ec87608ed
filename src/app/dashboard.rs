//! Author dashboard: summary counters over all of an author's posts, plus
//! one filtered/sorted/paginated page and a fixed recent-posts page. The
//! engagement documents live on each post row, so the aggregation happens
//! here in memory rather than in the store.

use std::sync::Arc;
use time::OffsetDateTime;

use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostStatus};
use crate::infra::store::PostStore;

const RECENT_POSTS_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Recent,
    TopViews,
    TopLikes,
    TopComments,
}

impl SortBy {
    /// Lenient parse; anything unrecognized falls back to RECENT.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_uppercase()).as_deref() {
            Some("TOP_VIEWS") => Self::TopViews,
            Some("TOP_LIKES") => Self::TopLikes,
            Some("TOP_COMMENTS") => Self::TopComments,
            _ => Self::Recent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub from_date: Option<OffsetDateTime>,
    pub to_date: Option<OffsetDateTime>,
    pub favorites_only: bool,
    pub sort_by: SortBy,
    /// Zero-indexed.
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub total_posts: u64,
    pub published_posts: u64,
    pub draft_posts: u64,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_favorites: u64,
    pub recent_posts: PostPage,
    pub filtered_posts: PostPage,
}

#[derive(Debug, Clone)]
pub struct PostPage {
    pub content: Vec<Post>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub first: bool,
    pub last: bool,
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn PostStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    pub async fn get_dashboard(
        &self,
        author_id: i64,
        query: DashboardQuery,
    ) -> Result<Dashboard, DomainError> {
        // One unlocked snapshot of everything the author has; the summary
        // counters ignore the filters entirely.
        let all_posts = self.store.list_by_author(author_id).await?;

        let total_posts = all_posts.len() as u64;
        let published_posts = count_status(&all_posts, PostStatus::Published);
        let draft_posts = count_status(&all_posts, PostStatus::Draft);
        let total_views: u64 = all_posts.iter().map(|p| p.metrics.views).sum();
        let total_likes: u64 = all_posts.iter().map(|p| p.metrics.likes).sum();
        let total_comments: u64 = all_posts.iter().map(|p| p.metrics.comments).sum();
        let total_favorites = all_posts.iter().filter(|p| p.favorites.is_favorite).count() as u64;

        let recent_posts = recent_page(&all_posts, RECENT_POSTS_LIMIT);

        let mut filtered = apply_filters(all_posts, &query);
        apply_sort(&mut filtered, query.sort_by);
        let filtered_posts = paginate(filtered, query.page, query.size);

        tracing::info!(
            author_id,
            total_posts,
            filtered = filtered_posts.total_elements,
            total_views,
            total_likes,
            total_comments,
            "dashboard computed"
        );

        Ok(Dashboard {
            total_posts,
            published_posts,
            draft_posts,
            total_views,
            total_likes,
            total_comments,
            total_favorites,
            recent_posts,
            filtered_posts,
        })
    }
}

fn count_status(posts: &[Post], status: PostStatus) -> u64 {
    posts.iter().filter(|p| p.status == status).count() as u64
}

pub fn apply_filters(posts: Vec<Post>, query: &DashboardQuery) -> Vec<Post> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let status = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => match PostStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                tracing::warn!(status = raw, "ignoring unrecognized status filter");
                None
            }
        },
        None => None,
    };

    posts
        .into_iter()
        .filter(|post| {
            if let Some(needle) = &search {
                let in_title = post.title.to_lowercase().contains(needle);
                let in_content = post.content.to_lowercase().contains(needle);
                if !in_title && !in_content {
                    return false;
                }
            }

            if let Some(status) = status {
                if post.status != status {
                    return false;
                }
            }

            // Inclusive [from, to] range on creation time.
            if let Some(from_date) = query.from_date {
                if post.created_at < from_date {
                    return false;
                }
            }
            if let Some(to_date) = query.to_date {
                if post.created_at > to_date {
                    return false;
                }
            }

            if query.favorites_only && !post.favorites.is_favorite {
                return false;
            }

            true
        })
        .collect()
}

/// Descending by the requested metric. `sort_by` is stable, so posts that
/// tie keep their incoming relative order.
pub fn apply_sort(posts: &mut [Post], sort_by: SortBy) {
    match sort_by {
        SortBy::Recent => posts.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortBy::TopViews => posts.sort_by(|a, b| b.metrics.views.cmp(&a.metrics.views)),
        SortBy::TopLikes => posts.sort_by(|a, b| b.metrics.likes.cmp(&a.metrics.likes)),
        SortBy::TopComments => posts.sort_by(|a, b| b.metrics.comments.cmp(&a.metrics.comments)),
    }
}

pub fn paginate(posts: Vec<Post>, page: u32, size: u32) -> PostPage {
    let total_elements = posts.len() as u64;
    let size = size.max(1);
    let total_pages = total_elements.div_ceil(size as u64) as u32;

    let from = page as u64 * size as u64;
    let content = if from < total_elements {
        let to = (from + size as u64).min(total_elements) as usize;
        posts[from as usize..to].to_vec()
    } else {
        Vec::new()
    };

    PostPage {
        content,
        page_number: page,
        page_size: size,
        total_elements,
        total_pages,
        first: page == 0,
        // Holds for the past-the-end and empty cases too: with zero pages
        // every requested page is the last one.
        last: page + 1 >= total_pages,
    }
}

fn recent_page(posts: &[Post], limit: usize) -> PostPage {
    let mut recent: Vec<Post> = posts.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(limit);

    let total_elements = recent.len() as u64;
    PostPage {
        content: recent,
        page_number: 0,
        page_size: limit as u32,
        total_elements,
        total_pages: 1,
        first: true,
        last: true,
    }
}
