use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::app::dashboard::{DashboardQuery, DashboardService, PostPage, SortBy};
use crate::app::engagement::{EngagementService, NewComment, NewReply, ViewContext};
use crate::app::posts::{NewPost, PostChanges, PostService};
use crate::domain::engagement::{
    CommentEntry, CommentsDoc, Identity, LikesDoc, MetricsDoc, ReplyEntry, ViewsDoc,
};
use crate::domain::post::{Post, PostStatus};
use crate::http::{ip, AppError, AuthUser};
use crate::AppState;

const MAX_TITLE_LEN: usize = 200;
const MIN_TITLE_LEN: usize = 3;
const MIN_CONTENT_LEN: usize = 10;
const MAX_COMMENT_LEN: usize = 1000;

// ---------------------------------------------------------------------------
// Shared response shapes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub slug: Option<String>,
    pub share_token: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image_url: Option<String>,
    pub status: PostStatus,
    pub is_public: bool,
    pub allow_comments: bool,
    pub metrics: MetricsDoc,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&Post> for PostResponse {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            share_token: post.share_token.clone(),
            excerpt: post.excerpt.clone(),
            cover_image_url: post.cover_image_url.clone(),
            status: post.status,
            is_public: post.is_public,
            allow_comments: post.allow_comments,
            metrics: post.metrics.clone(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Full post view including the engagement documents.
#[derive(Serialize)]
pub struct PostDetailResponse {
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
    pub is_favorite: bool,
    pub views: ViewsDoc,
    pub likes: LikesDoc,
    pub comments: CommentsDoc,
    pub metrics: MetricsDoc,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&Post> for PostDetailResponse {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            share_token: post.share_token.clone(),
            content: post.content.clone(),
            excerpt: post.excerpt.clone(),
            cover_image_url: post.cover_image_url.clone(),
            status: post.status,
            is_public: post.is_public,
            allow_comments: post.allow_comments,
            is_favorite: post.favorites.is_favorite,
            views: post.views.clone(),
            likes: post.likes.clone(),
            comments: post.comments.clone(),
            metrics: post.metrics.clone(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct PagedPostsResponse {
    pub content: Vec<PostResponse>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub first: bool,
    pub last: bool,
}

impl From<PostPage> for PagedPostsResponse {
    fn from(page: PostPage) -> Self {
        Self {
            content: page.content.iter().map(PostResponse::from).collect(),
            page_number: page.page_number,
            page_size: page.page_size,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
            first: page.first,
            last: page.last,
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.store.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Authored posts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub slug: Option<String>,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image_url: Option<String>,
    pub allow_comments: Option<bool>,
}

pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let title = payload.title.trim();
    if title.len() < MIN_TITLE_LEN || title.len() > MAX_TITLE_LEN {
        return Err(AppError::bad_request(
            "title must be between 3 and 200 characters",
        ));
    }
    if payload.content.len() < MIN_CONTENT_LEN {
        return Err(AppError::bad_request(
            "content must be at least 10 characters",
        ));
    }

    let service = PostService::new(state.store.clone(), state.tokens.clone());
    let post = service
        .create_post(
            auth.user_id,
            NewPost {
                title: title.to_string(),
                slug: payload.slug,
                content: payload.content,
                excerpt: payload.excerpt,
                cover_image_url: payload.cover_image_url,
                allow_comments: payload.allow_comments.unwrap_or(true),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(&post))))
}

pub async fn list_my_posts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let service = PostService::new(state.store.clone(), state.tokens.clone());
    let posts = service.my_posts(auth.user_id).await?;

    Ok(Json(posts.iter().map(PostResponse::from).collect()))
}

pub async fn get_post(
    Path(post_id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PostDetailResponse>, AppError> {
    let service = PostService::new(state.store.clone(), state.tokens.clone());
    let post = service.get_post(auth.user_id, post_id).await?;

    Ok(Json(PostDetailResponse::from(&post)))
}

#[derive(Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image_url: Option<String>,
    pub allow_comments: Option<bool>,
}

pub async fn update_post(
    Path(post_id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    if let Some(title) = &payload.title {
        let title = title.trim();
        if title.len() < MIN_TITLE_LEN || title.len() > MAX_TITLE_LEN {
            return Err(AppError::bad_request(
                "title must be between 3 and 200 characters",
            ));
        }
    }
    if let Some(content) = &payload.content {
        if content.len() < MIN_CONTENT_LEN {
            return Err(AppError::bad_request(
                "content must be at least 10 characters",
            ));
        }
    }

    let service = PostService::new(state.store.clone(), state.tokens.clone());
    let post = service
        .update_post(
            auth.user_id,
            post_id,
            PostChanges {
                title: payload.title.map(|t| t.trim().to_string()),
                slug: payload.slug,
                content: payload.content,
                excerpt: payload.excerpt,
                cover_image_url: payload.cover_image_url,
                allow_comments: payload.allow_comments,
            },
        )
        .await?;

    Ok(Json(PostResponse::from(&post)))
}

pub async fn publish_post(
    Path(post_id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PostResponse>, AppError> {
    let service = PostService::new(state.store.clone(), state.tokens.clone());
    let post = service.publish_post(auth.user_id, post_id).await?;

    Ok(Json(PostResponse::from(&post)))
}

pub async fn unpublish_post(
    Path(post_id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PostResponse>, AppError> {
    let service = PostService::new(state.store.clone(), state.tokens.clone());
    let post = service.unpublish_post(auth.user_id, post_id).await?;

    Ok(Json(PostResponse::from(&post)))
}

pub async fn delete_post(
    Path(post_id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = PostService::new(state.store.clone(), state.tokens.clone());
    service.delete_post(auth.user_id, post_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_favorite(
    Path(post_id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PostResponse>, AppError> {
    let service = PostService::new(state.store.clone(), state.tokens.clone());
    let post = service.toggle_favorite(auth.user_id, post_id).await?;

    Ok(Json(PostResponse::from(&post)))
}

// ---------------------------------------------------------------------------
// Public posts
// ---------------------------------------------------------------------------

pub async fn list_public_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let service = PostService::new(state.store.clone(), state.tokens.clone());
    let posts = service.list_public_posts().await?;

    Ok(Json(posts.iter().map(PostResponse::from).collect()))
}

#[derive(Deserialize)]
pub struct PublicViewQuery {
    pub viewer_guest_id: Option<String>,
    pub guest_name: Option<String>,
    pub referrer: Option<String>,
}

pub async fn get_public_post(
    Path(share_token): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<PublicViewQuery>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<PostDetailResponse>, AppError> {
    let ip_address = ip::client_ip(&headers, Some(peer));
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let service = EngagementService::new(state.store.clone(), state.tokens.clone(), state.geo.clone());
    let post = service
        .get_public_post(
            &share_token,
            &ip_address,
            ViewContext {
                viewer_guest_id: query.viewer_guest_id,
                guest_name: query.guest_name,
                referrer: query.referrer,
                user_agent,
            },
        )
        .await?;

    Ok(Json(PostDetailResponse::from(&post)))
}

#[derive(Deserialize)]
pub struct LikeRequest {
    pub user_id: Option<i64>,
    pub guest_name: Option<String>,
    pub guest_identifier: Option<String>,
}

pub async fn toggle_like(
    Path(share_token): Path<String>,
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<LikeRequest>,
) -> Result<Json<PostResponse>, AppError> {
    let identity = Identity::resolve(payload.user_id, payload.guest_identifier, payload.guest_name)
        .ok_or_else(|| AppError::bad_request("user_id or guest_identifier is required"))?;
    let ip_address = ip::client_ip(&headers, Some(peer));

    let service = EngagementService::new(state.store.clone(), state.tokens.clone(), state.geo.clone());
    let (post, _) = service
        .toggle_like(&share_token, identity, &ip_address)
        .await?;

    Ok(Json(PostResponse::from(&post)))
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub user_id: Option<i64>,
    pub guest_name: Option<String>,
    pub guest_identifier: Option<String>,
    pub content: String,
}

#[derive(Serialize)]
pub struct CommentCreatedResponse {
    pub message: &'static str,
    pub comment: CommentEntry,
}

pub async fn add_comment(
    Path(share_token): Path<String>,
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentCreatedResponse>), AppError> {
    let content = payload.content.trim();
    if content.is_empty() || content.len() > MAX_COMMENT_LEN {
        return Err(AppError::bad_request(
            "content must be between 1 and 1000 characters",
        ));
    }
    if payload.user_id.is_none()
        && payload
            .guest_name
            .as_deref()
            .map_or(true, |name| name.trim().is_empty())
    {
        return Err(AppError::bad_request("guest_name is required"));
    }
    let ip_address = ip::client_ip(&headers, Some(peer));

    let service = EngagementService::new(state.store.clone(), state.tokens.clone(), state.geo.clone());
    let (_, comment) = service
        .add_comment(
            &share_token,
            NewComment {
                user_id: payload.user_id,
                guest_name: payload.guest_name,
                guest_identifier: payload.guest_identifier,
                content: content.to_string(),
            },
            &ip_address,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentCreatedResponse {
            message: "comment added successfully",
            comment,
        }),
    ))
}

#[derive(Deserialize)]
pub struct ReplyRequest {
    pub parent_comment_id: String,
    pub user_id: Option<i64>,
    pub guest_name: Option<String>,
    pub content: String,
}

#[derive(Serialize)]
pub struct ReplyCreatedResponse {
    pub message: &'static str,
    pub reply: ReplyEntry,
}

pub async fn add_reply(
    Path(share_token): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<ReplyRequest>,
) -> Result<(StatusCode, Json<ReplyCreatedResponse>), AppError> {
    if payload.parent_comment_id.trim().is_empty() {
        return Err(AppError::bad_request("parent_comment_id is required"));
    }
    let content = payload.content.trim();
    if content.is_empty() || content.len() > MAX_COMMENT_LEN {
        return Err(AppError::bad_request(
            "content must be between 1 and 1000 characters",
        ));
    }
    if payload.user_id.is_none()
        && payload
            .guest_name
            .as_deref()
            .map_or(true, |name| name.trim().is_empty())
    {
        return Err(AppError::bad_request("guest_name is required"));
    }

    let service = EngagementService::new(state.store.clone(), state.tokens.clone(), state.geo.clone());
    let (_, reply) = service
        .add_reply(
            &share_token,
            NewReply {
                parent_comment_id: payload.parent_comment_id,
                user_id: payload.user_id,
                guest_name: payload.guest_name,
                content: content.to_string(),
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReplyCreatedResponse {
            message: "reply added successfully",
            reply,
        }),
    ))
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct DashboardParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub favorites_only: Option<bool>,
    pub sort_by: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub total_posts: u64,
    pub published_posts: u64,
    pub draft_posts: u64,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_favorites: u64,
    pub recent_posts: PagedPostsResponse,
    pub filtered_posts: PagedPostsResponse,
}

fn parse_date(value: Option<String>, field: &str) -> Result<Option<OffsetDateTime>, AppError> {
    let Some(value) = value else {
        return Ok(None);
    };
    OffsetDateTime::parse(&value, &Rfc3339)
        .map(Some)
        .map_err(|_| AppError::bad_request(format!("invalid {}: expected RFC 3339", field)))
}

pub async fn get_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse>, AppError> {
    let size = params.size.unwrap_or(10);
    if !(1..=100).contains(&size) {
        return Err(AppError::bad_request("size must be between 1 and 100"));
    }

    let query = DashboardQuery {
        search: params.search,
        status: params.status,
        from_date: parse_date(params.from_date, "from_date")?,
        to_date: parse_date(params.to_date, "to_date")?,
        favorites_only: params.favorites_only.unwrap_or(false),
        sort_by: SortBy::parse(params.sort_by.as_deref()),
        page: params.page.unwrap_or(0),
        size,
    };

    let service = DashboardService::new(state.store.clone());
    let dashboard = service.get_dashboard(auth.user_id, query).await?;

    Ok(Json(DashboardResponse {
        total_posts: dashboard.total_posts,
        published_posts: dashboard.published_posts,
        draft_posts: dashboard.draft_posts,
        total_views: dashboard.total_views,
        total_likes: dashboard.total_likes,
        total_comments: dashboard.total_comments,
        total_favorites: dashboard.total_favorites,
        recent_posts: dashboard.recent_posts.into(),
        filtered_posts: dashboard.filtered_posts.into(),
    }))
}
