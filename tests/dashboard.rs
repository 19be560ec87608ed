//! Dashboard Tests
//!
//! Covers the unfiltered summary counters, search/status/date/favorites
//! filters, metric sorting, and pagination edge cases.

mod common;

use axum::http::StatusCode;
use common::{app, TestApp};
use serde_json::{json, Value};

/// Seed author 7 with three posts:
/// - "Rust tips"   published, 2 views (distinct guests), 1 like, 1 comment
/// - "Draft notes" draft
/// - "Cooking log" published, 1 view, favorited
async fn seed(app: &TestApp) -> (i64, i64, i64) {
    let (rust_id, rust_token) = app.publish_post(7, "Rust tips").await;
    app.view_post(&rust_token, Some("g1")).await;
    app.view_post(&rust_token, Some("g2")).await;
    let resp = app
        .post_json(
            &format!("/posts/public/{}/like", rust_token),
            json!({ "user_id": 9 }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let resp = app
        .post_json(
            &format!("/posts/public/{}/comments", rust_token),
            json!({ "guest_name": "Ann", "content": "Great tips" }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);

    let draft_id = app.create_post(7, "Draft notes").await;

    let (cooking_id, cooking_token) = app.publish_post(7, "Cooking log").await;
    app.view_post(&cooking_token, Some("g3")).await;
    let resp = app
        .post_json(&format!("/posts/{}/favorite", cooking_id), json!({}), Some(7))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    (rust_id, draft_id, cooking_id)
}

fn content_ids(page: &Value) -> Vec<i64> {
    page["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|post| post["id"].as_i64().unwrap())
        .collect()
}

// ===========================================================================
// Summary counters
// ===========================================================================

#[tokio::test]
async fn summary_counts_all_posts() {
    let app = app();
    seed(&app).await;

    let resp = app.get("/dashboard", Some(7)).await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["total_posts"].as_u64().unwrap(), 3);
    assert_eq!(body["published_posts"].as_u64().unwrap(), 2);
    assert_eq!(body["draft_posts"].as_u64().unwrap(), 1);
    assert_eq!(body["total_views"].as_u64().unwrap(), 3);
    assert_eq!(body["total_likes"].as_u64().unwrap(), 1);
    assert_eq!(body["total_comments"].as_u64().unwrap(), 1);
    assert_eq!(body["total_favorites"].as_u64().unwrap(), 1);
    assert_eq!(body["recent_posts"]["content"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn summary_ignores_filters() {
    let app = app();
    seed(&app).await;

    let resp = app.get("/dashboard?search=rust&status=published", Some(7)).await;

    let body = resp.json();
    // One filtered hit, but the counters still cover everything.
    assert_eq!(body["filtered_posts"]["total_elements"].as_u64().unwrap(), 1);
    assert_eq!(body["total_posts"].as_u64().unwrap(), 3);
    assert_eq!(body["total_views"].as_u64().unwrap(), 3);
}

#[tokio::test]
async fn dashboard_empty_author() {
    let app = app();

    let resp = app.get("/dashboard", Some(31)).await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["total_posts"].as_u64().unwrap(), 0);
    assert_eq!(body["total_favorites"].as_u64().unwrap(), 0);
    let filtered = &body["filtered_posts"];
    assert_eq!(filtered["content"].as_array().unwrap().len(), 0);
    assert_eq!(filtered["total_pages"].as_u64().unwrap(), 0);
    assert_eq!(filtered["first"].as_bool().unwrap(), true);
    assert_eq!(filtered["last"].as_bool().unwrap(), true);
}

#[tokio::test]
async fn dashboard_requires_auth() {
    let app = app();

    let resp = app.get("/dashboard", None).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

// ===========================================================================
// Filters
// ===========================================================================

#[tokio::test]
async fn search_matches_title_case_insensitively() {
    let app = app();
    let (rust_id, _, _) = seed(&app).await;

    let resp = app.get("/dashboard?search=RUST", Some(7)).await;

    let body = resp.json();
    assert_eq!(content_ids(&body["filtered_posts"]), vec![rust_id]);
}

#[tokio::test]
async fn search_matches_content() {
    let app = app();
    let (_, draft_id, _) = seed(&app).await;

    // The helper writes "Body of <title> ..." into the content.
    let resp = app.get("/dashboard?search=body%20of%20draft", Some(7)).await;

    let body = resp.json();
    assert_eq!(content_ids(&body["filtered_posts"]), vec![draft_id]);
}

#[tokio::test]
async fn status_filter_is_case_insensitive() {
    let app = app();
    let (_, draft_id, _) = seed(&app).await;

    let resp = app.get("/dashboard?status=draft", Some(7)).await;

    let body = resp.json();
    assert_eq!(content_ids(&body["filtered_posts"]), vec![draft_id]);
}

#[tokio::test]
async fn unknown_status_filter_is_ignored() {
    let app = app();
    seed(&app).await;

    let resp = app.get("/dashboard?status=simmering", Some(7)).await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["filtered_posts"]["total_elements"].as_u64().unwrap(), 3);
}

#[tokio::test]
async fn favorites_only_filter() {
    let app = app();
    let (_, _, cooking_id) = seed(&app).await;

    let resp = app.get("/dashboard?favorites_only=true", Some(7)).await;

    let body = resp.json();
    assert_eq!(content_ids(&body["filtered_posts"]), vec![cooking_id]);
}

#[tokio::test]
async fn date_range_filter() {
    let app = app();
    seed(&app).await;

    // Everything was created just now, so a future from_date excludes all...
    let resp = app
        .get("/dashboard?from_date=2100-01-01T00:00:00Z", Some(7))
        .await;
    let filtered = &resp.json()["filtered_posts"];
    assert_eq!(filtered["total_elements"].as_u64().unwrap(), 0);
    assert_eq!(filtered["last"].as_bool().unwrap(), true);

    // ...and a generous window keeps everything.
    let resp = app
        .get(
            "/dashboard?from_date=2000-01-01T00:00:00Z&to_date=2100-01-01T00:00:00Z",
            Some(7),
        )
        .await;
    assert_eq!(
        resp.json()["filtered_posts"]["total_elements"].as_u64().unwrap(),
        3
    );
}

#[tokio::test]
async fn invalid_date_is_rejected() {
    let app = app();

    let resp = app.get("/dashboard?from_date=yesterday", Some(7)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "invalid from_date: expected RFC 3339");
}

// ===========================================================================
// Sorting
// ===========================================================================

#[tokio::test]
async fn sort_by_top_views() {
    let app = app();
    let (rust_id, draft_id, cooking_id) = seed(&app).await;

    let resp = app.get("/dashboard?sort_by=TOP_VIEWS", Some(7)).await;

    let body = resp.json();
    // 2 views, 1 view, 0 views.
    assert_eq!(
        content_ids(&body["filtered_posts"]),
        vec![rust_id, cooking_id, draft_id]
    );
}

#[tokio::test]
async fn sort_by_top_likes_and_comments() {
    let app = app();
    let (rust_id, _, _) = seed(&app).await;

    let resp = app.get("/dashboard?sort_by=TOP_LIKES", Some(7)).await;
    assert_eq!(content_ids(&resp.json()["filtered_posts"])[0], rust_id);

    let resp = app.get("/dashboard?sort_by=top_comments", Some(7)).await;
    assert_eq!(content_ids(&resp.json()["filtered_posts"])[0], rust_id);
}

#[tokio::test]
async fn default_sort_is_recent() {
    let app = app();
    let (rust_id, draft_id, cooking_id) = seed(&app).await;

    let resp = app.get("/dashboard", Some(7)).await;

    let body = resp.json();
    // Creation order was rust, draft, cooking; newest first.
    assert_eq!(
        content_ids(&body["filtered_posts"]),
        vec![cooking_id, draft_id, rust_id]
    );
}

// ===========================================================================
// Pagination
// ===========================================================================

#[tokio::test]
async fn pagination_splits_pages() {
    let app = app();
    seed(&app).await;

    let resp = app.get("/dashboard?size=2&page=0", Some(7)).await;
    let page = resp.json();
    let page = &page["filtered_posts"];
    assert_eq!(page["content"].as_array().unwrap().len(), 2);
    assert_eq!(page["total_elements"].as_u64().unwrap(), 3);
    assert_eq!(page["total_pages"].as_u64().unwrap(), 2);
    assert_eq!(page["first"].as_bool().unwrap(), true);
    assert_eq!(page["last"].as_bool().unwrap(), false);

    let resp = app.get("/dashboard?size=2&page=1", Some(7)).await;
    let page = resp.json();
    let page = &page["filtered_posts"];
    assert_eq!(page["content"].as_array().unwrap().len(), 1);
    assert_eq!(page["first"].as_bool().unwrap(), false);
    assert_eq!(page["last"].as_bool().unwrap(), true);
}

#[tokio::test]
async fn page_past_the_end_is_empty_and_last() {
    let app = app();
    seed(&app).await;

    let resp = app.get("/dashboard?size=2&page=5", Some(7)).await;

    let page = resp.json();
    let page = &page["filtered_posts"];
    assert_eq!(page["content"].as_array().unwrap().len(), 0);
    assert_eq!(page["total_pages"].as_u64().unwrap(), 2);
    assert_eq!(page["first"].as_bool().unwrap(), false);
    assert_eq!(page["last"].as_bool().unwrap(), true);
}

#[tokio::test]
async fn size_out_of_range_is_rejected() {
    let app = app();

    let resp = app.get("/dashboard?size=0", Some(7)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app.get("/dashboard?size=500", Some(7)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "size must be between 1 and 100");
}

// ===========================================================================
// Recent posts stay unfiltered
// ===========================================================================

#[tokio::test]
async fn recent_posts_ignore_filters_and_cap_at_five() {
    let app = app();
    for n in 1..=6 {
        app.create_post(7, &format!("Entry number {n}")).await;
    }

    let resp = app.get("/dashboard?search=number%201", Some(7)).await;

    let body = resp.json();
    // "Entry number 1" only (title match is substring, so "number 1" does not
    // match "number 2".. but does match nothing else here).
    assert_eq!(body["filtered_posts"]["total_elements"].as_u64().unwrap(), 1);
    let recent = body["recent_posts"]["content"].as_array().unwrap();
    assert_eq!(recent.len(), 5);
    assert_eq!(body["recent_posts"]["first"].as_bool().unwrap(), true);
    assert_eq!(body["recent_posts"]["last"].as_bool().unwrap(), true);
}
