#![allow(dead_code)]

use anyhow::Result;
use axum::body::Body;
use axum::extract::connect_info::ConnectInfo;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use encre::app::geo::{GeoLocation, GeoLocator};
use encre::app::tokens::TokenSource;
use encre::infra::store::MemoryPostStore;
use encre::AppState;

// ---------------------------------------------------------------------------
// TestApp — fresh in-memory state per test
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn error_message(&self) -> String {
        self.json()["error"].as_str().unwrap_or("").to_string()
    }
}

/// Deterministic token source: sequential ids with the production shapes
/// (16-char share tokens, 12-char guest identifiers, c/r-prefixed ids).
pub struct SeqTokens {
    counter: AtomicU64,
}

impl SeqTokens {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }

    fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }
}

impl TokenSource for SeqTokens {
    fn share_token(&self) -> String {
        format!("share{:011}", self.next())
    }

    fn guest_identifier(&self) -> String {
        format!("guest{:07}", self.next())
    }

    fn comment_id(&self) -> String {
        format!("c{:08x}", self.next())
    }

    fn reply_id(&self) -> String {
        format!("r{:08x}", self.next())
    }
}

/// Resolves every public IP to the same fixed location; private and loopback
/// addresses still degrade to "Unknown" before reaching it.
pub struct FixedGeoLocator;

impl GeoLocator for FixedGeoLocator {
    fn locate(&self, _ip_address: &str) -> Result<GeoLocation> {
        Ok(GeoLocation {
            country: "France".to_string(),
            city: "Paris".to_string(),
            region: "Ile-de-France".to_string(),
        })
    }
}

/// Always errors, to exercise the degrade-to-Unknown path.
pub struct FailingGeoLocator;

impl GeoLocator for FailingGeoLocator {
    fn locate(&self, _ip_address: &str) -> Result<GeoLocation> {
        Err(anyhow::anyhow!("geolocation backend unavailable"))
    }
}

pub fn app() -> TestApp {
    app_with_geo(Arc::new(FixedGeoLocator))
}

pub fn app_with_geo(geo: Arc<dyn GeoLocator>) -> TestApp {
    let state = AppState {
        store: Arc::new(MemoryPostStore::new()),
        tokens: Arc::new(SeqTokens::new()),
        geo,
    };
    let router = encre::http::router(state.clone());

    TestApp { router, state }
}

impl TestApp {
    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        for &(key, value) in headers {
            builder = builder.header(key, value);
        }

        let request = if let Some(body) = body {
            builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        // Inject ConnectInfo so client-IP resolution has a peer address.
        let mut request = request;
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 0))));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse { status, body_bytes }
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers — `user` fills the x-user-id header
    // ------------------------------------------------------------------
    pub async fn get(&self, path: &str, user: Option<i64>) -> TestResponse {
        let user_id;
        let mut headers = vec![];
        if let Some(id) = user {
            user_id = id.to_string();
            headers.push(("x-user-id", user_id.as_str()));
        }
        self.request(Method::GET, path, None, &headers).await
    }

    pub async fn post_json(&self, path: &str, body: Value, user: Option<i64>) -> TestResponse {
        let user_id;
        let mut headers = vec![];
        if let Some(id) = user {
            user_id = id.to_string();
            headers.push(("x-user-id", user_id.as_str()));
        }
        self.request(Method::POST, path, Some(body), &headers).await
    }

    pub async fn patch_json(&self, path: &str, body: Value, user: Option<i64>) -> TestResponse {
        let user_id;
        let mut headers = vec![];
        if let Some(id) = user {
            user_id = id.to_string();
            headers.push(("x-user-id", user_id.as_str()));
        }
        self.request(Method::PATCH, path, Some(body), &headers)
            .await
    }

    pub async fn delete(&self, path: &str, user: Option<i64>) -> TestResponse {
        let user_id;
        let mut headers = vec![];
        if let Some(id) = user {
            user_id = id.to_string();
            headers.push(("x-user-id", user_id.as_str()));
        }
        self.request(Method::DELETE, path, None, &headers).await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    /// Create a draft post through the API. Returns its id.
    pub async fn create_post(&self, author: i64, title: &str) -> i64 {
        let resp = self
            .post_json(
                "/posts",
                serde_json::json!({
                    "title": title,
                    "content": format!("Body of {title}, long enough to pass validation."),
                }),
                Some(author),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "create_post failed");
        resp.json()["id"].as_i64().expect("post id")
    }

    /// Create and publish a post. Returns (post_id, share_token).
    pub async fn publish_post(&self, author: i64, title: &str) -> (i64, String) {
        let post_id = self.create_post(author, title).await;
        let resp = self
            .post_json(
                &format!("/posts/{}/publish", post_id),
                serde_json::json!({}),
                Some(author),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "publish_post failed");
        let share_token = resp.json()["share_token"]
            .as_str()
            .expect("share token")
            .to_string();
        (post_id, share_token)
    }

    /// Record one public view with the given viewer guest id.
    pub async fn view_post(&self, share_token: &str, viewer_guest_id: Option<&str>) {
        let path = match viewer_guest_id {
            Some(viewer) => format!(
                "/posts/public/{}?viewer_guest_id={}",
                share_token, viewer
            ),
            None => format!("/posts/public/{}", share_token),
        };
        let resp = self.get(&path, None).await;
        assert_eq!(resp.status, StatusCode::OK, "view_post failed");
    }
}
