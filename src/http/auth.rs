use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderName;

use crate::http::AppError;
use crate::AppState;

/// The authenticated author, resolved upstream and forwarded as a header.
/// Session issuance and verification live outside this service; by the time
/// a request lands here the gateway has already vouched for the id.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
}

const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing x-user-id header"))?;

        let user_id = header
            .parse::<i64>()
            .map_err(|_| AppError::unauthorized("invalid x-user-id header"))?;

        Ok(AuthUser { user_id })
    }
}
