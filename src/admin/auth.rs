//! API key check for the admin routes.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use crate::http::request::request_id;
use crate::http::server::AppState;

/// Reject admin requests that do not carry `Authorization: Bearer <api_key>`.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    match bearer_token(request.headers()) {
        Some(token) if token == state.admin.api_key => Ok(next.run(request).await),
        presented => {
            tracing::warn!(
                request_id = %request_id(&request),
                path = %request.uri().path(),
                token_present = presented.is_some(),
                "Admin request rejected"
            );
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}
