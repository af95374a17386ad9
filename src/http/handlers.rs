//! Public endpoints: login and health.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthError;
use crate::http::request::X_USER_SOURCE;
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /login`
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Response {
    match state.users.login_with_source(&body.username, &body.password).await {
        Ok((user, source)) => ([(X_USER_SOURCE, source.as_str())], Json(user)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "breaker": state.breaker.state(),
    }))
}

fn error_response(err: &AuthError) -> Response {
    let status = match err {
        AuthError::WrongCredentials => StatusCode::UNAUTHORIZED,
        AuthError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        AuthError::Upstream(_) => StatusCode::BAD_GATEWAY,
        AuthError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        status,
        Json(json!({
            "error": err.kind(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}
