//! Admin endpoints: service status and breaker inspection.
//!
//! Mounted only when `admin.enabled` is set. Every route sits behind
//! [`auth::require_api_key`].

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use crate::http::server::AppState;
use self::auth::require_api_key;
use self::handlers::{get_breaker, get_status};

/// Admin routes, still expecting [`AppState`] from the outer router.
pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/breaker", get(get_breaker))
        .route_layer(middleware::from_fn_with_state(state, require_api_key))
}
