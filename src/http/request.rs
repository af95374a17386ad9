//! Request identification.
//!
//! # Responsibilities
//! - Name the headers the service reads and writes
//! - Build the per-request tracing span, keyed by request ID
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing (outermost layer)
//! - Incoming IDs are kept; missing ones are generated as UUID v4

use axum::body::Body;
use axum::http::Request;
use tracing::Span;

/// Correlation header set on every request and echoed on the response.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Response header telling whether the user came from the user API or the fallback table.
pub const X_USER_SOURCE: &str = "x-user-source";

/// Read the request ID, if the request-id layer has run.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span used by the trace layer for each request.
pub fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request_id(request),
        method = %request.method(),
        path = %request.uri().path(),
    )
}
