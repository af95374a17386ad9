//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, per-request span)
//!     → handlers.rs (POST /login, GET /health)
//!     → admin (GET /admin/*, API key required)
//!     → JSON response
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use request::{X_REQUEST_ID, X_USER_SOURCE};
pub use server::{AppState, HttpServer, WiringError};
