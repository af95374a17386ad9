//! Process lifecycle: signals in, graceful stop out.
//!
//! ```text
//! SIGINT / SIGTERM → signals.rs → Shutdown::trigger
//!     → HttpServer::run stops accepting, drains in-flight logins, returns
//! ```
//!
//! The breaker holds no resources that need releasing; it is simply dropped
//! with the server.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{shutdown_signal, spawn_signal_listener};
