//! Login service with a circuit-breaker-guarded user lookup.

pub mod admin;
pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod users;

pub use auth::{AuthError, UserService};
pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resilience::{BreakerSettings, CallError, CircuitBreaker, CircuitState};
pub use users::{ResilientLookup, User};
