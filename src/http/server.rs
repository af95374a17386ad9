//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wire the service: one breaker, the user API client, credentials, fallback table
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bind server to listener and drain on shutdown

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::auth::{StaticCredentialStore, UserService};
use crate::config::{AdminConfig, ServiceConfig};
use crate::http::handlers::{health, login};
use crate::http::request::request_span;
use crate::resilience::{CircuitBreaker, InvalidSettings};
use crate::users::{FallbackTable, HttpUserFetch, RemoteUserFetch, ResilientLookup, UpstreamError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub breaker: Arc<CircuitBreaker>,
    pub admin: AdminConfig,
}

/// Errors while assembling the service from its configuration.
#[derive(Debug, Error)]
pub enum WiringError {
    #[error("invalid breaker settings: {0}")]
    Breaker(#[from] InvalidSettings),

    #[error("invalid upstream settings: {0}")]
    Upstream(#[from] UpstreamError),
}

/// HTTP server for the login service.
pub struct HttpServer {
    router: Router,
    breaker: Arc<CircuitBreaker>,
}

impl HttpServer {
    /// Create the server, fetching users over HTTP from `config.upstream`.
    pub fn new(config: ServiceConfig) -> Result<Self, WiringError> {
        let fetcher = Arc::new(HttpUserFetch::new(&config.upstream)?);
        Self::with_fetcher(config, fetcher)
    }

    /// Create the server around an arbitrary user source.
    pub fn with_fetcher(config: ServiceConfig, fetcher: Arc<dyn RemoteUserFetch>) -> Result<Self, WiringError> {
        let breaker = Arc::new(CircuitBreaker::new(
            config.breaker.name.clone(),
            config.breaker.settings(),
        )?);
        let credentials = Arc::new(StaticCredentialStore::from_config(&config.credentials));
        let fallback = Arc::new(FallbackTable::new(config.fallback_users.clone()));

        tracing::info!(
            breaker = %config.breaker.name,
            max_failures = config.breaker.max_failures,
            reset_timeout_ms = config.breaker.reset_timeout_ms,
            call_timeout_ms = config.breaker.call_timeout_ms,
            upstream = %config.upstream.base_url,
            credentials = credentials.len(),
            fallback_users = fallback.len(),
            "Service wired"
        );

        let lookup = ResilientLookup::new(breaker.clone(), fetcher, fallback);
        let state = AppState {
            users: Arc::new(UserService::new(credentials, lookup)),
            breaker: breaker.clone(),
            admin: config.admin.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, breaker })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let mut app = Router::new()
            .route("/login", post(login))
            .route("/health", get(health));

        if config.admin.enabled {
            app = app.merge(setup_admin_router(state.clone()));
        }

        app.with_state(state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(config.timeouts.request_secs),
                )),
        )
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The breaker guarding the user API.
    pub fn breaker(&self) -> Arc<CircuitBreaker> {
        self.breaker.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
