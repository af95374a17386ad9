//! Remote user API client.
//!
//! # Responsibilities
//! - Fetch a user profile by name from the user API
//! - Classify failures: transport errors and any non-success status count
//!   against the breaker; a 2xx with an unreadable body does not
//!
//! # Design Decisions
//! - `RemoteUserFetch` is a trait so the lookup policy can be wired to fakes
//! - The HTTP client never retries; the breaker decides what happens next

use std::time::Duration;
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::config::schema::UpstreamConfig;
use crate::users::model::User;

/// Errors reported by the user API or the path to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// Connection, DNS or I/O failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream answered with a 5xx status.
    #[error("server error: {status}")]
    Server { status: u16 },

    /// The upstream answered with a non-success, non-5xx status.
    #[error("could not get user data ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The upstream answered 2xx with a body that is not a user.
    #[error("invalid user payload: {0}")]
    Decode(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl UpstreamError {
    /// True when the upstream failed to serve the request: it was unreachable
    /// or answered with a non-success status. A 2xx with a bad payload and a
    /// request that was never sent do not count.
    pub fn counts_as_failure(&self) -> bool {
        match self {
            UpstreamError::Transport(_) | UpstreamError::Server { .. } | UpstreamError::Rejected { .. } => true,
            UpstreamError::Decode(_) | UpstreamError::InvalidRequest(_) => false,
        }
    }
}

/// Capability to load a user from the remote user API.
#[async_trait]
pub trait RemoteUserFetch: Send + Sync {
    async fn fetch(&self, username: &str) -> Result<User, UpstreamError>;
}

/// `GET {base_url}/users/{username}` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpUserFetch {
    client: reqwest::Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl HttpUserFetch {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| UpstreamError::InvalidRequest(format!("invalid base url '{}': {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidRequest(format!(
                "base url '{}' cannot carry a path",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .map_err(|e| UpstreamError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            bearer_token: config.bearer_token.clone(),
        })
    }

    fn user_url(&self, username: &str) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidRequest("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push("users")
            .push(username);
        Ok(url)
    }
}

#[async_trait]
impl RemoteUserFetch for HttpUserFetch {
    async fn fetch(&self, username: &str) -> Result<User, UpstreamError> {
        let url = self.user_url(username)?;

        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            tracing::warn!(url = %url, status = %status, "User API server error");
            return Err(UpstreamError::Server { status: status.as_u16() });
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}
