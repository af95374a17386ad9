//! Breaker-guarded user lookup with fallback substitution.
//!
//! # Responsibilities
//! - Route every user fetch through the shared breaker and its call deadline
//! - Answer from the fallback table while the breaker rejects calls
//! - Propagate real failures (timeouts, upstream errors) unchanged

use std::sync::Arc;

use crate::auth::types::{AuthError, AuthResult};
use crate::observability::metrics;
use crate::resilience::{CallError, CircuitBreaker};
use crate::users::fallback::FallbackTable;
use crate::users::model::User;
use crate::users::remote::{RemoteUserFetch, UpstreamError};

/// Where a looked-up user came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSource {
    Upstream,
    Fallback,
}

impl UserSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserSource::Upstream => "upstream",
            UserSource::Fallback => "fallback",
        }
    }
}

/// Lookup policy around the remote user API.
#[derive(Clone)]
pub struct ResilientLookup {
    breaker: Arc<CircuitBreaker>,
    fetcher: Arc<dyn RemoteUserFetch>,
    fallback: Arc<FallbackTable>,
}

impl ResilientLookup {
    pub fn new(
        breaker: Arc<CircuitBreaker>,
        fetcher: Arc<dyn RemoteUserFetch>,
        fallback: Arc<FallbackTable>,
    ) -> Self {
        Self {
            breaker,
            fetcher,
            fallback,
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Fetch `username`, or its fallback record if the breaker is open.
    pub async fn lookup(&self, username: &str) -> AuthResult<User> {
        self.resolve(username).await.map(|(user, _)| user)
    }

    /// Like [`lookup`](Self::lookup), also reporting where the user came from.
    pub async fn resolve(&self, username: &str) -> AuthResult<(User, UserSource)> {
        let fetcher = self.fetcher.clone();
        let name = username.to_string();

        let result = self
            .breaker
            .call_classified(
                async move { fetcher.fetch(&name).await },
                UpstreamError::counts_as_failure,
            )
            .await;

        match result {
            Ok(user) => Ok((user, UserSource::Upstream)),
            Err(CallError::Open) => {
                let (user, known) = self.fallback.resolve(username);
                tracing::warn!(
                    username = %username,
                    breaker = %self.breaker.name(),
                    known,
                    "User API unavailable, serving fallback user"
                );
                metrics::record_fallback(known);
                Ok((user, UserSource::Fallback))
            }
            Err(CallError::Timeout(after)) => {
                tracing::warn!(username = %username, timeout = ?after, "User lookup timed out");
                Err(AuthError::Timeout(after))
            }
            Err(CallError::Aborted(reason)) => {
                tracing::error!(username = %username, reason = %reason, "User lookup aborted");
                Err(AuthError::Unavailable(reason))
            }
            Err(CallError::Inner(e)) => {
                tracing::warn!(username = %username, error = %e, "User lookup failed");
                Err(AuthError::Upstream(e))
            }
        }
    }
}
