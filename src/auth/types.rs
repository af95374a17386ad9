//! Login error definitions.

use std::time::Duration;
use thiserror::Error;

use crate::users::remote::UpstreamError;

/// Errors surfaced to callers of `login` and `lookup`.
///
/// An open breaker is not in this list: it is absorbed by the lookup policy
/// and answered with a fallback user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Username/password pair rejected. The user API is never called.
    #[error("wrong credentials")]
    WrongCredentials,

    /// The user API did not answer within the call timeout.
    #[error("user lookup timed out after {0:?}")]
    Timeout(Duration),

    /// The user API, or the path to it, failed.
    #[error("user API error: {0}")]
    Upstream(#[from] UpstreamError),

    /// The lookup task died before producing a result.
    #[error("user lookup unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::WrongCredentials => "wrong_credentials",
            AuthError::Timeout(_) => "timeout",
            AuthError::Upstream(_) => "upstream_error",
            AuthError::Unavailable(_) => "unavailable",
        }
    }
}

/// Result type for login operations.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(AuthError::WrongCredentials.to_string(), "wrong credentials");

        let err = AuthError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "user lookup timed out after 5s");

        let err: AuthError = UpstreamError::Server { status: 502 }.into();
        assert_eq!(err.to_string(), "user API error: server error: 502");
        assert_eq!(err.kind(), "upstream_error");
    }
}
