//! Errors produced by guarded calls.

use std::time::Duration;
use thiserror::Error;

/// Failure of a call routed through the breaker and the timeout executor.
#[derive(Debug, Error)]
pub enum CallError<E> {
    /// Rejected without invoking the work.
    #[error("circuit breaker is open")]
    Open,

    /// The work did not finish before the call deadline.
    #[error("call timeout exceeded after {0:?}")]
    Timeout(Duration),

    /// The task running the work panicked or was aborted.
    #[error("call aborted: {0}")]
    Aborted(String),

    /// The work's own error.
    #[error("{0}")]
    Inner(E),
}

impl<E> CallError<E> {
    /// True when the dependency was never contacted.
    pub fn is_rejection(&self) -> bool {
        matches!(self, CallError::Open)
    }
}

/// Breaker settings that violate the construction contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSettings {
    #[error("max_failures must be greater than zero")]
    ZeroMaxFailures,

    #[error("reset_timeout must be greater than zero")]
    ZeroResetTimeout,

    #[error("call_timeout must be greater than zero")]
    ZeroCallTimeout,
}
