//! Timeout enforcement.
//!
//! # Responsibilities
//! - Run a unit of work as its own task
//! - Race its completion against the call deadline
//! - Report success, the work's error, or a timeout in bounded time
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Completion is polled before the timer, so a tie at the deadline goes to the work
//! - A timed-out task is abandoned by default; `TimeoutAction::Cancel` aborts it

use std::future::Future;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tokio::task::JoinError;

use crate::resilience::error::CallError;

/// What happens to the work once its deadline has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutAction {
    /// Let the task run to completion in the background, discarding its result.
    #[default]
    Abandon,
    /// Abort the task at its next suspension point.
    Cancel,
}

/// Runs work with a hard deadline.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutExecutor {
    call_timeout: Duration,
    on_timeout: TimeoutAction,
}

impl TimeoutExecutor {
    pub fn new(call_timeout: Duration, on_timeout: TimeoutAction) -> Self {
        Self {
            call_timeout,
            on_timeout,
        }
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Execute `work` on a separate task and wait at most `call_timeout` for it.
    pub async fn execute<F, T, E>(&self, work: F) -> Result<T, CallError<E>>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let mut handle = tokio::spawn(work);

        match tokio::time::timeout(self.call_timeout, &mut handle).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(e))) => Err(CallError::Inner(e)),
            Ok(Err(join_err)) => Err(aborted(join_err)),
            Err(_) => {
                match self.on_timeout {
                    TimeoutAction::Abandon => {
                        tracing::debug!(timeout = ?self.call_timeout, "Call deadline passed, abandoning task");
                    }
                    TimeoutAction::Cancel => {
                        tracing::debug!(timeout = ?self.call_timeout, "Call deadline passed, aborting task");
                        handle.abort();
                    }
                }
                Err(CallError::Timeout(self.call_timeout))
            }
        }
    }
}

fn aborted<E>(err: JoinError) -> CallError<E> {
    if err.is_panic() {
        CallError::Aborted("task panicked".to_string())
    } else {
        CallError::Aborted(err.to_string())
    }
}
