//! Breaker transition notifications.
//!
//! Observers are told about every state change after the breaker lock has been
//! released. They cannot influence the breaker.

use std::time::SystemTime;
use serde::Serialize;

use crate::observability::metrics;
use crate::resilience::circuit_breaker::CircuitState;

/// Why the breaker changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// Closed breaker reached `max_failures`.
    FailureThreshold,
    /// Reset timeout elapsed, a trial call is admitted.
    ResetTimeoutElapsed,
    /// The trial call succeeded.
    TrialSucceeded,
    /// The trial call failed or timed out.
    TrialFailed,
}

impl TransitionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionReason::FailureThreshold => "failure_threshold",
            TransitionReason::ResetTimeoutElapsed => "reset_timeout_elapsed",
            TransitionReason::TrialSucceeded => "trial_succeeded",
            TransitionReason::TrialFailed => "trial_failed",
        }
    }
}

/// A single state change of a breaker.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionEvent {
    pub breaker: String,
    pub from: CircuitState,
    pub to: CircuitState,
    pub failure_count: u32,
    pub reason: TransitionReason,
    pub timestamp: SystemTime,
}

/// Sink for transition events.
pub trait TransitionObserver: Send + Sync {
    fn on_transition(&self, event: &TransitionEvent);
}

/// Default observer: structured log line plus metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TransitionObserver for TracingObserver {
    fn on_transition(&self, event: &TransitionEvent) {
        match event.to {
            CircuitState::Open => tracing::warn!(
                breaker = %event.breaker,
                from = %event.from,
                to = %event.to,
                failure_count = event.failure_count,
                reason = event.reason.as_str(),
                "Circuit breaker opened"
            ),
            _ => tracing::info!(
                breaker = %event.breaker,
                from = %event.from,
                to = %event.to,
                failure_count = event.failure_count,
                reason = event.reason.as_str(),
                "Circuit breaker state changed"
            ),
        }

        metrics::record_breaker_transition(&event.breaker, event.from, event.to);
    }
}

/// Observer that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TransitionObserver for NoopObserver {
    fn on_transition(&self, _event: &TransitionEvent) {}
}
