//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to upstream:
//!     → circuit_breaker.rs (admit or reject; Open → Half-Open when due)
//!     → timeouts.rs (spawn the work, race it against the call deadline)
//!     → circuit_breaker.rs (record success / failure, maybe transition)
//!     → events.rs (notify observer of any transition)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - A timeout counts as a failure for the breaker
//! - No retries here: a rejected or failed call returns immediately
//! - Transition events are notifications only and never change control flow

pub mod circuit_breaker;
pub mod error;
pub mod events;
pub mod timeouts;

pub use circuit_breaker::{
    BreakerSettings, BreakerSnapshot, CircuitBreaker, CircuitState, DispatchMode, HalfOpenAdmission,
};
pub use error::{CallError, InvalidSettings};
pub use events::{NoopObserver, TracingObserver, TransitionEvent, TransitionObserver, TransitionReason};
pub use timeouts::{TimeoutAction, TimeoutExecutor};
