//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! login / lookup / breaker
//!     → logging.rs (tracing subscriber: pretty or JSON, env filter)
//!     → metrics.rs (Prometheus counters, gauges, histograms)
//!
//! breaker transitions
//!     → resilience::events::TracingObserver
//!     → one log line + metrics::record_breaker_transition
//! ```
//!
//! Nothing here feeds back into control flow: with no exporter installed
//! the metric macros are no-ops.

pub mod logging;
pub mod metrics;
