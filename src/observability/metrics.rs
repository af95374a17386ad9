//! Metrics collection and exposition.
//!
//! # Metrics
//! - `breaker_transitions_total` (counter): state changes by breaker, from, to
//! - `breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `breaker_calls_total` (counter): guarded calls by outcome
//! - `user_lookup_fallback_total` (counter): fallback responses, known vs synthesized
//! - `login_requests_total` (counter): logins by result
//! - `login_duration_seconds` (histogram): login latency
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing.

use std::net::SocketAddr;
use std::time::Instant;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::CircuitState;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

fn state_value(state: CircuitState) -> f64 {
    match state {
        CircuitState::Closed => 0.0,
        CircuitState::Open => 1.0,
        CircuitState::HalfOpen => 2.0,
    }
}

pub fn record_breaker_state(breaker: &str, state: CircuitState) {
    metrics::gauge!("breaker_state", "breaker" => breaker.to_string()).set(state_value(state));
}

pub fn record_breaker_transition(breaker: &str, from: CircuitState, to: CircuitState) {
    metrics::counter!(
        "breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
    record_breaker_state(breaker, to);
}

pub fn record_breaker_call(breaker: &str, outcome: &'static str) {
    metrics::counter!(
        "breaker_calls_total",
        "breaker" => breaker.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_fallback(known: bool) {
    metrics::counter!(
        "user_lookup_fallback_total",
        "known" => if known { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_login(result: &'static str, start: Instant) {
    metrics::counter!("login_requests_total", "result" => result).increment(1);
    metrics::histogram!("login_duration_seconds").record(start.elapsed().as_secs_f64());
}
