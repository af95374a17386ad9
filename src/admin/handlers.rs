use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::resilience::{BreakerSnapshot, CircuitState};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    /// `operational` while the breaker is closed, `degraded` otherwise.
    pub status: &'static str,
    pub breaker: CircuitState,
}

/// `GET /admin/status`
pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let breaker = state.breaker.state();
    let status = match breaker {
        CircuitState::Closed => "operational",
        CircuitState::Open | CircuitState::HalfOpen => "degraded",
    };

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status,
        breaker,
    })
}

/// `GET /admin/breaker`
pub async fn get_breaker(State(state): State<AppState>) -> Json<BreakerSnapshot> {
    Json(state.breaker.snapshot())
}
