//! Concurrent callers sharing one breaker.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use resilient_auth::auth::AuthError;
use resilient_auth::resilience::{BreakerSettings, CircuitBreaker, CircuitState, DispatchMode, HalfOpenAdmission};
use resilient_auth::users::{FallbackTable, ResilientLookup, UserSource};

mod common;
use common::{Behavior, ScriptedFetch};

fn lookup(settings: BreakerSettings, fetch: Arc<ScriptedFetch>) -> ResilientLookup {
    let breaker = Arc::new(CircuitBreaker::new("users-api", settings).unwrap());
    ResilientLookup::new(breaker, fetch, Arc::new(FallbackTable::default()))
}

fn settings() -> BreakerSettings {
    BreakerSettings::new(3, Duration::from_secs(10), Duration::from_secs(5))
}

async fn open_breaker(lookup: &ResilientLookup, fetch: &ScriptedFetch) {
    fetch.set(Behavior::Fail);
    for _ in 0..3 {
        let _ = lookup.lookup("admin").await;
    }
    assert_eq!(lookup.breaker().state(), CircuitState::Open);
}

async fn resolve_concurrently(
    lookup: &ResilientLookup,
    callers: usize,
) -> Vec<Result<(resilient_auth::User, UserSource), AuthError>> {
    let mut handles = Vec::new();
    for _ in 0..callers {
        let lookup = lookup.clone();
        handles.push(tokio::spawn(async move { lookup.resolve("admin").await }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

#[tokio::test(start_paused = true)]
async fn test_healthy_upstream_serves_every_caller() {
    let fetch = ScriptedFetch::new(Behavior::Slow(Duration::from_millis(50)));
    let lookup = lookup(settings(), fetch.clone());

    let results = resolve_concurrently(&lookup, 20).await;

    assert!(results.iter().all(|r| matches!(r, Ok((_, UserSource::Upstream)))));
    assert_eq!(fetch.calls(), 20);
    assert_eq!(lookup.breaker().state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_single_flight_sends_one_trial() {
    let fetch = ScriptedFetch::new(Behavior::Fail);
    let lookup = lookup(settings(), fetch.clone());
    open_breaker(&lookup, &fetch).await;

    fetch.set(Behavior::Hang);
    tokio::time::advance(Duration::from_secs(10)).await;

    let results = resolve_concurrently(&lookup, 10).await;

    let fallbacks = results
        .iter()
        .filter(|r| matches!(r, Ok((_, UserSource::Fallback))))
        .count();
    let timeouts = results
        .iter()
        .filter(|r| matches!(r, Err(AuthError::Timeout(_))))
        .count();
    assert_eq!(fallbacks, 9);
    assert_eq!(timeouts, 1);
    assert_eq!(fetch.calls(), 3 + 1);
    assert_eq!(lookup.breaker().state(), CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_best_effort_admits_every_trial() {
    let fetch = ScriptedFetch::new(Behavior::Fail);
    let lookup = lookup(
        settings().with_half_open_admission(HalfOpenAdmission::BestEffort),
        fetch.clone(),
    );
    open_breaker(&lookup, &fetch).await;

    fetch.set(Behavior::Hang);
    tokio::time::advance(Duration::from_secs(10)).await;

    let results = resolve_concurrently(&lookup, 10).await;

    assert!(results.iter().all(|r| matches!(r, Err(AuthError::Timeout(_)))));
    assert_eq!(fetch.calls(), 3 + 10);
    assert_eq!(lookup.breaker().state(), CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_dispatch_overlaps_calls() {
    let fetch = ScriptedFetch::new(Behavior::Slow(Duration::from_secs(1)));
    let lookup = lookup(settings(), fetch.clone());

    let start = Instant::now();
    let results = resolve_concurrently(&lookup, 3).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_serialized_dispatch_runs_one_call_at_a_time() {
    let fetch = ScriptedFetch::new(Behavior::Slow(Duration::from_secs(1)));
    let lookup = lookup(settings().with_dispatch(DispatchMode::Serialized), fetch.clone());

    let start = Instant::now();
    let results = resolve_concurrently(&lookup, 3).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert!(start.elapsed() >= Duration::from_secs(3));
}
