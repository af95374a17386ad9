//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls fail fast
//! - Half-Open: testing if upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= max_failures
//! Open → Half-Open: first attempt at or after next_attempt_at
//! Half-Open → Closed: trial call succeeds (failure_count = 0)
//! Half-Open → Open: trial call fails (next_attempt_at = now + reset_timeout)
//! ```
//!
//! # Design Decisions
//! - One breaker per upstream, built at wiring time and shared through `Arc`
//! - The lock covers the admission decision and outcome recording only; the call
//!   itself runs outside it unless `DispatchMode::Serialized` is configured
//! - Single trial in Half-Open by default (`HalfOpenAdmission::SingleFlight`)
//! - Every state change starts a new generation; an outcome only counts in the
//!   generation its call was admitted in
//! - A call cancelled by its caller is not an upstream failure; a cancelled
//!   Half-Open trial just hands its token back
//! - Fail fast in Open state (no waiting for timeout)

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};
use serde::{Deserialize, Serialize, Serializer};
use tokio::time::Instant;

use crate::observability::metrics;
use crate::resilience::error::{CallError, InvalidSettings};
use crate::resilience::events::{TracingObserver, TransitionEvent, TransitionObserver, TransitionReason};
use crate::resilience::timeouts::{TimeoutAction, TimeoutExecutor};

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who gets through while the breaker is Half-Open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HalfOpenAdmission {
    /// Exactly one trial call; everyone else is rejected until it settles.
    #[default]
    SingleFlight,
    /// Every caller is admitted until the first outcome is recorded.
    BestEffort,
}

/// Whether calls may overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Calls run outside the breaker lock and may be in flight concurrently.
    #[default]
    Concurrent,
    /// One call at a time, held across the full call including the deadline wait.
    Serialized,
}

/// Immutable breaker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerSettings {
    pub max_failures: u32,
    pub reset_timeout: Duration,
    pub call_timeout: Duration,
    pub half_open_admission: HalfOpenAdmission,
    pub dispatch: DispatchMode,
    pub on_timeout: TimeoutAction,
}

impl BreakerSettings {
    pub fn new(max_failures: u32, reset_timeout: Duration, call_timeout: Duration) -> Self {
        Self {
            max_failures,
            reset_timeout,
            call_timeout,
            half_open_admission: HalfOpenAdmission::default(),
            dispatch: DispatchMode::default(),
            on_timeout: TimeoutAction::default(),
        }
    }

    pub fn with_half_open_admission(mut self, admission: HalfOpenAdmission) -> Self {
        self.half_open_admission = admission;
        self
    }

    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn with_timeout_action(mut self, action: TimeoutAction) -> Self {
        self.on_timeout = action;
        self
    }

    pub fn validate(&self) -> Result<(), InvalidSettings> {
        if self.max_failures == 0 {
            return Err(InvalidSettings::ZeroMaxFailures);
        }
        if self.reset_timeout.is_zero() {
            return Err(InvalidSettings::ZeroResetTimeout);
        }
        if self.call_timeout.is_zero() {
            return Err(InvalidSettings::ZeroCallTimeout);
        }
        Ok(())
    }
}

/// Point-in-time view of a breaker, for admin endpoints and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub max_failures: u32,
    /// Time left before the next trial is admitted (Open only).
    #[serde(rename = "next_attempt_in_ms", serialize_with = "serialize_millis")]
    pub next_attempt_in: Option<Duration>,
    pub trial_in_flight: bool,
}

fn serialize_millis<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    opened_at: Option<Instant>,
    next_attempt_at: Option<Instant>,
    trial_in_flight: bool,
    generation: u64,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            opened_at: None,
            next_attempt_at: None,
            trial_in_flight: false,
            generation: 0,
        }
    }

    fn advance_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn trip(&mut self, now: Instant, reset_timeout: Duration) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.next_attempt_at = Some(now + reset_timeout);
        self.trial_in_flight = false;
        self.advance_generation();
    }
}

/// Generation a call was admitted in.
#[derive(Debug, Clone, Copy)]
struct Admission {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure,
    Cancelled,
}

/// A state change decided under the lock, announced after it is released.
struct Transition {
    from: CircuitState,
    to: CircuitState,
    failure_count: u32,
    reason: TransitionReason,
}

/// Circuit breaker guarding one upstream dependency.
pub struct CircuitBreaker {
    name: String,
    settings: BreakerSettings,
    executor: TimeoutExecutor,
    inner: Mutex<BreakerState>,
    serial_gate: Option<tokio::sync::Mutex<()>>,
    observer: Arc<dyn TransitionObserver>,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker {
    /// Create a breaker in the Closed state, reporting transitions to the log.
    pub fn new(name: impl Into<String>, settings: BreakerSettings) -> Result<Self, InvalidSettings> {
        settings.validate()?;

        let name = name.into();
        let serial_gate = match settings.dispatch {
            DispatchMode::Serialized => Some(tokio::sync::Mutex::new(())),
            DispatchMode::Concurrent => None,
        };

        tracing::debug!(
            breaker = %name,
            max_failures = settings.max_failures,
            reset_timeout = ?settings.reset_timeout,
            call_timeout = ?settings.call_timeout,
            half_open = ?settings.half_open_admission,
            dispatch = ?settings.dispatch,
            "Circuit breaker created"
        );
        metrics::record_breaker_state(&name, CircuitState::Closed);

        Ok(Self {
            executor: TimeoutExecutor::new(settings.call_timeout, settings.on_timeout),
            name,
            settings,
            inner: Mutex::new(BreakerState::new()),
            serial_gate,
            observer: Arc::new(TracingObserver),
        })
    }

    /// Replace the transition observer.
    pub fn with_observer(mut self, observer: Arc<dyn TransitionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &BreakerSettings {
        &self.settings
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let state = self.lock();
        let next_attempt_in = match state.state {
            CircuitState::Open => state
                .next_attempt_at
                .map(|at| at.saturating_duration_since(Instant::now())),
            _ => None,
        };

        BreakerSnapshot {
            name: self.name.clone(),
            state: state.state,
            failure_count: state.failure_count,
            max_failures: self.settings.max_failures,
            next_attempt_in,
            trial_in_flight: state.trial_in_flight,
        }
    }

    /// Decide whether a call may proceed, moving Open → Half-Open when the reset
    /// timeout has elapsed.
    pub fn attempt_allowed(&self) -> bool {
        self.admit().is_some()
    }

    /// Record a successful call against the current state.
    pub fn record_success(&self) {
        let transition = self.on_success(&mut self.lock());
        self.notify(transition);
    }

    /// Record a failed or timed-out call against the current state.
    pub fn record_failure(&self) {
        let transition = self.on_failure(&mut self.lock());
        self.notify(transition);
    }

    fn admit(&self) -> Option<Admission> {
        let (admission, transition) = {
            let mut state = self.lock();
            let now = Instant::now();

            let (allowed, transition) = match state.state {
                CircuitState::Closed => (true, None),
                CircuitState::Open => {
                    let due = state.next_attempt_at.map_or(true, |at| now >= at);
                    if due {
                        let open_for = state.opened_at.map(|at| now.saturating_duration_since(at));
                        tracing::debug!(breaker = %self.name, open_for = ?open_for, "Reset timeout elapsed, admitting trial call");
                        state.state = CircuitState::HalfOpen;
                        state.trial_in_flight = true;
                        state.advance_generation();
                        (
                            true,
                            Some(Transition {
                                from: CircuitState::Open,
                                to: CircuitState::HalfOpen,
                                failure_count: state.failure_count,
                                reason: TransitionReason::ResetTimeoutElapsed,
                            }),
                        )
                    } else {
                        (false, None)
                    }
                }
                CircuitState::HalfOpen => match self.settings.half_open_admission {
                    HalfOpenAdmission::BestEffort => (true, None),
                    HalfOpenAdmission::SingleFlight if state.trial_in_flight => (false, None),
                    HalfOpenAdmission::SingleFlight => {
                        state.trial_in_flight = true;
                        (true, None)
                    }
                },
            };

            let admission = allowed.then_some(Admission {
                generation: state.generation,
            });
            (admission, transition)
        };

        self.notify(transition);
        admission
    }

    /// Apply the outcome of an admitted call, unless the breaker has changed
    /// state since the call was admitted.
    fn settle(&self, admission: Admission, outcome: Outcome) {
        let transition = {
            let mut state = self.lock();
            if state.generation != admission.generation {
                tracing::debug!(
                    breaker = %self.name,
                    outcome = ?outcome,
                    state = %state.state,
                    "Ignoring outcome of a call admitted before the last transition"
                );
                return;
            }

            match outcome {
                Outcome::Success => self.on_success(&mut state),
                Outcome::Failure => self.on_failure(&mut state),
                Outcome::Cancelled => {
                    if state.state == CircuitState::HalfOpen {
                        tracing::debug!(breaker = %self.name, "Trial call cancelled, releasing trial token");
                        state.trial_in_flight = false;
                    }
                    None
                }
            }
        };

        self.notify(transition);
    }

    fn on_success(&self, state: &mut BreakerState) -> Option<Transition> {
        match state.state {
            CircuitState::HalfOpen => {
                state.state = CircuitState::Closed;
                state.failure_count = 0;
                state.opened_at = None;
                state.next_attempt_at = None;
                state.trial_in_flight = false;
                state.advance_generation();
                Some(Transition {
                    from: CircuitState::HalfOpen,
                    to: CircuitState::Closed,
                    failure_count: 0,
                    reason: TransitionReason::TrialSucceeded,
                })
            }
            CircuitState::Closed => None,
            CircuitState::Open => {
                tracing::debug!(breaker = %self.name, "Ignoring late success while open");
                None
            }
        }
    }

    fn on_failure(&self, state: &mut BreakerState) -> Option<Transition> {
        let now = Instant::now();
        match state.state {
            CircuitState::Closed => {
                state.failure_count = state.failure_count.saturating_add(1);
                if state.failure_count >= self.settings.max_failures {
                    state.trip(now, self.settings.reset_timeout);
                    Some(Transition {
                        from: CircuitState::Closed,
                        to: CircuitState::Open,
                        failure_count: state.failure_count,
                        reason: TransitionReason::FailureThreshold,
                    })
                } else {
                    tracing::debug!(
                        breaker = %self.name,
                        failure_count = state.failure_count,
                        max_failures = self.settings.max_failures,
                        "Call failed"
                    );
                    None
                }
            }
            CircuitState::HalfOpen => {
                state.failure_count = state.failure_count.saturating_add(1);
                state.trip(now, self.settings.reset_timeout);
                Some(Transition {
                    from: CircuitState::HalfOpen,
                    to: CircuitState::Open,
                    failure_count: state.failure_count,
                    reason: TransitionReason::TrialFailed,
                })
            }
            CircuitState::Open => {
                tracing::debug!(breaker = %self.name, "Ignoring late failure while open");
                None
            }
        }
    }

    /// Run `work` under breaker protection. Every error of the work counts as a
    /// failure.
    pub async fn call<F, T, E>(&self, work: F) -> Result<T, CallError<E>>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.call_classified(work, |_| true).await
    }

    /// Run `work` under breaker protection. Errors for which `is_failure` returns
    /// false are passed to the caller but recorded as a success, since the
    /// dependency did answer.
    pub async fn call_classified<F, T, E, C>(&self, work: F, is_failure: C) -> Result<T, CallError<E>>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
        C: FnOnce(&E) -> bool,
    {
        let _serial = match &self.serial_gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };

        let Some(admission) = self.admit() else {
            tracing::debug!(breaker = %self.name, "Call rejected, circuit open");
            metrics::record_breaker_call(&self.name, "rejected");
            return Err(CallError::Open);
        };

        let permit = Permit {
            breaker: self,
            admission,
            settled: false,
        };
        let result = self.executor.execute(work).await;

        let (failed, outcome) = match &result {
            Ok(_) => (false, "success"),
            Err(CallError::Inner(e)) => {
                if is_failure(e) {
                    (true, "failure")
                } else {
                    (false, "answered_error")
                }
            }
            Err(CallError::Timeout(_)) => (true, "timeout"),
            Err(CallError::Aborted(_)) => (true, "aborted"),
            Err(CallError::Open) => (true, "rejected"),
        };

        if failed {
            permit.failure();
        } else {
            permit.success();
        }
        metrics::record_breaker_call(&self.name, outcome);

        result
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, transition: Option<Transition>) {
        if let Some(t) = transition {
            let event = TransitionEvent {
                breaker: self.name.clone(),
                from: t.from,
                to: t.to,
                failure_count: t.failure_count,
                reason: t.reason,
                timestamp: SystemTime::now(),
            };
            self.observer.on_transition(&event);
        }
    }
}

/// Admission that must be settled exactly once. Dropping it unsettled means
/// the caller's future was cancelled mid-call: no outcome is recorded, and a
/// Half-Open trial token is handed back.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    admission: Admission,
    settled: bool,
}

impl Permit<'_> {
    fn success(mut self) {
        self.settled = true;
        self.breaker.settle(self.admission, Outcome::Success);
    }

    fn failure(mut self) {
        self.settled = true;
        self.breaker.settle(self.admission, Outcome::Failure);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!(breaker = %self.breaker.name, "Call dropped before completion");
            self.breaker.settle(self.admission, Outcome::Cancelled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct Recorder(StdMutex<Vec<TransitionEvent>>);

    impl TransitionObserver for Recorder {
        fn on_transition(&self, event: &TransitionEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn breaker(max_failures: u32) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            BreakerSettings::new(max_failures, Duration::from_secs(10), Duration::from_secs(5)),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let err = CircuitBreaker::new("x", BreakerSettings::new(0, Duration::from_secs(1), Duration::from_secs(1)));
        assert_eq!(err.unwrap_err(), InvalidSettings::ZeroMaxFailures);

        let err = CircuitBreaker::new("x", BreakerSettings::new(1, Duration::ZERO, Duration::from_secs(1)));
        assert_eq!(err.unwrap_err(), InvalidSettings::ZeroResetTimeout);

        let err = CircuitBreaker::new("x", BreakerSettings::new(1, Duration::from_secs(1), Duration::ZERO));
        assert_eq!(err.unwrap_err(), InvalidSettings::ZeroCallTimeout);
    }

    #[test]
    fn test_starts_closed() {
        let cb = breaker(3);
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.attempt_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_at_threshold() {
        let cb = breaker(3);
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 2);

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.attempt_allowed());
        assert_eq!(cb.snapshot().next_attempt_in, Some(Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_until_reset_timeout() {
        let cb = breaker(1);
        cb.record_failure();

        tokio::time::advance(Duration::from_millis(9_999)).await;
        assert!(!cb.attempt_allowed());
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cb.attempt_allowed());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_success_closes() {
        let cb = breaker(2);
        cb.record_failure();
        cb.record_failure();
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(cb.attempt_allowed());

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
        assert_eq!(cb.snapshot().next_attempt_in, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens_with_fresh_deadline() {
        let cb = breaker(1);
        cb.record_failure();
        tokio::time::advance(Duration::from_secs(15)).await;
        assert!(cb.attempt_allowed());

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.snapshot().next_attempt_in, Some(Duration::from_secs(10)));
        assert!(!cb.attempt_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_admits_one_trial() {
        let cb = breaker(1);
        cb.record_failure();
        tokio::time::advance(Duration::from_secs(10)).await;

        assert!(cb.attempt_allowed());
        assert!(!cb.attempt_allowed());
        assert!(cb.snapshot().trial_in_flight);
    }

    #[tokio::test(start_paused = true)]
    async fn test_best_effort_admits_every_caller() {
        let cb = CircuitBreaker::new(
            "test",
            BreakerSettings::new(1, Duration::from_secs(10), Duration::from_secs(5))
                .with_half_open_admission(HalfOpenAdmission::BestEffort),
        )
        .unwrap();
        cb.record_failure();
        tokio::time::advance(Duration::from_secs(10)).await;

        assert!(cb.attempt_allowed());
        assert!(cb.attempt_allowed());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_success_while_closed_keeps_count() {
        let cb = breaker(3);
        cb.record_failure();
        cb.record_success();
        assert_eq!(cb.failure_count(), 1);
    }

    #[test]
    fn test_late_outcomes_while_open_are_ignored() {
        let cb = breaker(1);
        cb.record_failure();
        let before = cb.snapshot();

        cb.record_success();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.failure_count(), before.failure_count);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transitions_are_reported() {
        let recorder = Arc::new(Recorder::default());
        let cb = breaker(2).with_observer(recorder.clone());

        cb.record_failure();
        cb.record_failure();
        tokio::time::advance(Duration::from_secs(10)).await;
        cb.attempt_allowed();
        cb.record_success();

        let events = recorder.0.lock().unwrap();
        let seen: Vec<_> = events.iter().map(|e| (e.from, e.to, e.reason)).collect();
        assert_eq!(
            seen,
            vec![
                (CircuitState::Closed, CircuitState::Open, TransitionReason::FailureThreshold),
                (CircuitState::Open, CircuitState::HalfOpen, TransitionReason::ResetTimeoutElapsed),
                (CircuitState::HalfOpen, CircuitState::Closed, TransitionReason::TrialSucceeded),
            ]
        );
        assert_eq!(events[0].failure_count, 2);
        assert_eq!(events[0].breaker, "test");
        assert_eq!(events[2].failure_count, 0);
    }

    #[tokio::test]
    async fn test_answered_errors_do_not_count() {
        let cb = breaker(1);
        let res: Result<(), CallError<u16>> = cb
            .call_classified(async { Err(404u16) }, |status| *status >= 500)
            .await;
        assert!(matches!(res, Err(CallError::Inner(404))));
        assert_eq!(cb.state(), CircuitState::Closed);

        let res: Result<(), CallError<u16>> = cb
            .call_classified(async { Err(503u16) }, |status| *status >= 500)
            .await;
        assert!(matches!(res, Err(CallError::Inner(503))));
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_trial_returns_token() {
        let cb = Arc::new(breaker(1));
        cb.record_failure();
        tokio::time::advance(Duration::from_secs(10)).await;

        let call = {
            let cb = cb.clone();
            tokio::spawn(async move {
                let _: Result<(), CallError<String>> = cb.call(std::future::pending()).await;
            })
        };
        tokio::task::yield_now().await;
        assert!(cb.snapshot().trial_in_flight);

        call.abort();
        let _ = call.await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(!cb.snapshot().trial_in_flight);
        assert!(cb.attempt_allowed(), "next caller gets the trial");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_calls_while_closed_are_not_failures() {
        let cb = Arc::new(breaker(3));

        for _ in 0..3 {
            let call = {
                let cb = cb.clone();
                tokio::spawn(async move {
                    let _: Result<(), CallError<String>> = cb
                        .call(async {
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            Ok(())
                        })
                        .await;
                })
            };
            tokio::time::sleep(Duration::from_millis(10)).await;
            call.abort();
            let _ = call.await;
        }

        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcome_from_before_trip_does_not_settle_trial() {
        // Call timeout longer than the reset timeout, so a pre-trip call can
        // still be running once the breaker is Half-Open.
        let cb = Arc::new(
            CircuitBreaker::new(
                "test",
                BreakerSettings::new(1, Duration::from_secs(1), Duration::from_secs(5)),
            )
            .unwrap(),
        );
        let (release, gate) = tokio::sync::oneshot::channel::<()>();

        let early = {
            let cb = cb.clone();
            tokio::spawn(async move {
                cb.call(async move { gate.await.map_err(|e| e.to_string()) }).await
            })
        };
        tokio::task::yield_now().await;

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cb.attempt_allowed());
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        release.send(()).unwrap();
        assert!(early.await.unwrap().is_ok());

        assert_eq!(cb.state(), CircuitState::HalfOpen, "stale success must not close the breaker");
        assert!(cb.snapshot().trial_in_flight);

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }
}
