//! Retry, bulkhead and circuit breaker around remote calls.
//!
//! The three policies compose outermost first as
//! circuit breaker → bulkhead → retry, so one logical call takes one breaker
//! slot and one bulkhead permit no matter how many attempts the retry makes.
//! A fallback function runs last over whatever error escapes.

use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::{Semaphore, SemaphorePermit};

/// Why a call never reached the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    CircuitOpen,
    BulkheadFull,
}

impl Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CircuitOpen => f.write_str("circuit open"),
            Self::BulkheadFull => f.write_str("bulkhead full"),
        }
    }
}

/// Errors the policies know how to classify.
pub trait PolicyError: Display + Sized {
    /// Worth retrying, and counted as a failure by the breaker.
    fn is_transient(&self) -> bool;

    fn rejected(rejection: Rejection) -> Self;
}

// ── Retry ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub wait: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            wait: Duration::from_millis(500),
        }
    }
}

/// Fixed-wait retry of transient failures.
#[derive(Debug, Clone)]
pub struct Retry {
    config: RetryConfig,
}

impl Retry {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub async fn call<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        E: PolicyError,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        error = %e,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(self.config.wait).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

// ── Bulkhead ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct BulkheadConfig {
    pub max_concurrent: usize,
    /// How long to wait for a permit. Zero rejects immediately.
    pub max_wait: Duration,
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            max_wait: Duration::ZERO,
        }
    }
}

/// Caps concurrent calls with a semaphore.
#[derive(Debug)]
pub struct Bulkhead {
    permits: Semaphore,
    max_wait: Duration,
}

impl Bulkhead {
    pub fn new(config: BulkheadConfig) -> Self {
        Self {
            permits: Semaphore::new(config.max_concurrent.max(1)),
            max_wait: config.max_wait,
        }
    }

    /// A permit, or `None` if none freed up within `max_wait`.
    pub async fn acquire(&self) -> Option<SemaphorePermit<'_>> {
        if self.max_wait.is_zero() {
            return self.permits.try_acquire().ok();
        }
        match tokio::time::timeout(self.max_wait, self.permits.acquire()).await {
            Ok(Ok(permit)) => Some(permit),
            _ => None,
        }
    }
}

// ── Circuit breaker ───────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    /// Failure percentage (0-100) at which the circuit opens.
    pub failure_rate_threshold: u8,
    /// Number of most recent outcomes considered.
    pub window_size: usize,
    /// Outcomes needed in the window before the rate is evaluated.
    pub min_calls: usize,
    pub open_duration: Duration,
    /// Trial calls let through while half-open.
    pub half_open_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50,
            window_size: 10,
            min_calls: 5,
            open_duration: Duration::from_secs(10),
            half_open_calls: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitStatus {
    Closed,
    Open,
    HalfOpen,
}

/// How a permitted call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    /// Neither success nor failure: the call never ran (bulkhead rejection),
    /// was cancelled, or ended in a non-transient error. Frees a half-open slot.
    Ignored,
}

#[derive(Debug)]
struct CircuitState {
    status: CircuitStatus,
    /// `true` entries are failures.
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    half_open_permitted: u32,
    half_open_successes: u32,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: &'static str,
    config: CircuitBreakerConfig,
    state: Mutex<CircuitState>,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            name,
            config,
            state: Mutex::new(CircuitState {
                status: CircuitStatus::Closed,
                window: VecDeque::with_capacity(config.window_size),
                opened_at: None,
                half_open_permitted: 0,
                half_open_successes: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CircuitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> CircuitStatus {
        self.lock().status
    }

    /// Whether a call may proceed. Moves Open → HalfOpen once the open
    /// duration has elapsed.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        match state.status {
            CircuitStatus::Closed => true,
            CircuitStatus::Open => {
                let cooled = state
                    .opened_at
                    .map_or(true, |at| at.elapsed() >= self.config.open_duration);
                if !cooled {
                    return false;
                }
                tracing::warn!(circuit = self.name, "circuit half-open");
                state.status = CircuitStatus::HalfOpen;
                state.half_open_permitted = 1;
                state.half_open_successes = 0;
                true
            }
            CircuitStatus::HalfOpen => {
                if state.half_open_permitted < self.config.half_open_calls.max(1) {
                    state.half_open_permitted += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Like [`try_acquire`](Self::try_acquire), but the returned admission
    /// records [`Outcome::Ignored`] when dropped without being finished.
    pub fn admit(&self) -> Option<Admission<'_>> {
        self.try_acquire().then(|| Admission {
            breaker: self,
            outcome: None,
        })
    }

    pub fn record(&self, outcome: Outcome) {
        let mut state = self.lock();
        match (state.status, outcome) {
            (CircuitStatus::Closed, Outcome::Ignored) => {}
            (CircuitStatus::Closed, _) => {
                if state.window.len() >= self.config.window_size.max(1) {
                    state.window.pop_front();
                }
                state.window.push_back(outcome == Outcome::Failure);
                if self.rate_exceeded(&state.window) {
                    self.open(&mut state);
                }
            }
            (CircuitStatus::HalfOpen, Outcome::Success) => {
                state.half_open_successes += 1;
                if state.half_open_successes >= self.config.half_open_calls.max(1) {
                    tracing::info!(circuit = self.name, "circuit closed");
                    state.status = CircuitStatus::Closed;
                    state.window.clear();
                    state.opened_at = None;
                }
            }
            (CircuitStatus::HalfOpen, Outcome::Failure) => self.open(&mut state),
            (CircuitStatus::HalfOpen, Outcome::Ignored) => {
                state.half_open_permitted = state.half_open_permitted.saturating_sub(1);
            }
            (CircuitStatus::Open, _) => {}
        }
    }

    fn rate_exceeded(&self, window: &VecDeque<bool>) -> bool {
        let calls = window.len();
        if calls == 0 || calls < self.config.min_calls.min(self.config.window_size.max(1)) {
            return false;
        }
        let failures = window.iter().filter(|failed| **failed).count();
        failures * 100 >= usize::from(self.config.failure_rate_threshold) * calls
    }

    fn open(&self, state: &mut CircuitState) {
        tracing::warn!(
            circuit = self.name,
            open_for_ms = self.config.open_duration.as_millis() as u64,
            "circuit opened"
        );
        state.status = CircuitStatus::Open;
        state.opened_at = Some(Instant::now());
        state.window.clear();
        state.half_open_permitted = 0;
        state.half_open_successes = 0;
    }
}

/// One call's hold on the breaker.
#[derive(Debug)]
pub struct Admission<'a> {
    breaker: &'a CircuitBreaker,
    outcome: Option<Outcome>,
}

impl Admission<'_> {
    pub fn finish(mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        self.breaker.record(self.outcome.unwrap_or(Outcome::Ignored));
    }
}

// ── Composition ───────────────────────────────────────────────

/// Circuit breaker → bulkhead → retry, then the fallback over any error.
pub struct ResiliencePolicy<E> {
    breaker: CircuitBreaker,
    bulkhead: Bulkhead,
    retry: Retry,
    fallback: fn(E) -> E,
}

impl<E: PolicyError> ResiliencePolicy<E> {
    pub fn new(
        name: &'static str,
        breaker: CircuitBreakerConfig,
        bulkhead: BulkheadConfig,
        retry: RetryConfig,
        fallback: fn(E) -> E,
    ) -> Self {
        Self {
            breaker: CircuitBreaker::new(name, breaker),
            bulkhead: Bulkhead::new(bulkhead),
            retry: Retry::new(retry),
            fallback,
        }
    }

    pub fn circuit_status(&self) -> CircuitStatus {
        self.breaker.status()
    }

    pub async fn call<T, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        // Records `Ignored` if dropped unfinished: bulkhead rejection or a
        // cancelled caller.
        let Some(admission) = self.breaker.admit() else {
            tracing::warn!(circuit = self.breaker.name, "call rejected, circuit open");
            return Err((self.fallback)(E::rejected(Rejection::CircuitOpen)));
        };

        let Some(permit) = self.bulkhead.acquire().await else {
            tracing::warn!(circuit = self.breaker.name, "call rejected, bulkhead full");
            return Err((self.fallback)(E::rejected(Rejection::BulkheadFull)));
        };

        let result = self.retry.call(op).await;
        drop(permit);

        admission.finish(match &result {
            Ok(_) => Outcome::Success,
            Err(e) if e.is_transient() => Outcome::Failure,
            Err(_) => Outcome::Ignored,
        });
        result.map_err(self.fallback)
    }
}
