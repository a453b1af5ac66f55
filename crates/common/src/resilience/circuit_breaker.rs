//! Three-state circuit breaker shared by every caller of one dependency.
//!
//! State lives behind a [`tokio::sync::Mutex`] that is held only to decide
//! whether a call may proceed and, afterwards, to record its outcome. The
//! wrapped operation itself runs without the lock and races the caller's
//! [`Context`]; an abandoned call records no outcome. An atomic mirror of
//! the state keeps [`CircuitBreaker::state`] lock-free for probes and
//! metrics.
//!
//! Transitions:
//! - Closed -> Open once `failure_threshold` consecutive failures are seen
//! - Open -> HalfOpen on the first call after `reset_timeout` has elapsed
//!   since the last failure
//! - HalfOpen -> Closed after `half_open_success_threshold` successes
//! - HalfOpen -> Open on any failure

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use super::context::{CancelReason, Context};
use super::metrics as names;
use crate::error::{CommonError, CommonResult, NetworkSignal};
use crate::observability::{MetricsCollector, NoOpMetricsCollector};

//==============================================================================
// Time Abstraction for Testability
//==============================================================================

/// Monotonic time source, swappable in tests.
pub trait Clock: Send + Sync + 'static {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Real monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Manually advanced clock for deterministic timing tests.
///
/// Clones share the same elapsed time.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<StdMutex<Duration>>,
}

impl MockClock {
    /// Clock frozen at the moment of creation.
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(StdMutex::new(Duration::ZERO)) }
    }

    /// Move time forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner) += duration;
    }

    /// Total time advanced so far.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }
}

//==============================================================================
// State and configuration
//==============================================================================

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls are rejected without reaching the dependency.
    Open,
    /// Trial calls are let through to probe recovery.
    HalfOpen,
}

impl CircuitState {
    /// Gauge encoding: 0 closed, 1 open, 2 half-open.
    pub fn as_gauge(self) -> f64 {
        f64::from(self.as_u8())
    }

    /// Metric label value.
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Closed => 0,
            Self::Open => 1,
            Self::HalfOpen => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Open,
            2 => Self::HalfOpen,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Breaker tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit while closed.
    pub failure_threshold: u32,
    /// Quiet period after the last failure before a trial call is allowed.
    pub reset_timeout: Duration,
    /// Half-open successes needed to close the circuit again.
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(60),
            half_open_success_threshold: 3,
        }
    }
}

impl CircuitBreakerConfig {
    /// Builder starting from the defaults.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::default()
    }

    /// Reject zero thresholds.
    pub fn validate(&self) -> CommonResult<()> {
        if self.failure_threshold == 0 {
            return Err(CommonError::config_field(
                "circuit_breaker.failure_threshold",
                "must be greater than 0",
            ));
        }
        if self.half_open_success_threshold == 0 {
            return Err(CommonError::config_field(
                "circuit_breaker.half_open_success_threshold",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Builder for [`CircuitBreakerConfig`].
#[derive(Debug, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    /// Consecutive failures that open the circuit.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    /// Cooldown before a half-open trial.
    pub fn reset_timeout(mut self, timeout: Duration) -> Self {
        self.config.reset_timeout = timeout;
        self
    }

    /// Trial successes needed to close again.
    pub fn half_open_success_threshold(mut self, threshold: u32) -> Self {
        self.config.half_open_success_threshold = threshold;
        self
    }

    /// Validate and return the config.
    pub fn build(self) -> CommonResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

//==============================================================================
// Errors
//==============================================================================

/// Failure modes of [`CircuitBreaker::execute`].
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// Rejected without calling the operation.
    #[error("circuit breaker '{breaker}' is open")]
    Open { breaker: String },

    /// The context ended while waiting for admission or while the
    /// operation was in flight.
    #[error("circuit breaker '{breaker}': {reason}")]
    Cancelled {
        breaker: String,
        #[source]
        reason: CancelReason,
    },

    /// The operation ran and failed.
    #[error(transparent)]
    Operation(E),
}

impl<E> BreakerError<E> {
    /// Whether the call was rejected by an open circuit.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// The operation's own error, if it ran.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }
}

impl<E: NetworkSignal> NetworkSignal for BreakerError<E> {
    fn timed_out(&self) -> Option<bool> {
        match self {
            Self::Operation(e) => e.timed_out(),
            _ => Some(false),
        }
    }

    fn temporary(&self) -> Option<bool> {
        match self {
            Self::Operation(e) => e.temporary(),
            _ => None,
        }
    }
}

//==============================================================================
// Breaker
//==============================================================================

/// Point-in-time view of the breaker's counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub half_open_successes: u32,
    pub last_failure: Option<Instant>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    half_open_successes: u32,
}

/// Circuit breaker guarding one named dependency.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
    state_mirror: AtomicU8,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn MetricsCollector>,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker {
    /// Create a closed breaker using the system clock.
    pub fn new<S: Into<String>>(
        name: S,
        config: CircuitBreakerConfig,
        metrics: Arc<dyn MetricsCollector>,
    ) -> CommonResult<Self> {
        config.validate()?;
        let breaker = Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                last_failure: None,
                half_open_successes: 0,
            }),
            state_mirror: AtomicU8::new(CircuitState::Closed.as_u8()),
            clock: Arc::new(SystemClock),
            metrics,
        };
        breaker.publish_state(CircuitState::Closed);
        Ok(breaker)
    }

    /// Breaker with default configuration and no metrics.
    pub fn with_defaults<S: Into<String>>(name: S) -> CommonResult<Self> {
        Self::new(name, CircuitBreakerConfig::default(), Arc::new(NoOpMetricsCollector))
    }

    /// Replace the time source (tests use [`MockClock`]).
    #[must_use]
    pub fn with_clock<C: Clock>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Dependency label used in logs and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state without taking the lock.
    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state_mirror.load(Ordering::Acquire))
    }

    /// Counters under the lock.
    pub async fn snapshot(&self) -> BreakerSnapshot {
        let guard = self.inner.lock().await;
        BreakerSnapshot {
            state: guard.state,
            consecutive_failures: guard.consecutive_failures,
            half_open_successes: guard.half_open_successes,
            last_failure: guard.last_failure,
        }
    }

    /// Force the breaker closed and clear its counters.
    pub async fn reset(&self) {
        let mut guard = self.inner.lock().await;
        guard.consecutive_failures = 0;
        guard.half_open_successes = 0;
        guard.last_failure = None;
        if guard.state != CircuitState::Closed {
            self.transition(&mut guard, CircuitState::Closed);
        }
        info!(breaker = %self.name, "circuit breaker manually reset");
    }

    /// Run `op` if the breaker admits it and record the outcome.
    ///
    /// Lock acquisition and the call itself race `ctx`. If `ctx` ends first
    /// the operation's future is dropped and nothing is recorded. Recording
    /// the outcome of a finished call does not race, so it is always
    /// accounted for.
    #[instrument(skip_all, fields(breaker = %self.name))]
    pub async fn execute<T, E, F, Fut>(&self, ctx: &Context, op: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.admit::<E>(ctx).await?;

        let result = tokio::select! {
            biased;
            result = op() => result,
            reason = ctx.done() => {
                debug!(breaker = %self.name, %reason, "cancelled while operation in flight");
                return Err(BreakerError::Cancelled { breaker: self.name.clone(), reason });
            }
        };

        let mut guard = self.inner.lock().await;
        match &result {
            Ok(_) => self.on_success(&mut guard),
            Err(_) => self.on_failure(&mut guard),
        }
        drop(guard);

        result.map_err(BreakerError::Operation)
    }

    async fn admit<E>(&self, ctx: &Context) -> Result<(), BreakerError<E>> {
        let mut guard = tokio::select! {
            biased;
            guard = self.inner.lock() => guard,
            reason = ctx.done() => {
                debug!(breaker = %self.name, %reason, "cancelled waiting for breaker lock");
                return Err(BreakerError::Cancelled { breaker: self.name.clone(), reason });
            }
        };

        if guard.state == CircuitState::Open {
            let now = self.clock.now();
            let cooled_down = guard
                .last_failure
                .map_or(true, |at| now.saturating_duration_since(at) > self.config.reset_timeout);
            if !cooled_down {
                debug!(breaker = %self.name, "circuit breaker open, rejecting call");
                self.metrics.increment_counter(
                    names::CIRCUIT_BREAKER_REJECTIONS_TOTAL,
                    &[("breaker", self.name.as_str())],
                );
                return Err(BreakerError::Open { breaker: self.name.clone() });
            }
            self.transition(&mut guard, CircuitState::HalfOpen);
        }

        Ok(())
    }

    fn on_success(&self, guard: &mut MutexGuard<'_, BreakerState>) {
        match guard.state {
            CircuitState::Closed => guard.consecutive_failures = 0,
            CircuitState::HalfOpen => {
                guard.half_open_successes += 1;
                if guard.half_open_successes >= self.config.half_open_success_threshold {
                    self.transition(guard, CircuitState::Closed);
                }
            }
            // admitted before another caller opened the circuit
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, guard: &mut MutexGuard<'_, BreakerState>) {
        guard.consecutive_failures = guard.consecutive_failures.saturating_add(1);
        guard.last_failure = Some(self.clock.now());

        match guard.state {
            CircuitState::Closed if guard.consecutive_failures >= self.config.failure_threshold => {
                self.transition(guard, CircuitState::Open);
            }
            CircuitState::HalfOpen => self.transition(guard, CircuitState::Open),
            _ => {}
        }
    }

    fn transition(&self, guard: &mut MutexGuard<'_, BreakerState>, to: CircuitState) {
        let from = guard.state;
        guard.state = to;
        match to {
            CircuitState::HalfOpen => guard.half_open_successes = 0,
            CircuitState::Closed => {
                guard.consecutive_failures = 0;
                guard.half_open_successes = 0;
            }
            CircuitState::Open => {}
        }

        if to == CircuitState::Open {
            warn!(
                breaker = %self.name,
                from = %from,
                to = %to,
                consecutive_failures = guard.consecutive_failures,
                "circuit breaker opened"
            );
        } else {
            info!(breaker = %self.name, from = %from, to = %to, "circuit breaker state change");
        }

        self.metrics.increment_counter(
            names::CIRCUIT_BREAKER_TRANSITIONS_TOTAL,
            &[("breaker", self.name.as_str()), ("from", from.as_label()), ("to", to.as_label())],
        );
        self.publish_state(to);
    }

    fn publish_state(&self, state: CircuitState) {
        self.state_mirror.store(state.as_u8(), Ordering::Release);
        self.metrics.record_gauge(
            names::CIRCUIT_BREAKER_STATE,
            state.as_gauge(),
            &[("breaker", self.name.as_str())],
        );
    }
}
