//! Operation-level retry with exponential backoff.
//!
//! [`RetryExecutor::run`] drives one logical operation through up to
//! `max_attempts` attempts. Between attempts it sleeps for the policy's
//! backoff while racing the caller's [`Context`], so a cancelled or expired
//! scope ends the run promptly.

use std::fmt::{self, Display};
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use super::context::{CancelReason, Context};
use super::metrics::{self as names, outcome};
use super::policy::RetryPolicy;
use crate::error::NetworkSignal;
use crate::observability::{MetricsCollector, NoOpMetricsCollector};

/// How a retried operation ultimately failed.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The last allowed attempt failed.
    #[error("{operation}: failed after {attempts} attempts: {source}")]
    Exhausted { operation: String, attempts: u32, source: E },

    /// The error was classified as permanent; remaining attempts were skipped.
    #[error("{operation}: non-retryable error on attempt {attempts}: {source}")]
    NonRetryable { operation: String, attempts: u32, source: E },

    /// The context ended while waiting to retry.
    #[error("{operation}: cancelled during retry backoff after {attempts} attempts: {reason} (last error: {last_error})")]
    Cancelled {
        operation: String,
        attempts: u32,
        #[source]
        reason: CancelReason,
        last_error: E,
    },
}

impl<E> RetryError<E> {
    /// Name of the operation that failed.
    pub fn operation(&self) -> &str {
        match self {
            Self::Exhausted { operation, .. }
            | Self::NonRetryable { operation, .. }
            | Self::Cancelled { operation, .. } => operation,
        }
    }

    /// Attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. }
            | Self::NonRetryable { attempts, .. }
            | Self::Cancelled { attempts, .. } => *attempts,
        }
    }

    /// The error returned by the last attempt.
    pub fn last_error(&self) -> &E {
        match self {
            Self::Exhausted { source, .. } | Self::NonRetryable { source, .. } => source,
            Self::Cancelled { last_error, .. } => last_error,
        }
    }

    /// Whether the context ended the run.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl<E: NetworkSignal> NetworkSignal for RetryError<E> {
    fn timed_out(&self) -> Option<bool> {
        match self {
            Self::Cancelled { .. } => Some(false),
            other => other.last_error().timed_out(),
        }
    }

    fn temporary(&self) -> Option<bool> {
        self.last_error().temporary()
    }
}

/// Runs operations under a [`RetryPolicy`].
#[derive(Clone)]
pub struct RetryExecutor {
    default_policy: RetryPolicy,
    metrics: Arc<dyn MetricsCollector>,
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("default_policy", &self.default_policy)
            .finish_non_exhaustive()
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::conservative(), Arc::new(NoOpMetricsCollector))
    }
}

impl RetryExecutor {
    /// Executor using `default_policy` when `run` gets none.
    pub fn new(default_policy: RetryPolicy, metrics: Arc<dyn MetricsCollector>) -> Self {
        Self { default_policy, metrics }
    }

    /// Policy used when `run` is called without one.
    pub fn default_policy(&self) -> &RetryPolicy {
        &self.default_policy
    }

    /// Run `op` until it succeeds, fails permanently, runs out of attempts,
    /// or `ctx` ends during a backoff wait.
    ///
    /// Order of checks after a failed attempt: last attempt (`Exhausted`),
    /// then classification (`NonRetryable`), then the cancellable backoff.
    #[instrument(name = "retry", skip_all, fields(operation = operation))]
    pub async fn run<T, E, F, Fut>(
        &self,
        ctx: &Context,
        operation: &str,
        policy: Option<&RetryPolicy>,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: NetworkSignal + Display,
    {
        let policy = policy.unwrap_or(&self.default_policy);
        let max_attempts = policy.max_attempts().max(1);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(operation, attempt, max_attempts, "attempting operation");

            let err = match op().await {
                Ok(value) => {
                    self.record_attempt(operation, outcome::SUCCESS);
                    self.record_run(operation, outcome::SUCCESS);
                    if attempt > 1 {
                        info!(operation, attempts = attempt, "operation succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };
            self.record_attempt(operation, outcome::FAILURE);

            if attempt >= max_attempts {
                error!(operation, attempts = attempt, error = %err, "retry attempts exhausted");
                self.record_run(operation, outcome::EXHAUSTED);
                return Err(RetryError::Exhausted {
                    operation: operation.to_owned(),
                    attempts: attempt,
                    source: err,
                });
            }

            if !policy.is_retryable(&err) {
                debug!(operation, attempt, error = %err, "error is not retryable");
                self.record_run(operation, outcome::NON_RETRYABLE);
                return Err(RetryError::NonRetryable {
                    operation: operation.to_owned(),
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = policy.calculate_backoff(attempt - 1);
            warn!(
                operation,
                attempt,
                max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "operation failed, backing off"
            );
            self.metrics.record_duration(
                names::RETRY_BACKOFF_SECONDS,
                delay,
                &[("operation", operation)],
            );

            tokio::select! {
                biased;
                reason = ctx.done() => {
                    warn!(operation, attempts = attempt, %reason, "cancelled during retry backoff");
                    self.record_run(operation, outcome::CANCELLED);
                    return Err(RetryError::Cancelled {
                        operation: operation.to_owned(),
                        attempts: attempt,
                        reason,
                        last_error: err,
                    });
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn record_attempt(&self, operation: &str, result: &str) {
        self.metrics.increment_counter(
            names::RETRY_ATTEMPTS_TOTAL,
            &[("operation", operation), ("outcome", result)],
        );
    }

    fn record_run(&self, operation: &str, result: &str) {
        self.metrics.increment_counter(
            names::RETRY_OPERATIONS_TOTAL,
            &[("operation", operation), ("outcome", result)],
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::testing::{RecordingMetricsCollector, TestError};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::builder()
            .max_attempts(max_attempts)
            .initial_backoff(Duration::from_millis(1))
            .max_backoff(Duration::from_millis(5))
            .jitter_fraction(0.0)
            .build()
            .expect("valid policy")
    }

    fn executor() -> (RetryExecutor, Arc<RecordingMetricsCollector>) {
        let metrics = Arc::new(RecordingMetricsCollector::new());
        (RetryExecutor::new(fast_policy(3), metrics.clone()), metrics)
    }

    /// Validates a first-try success.
    ///
    /// Assertions:
    /// - The operation runs exactly once.
    /// - One success attempt and one success run are counted.
    #[tokio::test]
    async fn test_success_runs_once() {
        let (retry, metrics) = executor();
        let calls = AtomicU32::new(0);

        let result: Result<&str, RetryError<TestError>> = retry
            .run(&Context::background(), "get_domain", None, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok("ok") }
            })
            .await;

        assert_eq!(result.expect("success"), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let labels = [("operation", "get_domain"), ("outcome", "success")];
        assert!((metrics.counter_total(names::RETRY_ATTEMPTS_TOTAL, &labels) - 1.0).abs() < 1e-9);
        assert!((metrics.counter_total(names::RETRY_OPERATIONS_TOTAL, &labels) - 1.0).abs() < 1e-9);
    }

    /// Validates exhaustion against an always-failing retryable operation.
    ///
    /// Assertions:
    /// - Exactly 3 attempts run.
    /// - The message mentions "3 attempts" and carries the last cause.
    #[tokio::test]
    async fn test_always_failing_exhausts_attempts() {
        let (retry, metrics) = executor();
        let calls = AtomicU32::new(0);

        let err = retry
            .run(&Context::background(), "create_route", None, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(TestError::transient()) }
            })
            .await
            .expect_err("should exhaust");

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(err, RetryError::Exhausted { attempts: 3, .. }));
        assert!(err.to_string().contains("3 attempts"), "{err}");
        assert!(err.to_string().contains("503 service unavailable"), "{err}");
        assert_eq!(err.operation(), "create_route");
        assert_eq!(metrics.histograms(names::RETRY_BACKOFF_SECONDS).len(), 2);
        assert!(
            (metrics.counter_total(names::RETRY_OPERATIONS_TOTAL, &[("outcome", "exhausted")])
                - 1.0)
                .abs()
                < 1e-9
        );
    }

    #[tokio::test]
    async fn test_fails_twice_then_succeeds() {
        let (retry, _) = executor();
        let calls = AtomicU32::new(0);

        let result = retry
            .run(&Context::background(), "update_list", None, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(TestError::new("connection reset by peer"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.expect("third attempt succeeds"), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    /// Validates that permanent errors stop the loop at once.
    ///
    /// Assertions:
    /// - One attempt regardless of a generous `max_attempts`.
    #[tokio::test]
    async fn test_non_retryable_stops_immediately() {
        let (retry, metrics) = executor();
        let calls = AtomicU32::new(0);
        let policy = fast_policy(10);

        let err = retry
            .run(&Context::background(), "delete_webhook", Some(&policy), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(TestError::permanent()) }
            })
            .await
            .expect_err("permanent failure");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, RetryError::NonRetryable { attempts: 1, .. }));
        assert_eq!(err.last_error(), &TestError::permanent());
        assert!(metrics.histograms(names::RETRY_BACKOFF_SECONDS).is_empty());
    }

    #[tokio::test]
    async fn test_network_timeout_is_retried() {
        let (retry, _) = executor();
        let calls = AtomicU32::new(0);

        let err = retry
            .run(&Context::background(), "get_template", None, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(TestError::network_timeout()) }
            })
            .await
            .expect_err("exhausts");

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.timed_out(), Some(true));
    }

    /// Validates that an already-cancelled context ends the run without
    /// hanging.
    ///
    /// Assertions:
    /// - The first attempt runs, then the backoff wait observes cancellation.
    #[tokio::test]
    async fn test_cancelled_context_returns_promptly() {
        let metrics = Arc::new(RecordingMetricsCollector::new());
        let slow = RetryPolicy::builder()
            .max_attempts(5)
            .initial_backoff(Duration::from_secs(3600))
            .max_backoff(Duration::from_secs(3600))
            .jitter_fraction(0.0)
            .build()
            .expect("valid policy");
        let retry = RetryExecutor::new(slow, metrics.clone());
        let ctx = Context::background();
        ctx.cancel();
        let calls = AtomicU32::new(0);

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            retry.run(&ctx, "get_bounce", None, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(TestError::transient()) }
            }),
        )
        .await
        .expect("must not hang")
        .expect_err("cancelled");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(err.is_cancelled());
        assert!(err.to_string().contains("cancelled during retry backoff"), "{err}");
        assert!(err.to_string().contains("context canceled"), "{err}");
        assert!(
            (metrics.counter_total(names::RETRY_OPERATIONS_TOTAL, &[("outcome", "cancelled")])
                - 1.0)
                .abs()
                < 1e-9
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_during_backoff() {
        let retry = RetryExecutor::new(
            RetryPolicy::builder()
                .max_attempts(4)
                .initial_backoff(Duration::from_secs(10))
                .max_backoff(Duration::from_secs(10))
                .jitter_fraction(0.0)
                .build()
                .expect("valid policy"),
            Arc::new(NoOpMetricsCollector),
        );
        let ctx = Context::background().with_timeout(Duration::from_secs(15));
        let calls = AtomicU32::new(0);

        let err = retry
            .run(&ctx, "get_complaint", None, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(TestError::transient()) }
            })
            .await
            .expect_err("deadline");

        // attempts at t=0 and t=10s; the second backoff crosses the deadline
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            err,
            RetryError::Cancelled { reason: CancelReason::DeadlineExceeded, attempts: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_single_attempt_policy_reports_exhausted() {
        let (retry, _) = executor();
        let policy = fast_policy(1);

        let err = retry
            .run(&Context::background(), "get_unsubscribe", Some(&policy), || async {
                Err::<(), _>(TestError::permanent())
            })
            .await
            .expect_err("fails");

        assert!(matches!(err, RetryError::Exhausted { attempts: 1, .. }));
        assert!(err.to_string().contains("failed after 1 attempts"));
    }
}
