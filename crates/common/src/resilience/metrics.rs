//! Metric names and label values emitted by the resilience layer.
//!
//! Collectors receive these names through
//! [`MetricsCollector`](crate::observability::MetricsCollector); keeping them
//! in one place lets the Prometheus collector pre-register exactly this set.

/// One sample per attempt. Labels: `operation`, `outcome`.
pub const RETRY_ATTEMPTS_TOTAL: &str = "provider_retry_attempts_total";

/// One sample per `run`. Labels: `operation`, `outcome`.
pub const RETRY_OPERATIONS_TOTAL: &str = "provider_retry_operations_total";

/// Backoff delays in seconds. Labels: `operation`.
pub const RETRY_BACKOFF_SECONDS: &str = "provider_retry_backoff_seconds";

/// 0 closed, 1 open, 2 half-open. Labels: `breaker`.
pub const CIRCUIT_BREAKER_STATE: &str = "provider_circuit_breaker_state";

/// Labels: `breaker`, `from`, `to`.
pub const CIRCUIT_BREAKER_TRANSITIONS_TOTAL: &str = "provider_circuit_breaker_transitions_total";

/// Calls rejected while open. Labels: `breaker`.
pub const CIRCUIT_BREAKER_REJECTIONS_TOTAL: &str = "provider_circuit_breaker_rejections_total";

/// `outcome` label values.
pub mod outcome {
    /// The attempt or run succeeded.
    pub const SUCCESS: &str = "success";
    /// The attempt failed.
    pub const FAILURE: &str = "failure";
    /// The run gave up after the last allowed attempt.
    pub const EXHAUSTED: &str = "exhausted";
    /// The run stopped on a permanent error.
    pub const NON_RETRYABLE: &str = "non_retryable";
    /// The context ended during a backoff wait.
    pub const CANCELLED: &str = "cancelled";
}
