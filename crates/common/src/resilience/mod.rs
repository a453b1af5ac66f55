//! Resilience layer for calls to remote dependencies.
//!
//! - **[`context`]**: cancellation and deadlines shared by every wait
//! - **[`policy`]**: retry policy presets and backoff calculation
//! - **[`classify`]**: which errors are worth retrying
//! - **[`retry`]**: the retry executor
//! - **[`circuit_breaker`]**: the shared three-state breaker
//! - **[`metrics`]**: metric names emitted by the above
//!
//! A resilient call nests the breaker inside the retry loop:
//!
//! ```rust,ignore
//! retry.run(&ctx, "create_domain", Some(&policy), || {
//!     breaker.execute(&ctx, || api.create_domain(&params))
//! })
//! .await
//! ```
//!
//! so an open breaker turns each remaining attempt into a cheap rejection
//! that the classifier treats as permanent.

pub mod circuit_breaker;
pub mod classify;
pub mod context;
pub mod metrics;
pub mod policy;
pub mod retry;

pub use circuit_breaker::{
    BreakerError, BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig,
    CircuitBreakerConfigBuilder, CircuitState, Clock, MockClock, SystemClock,
};
pub use classify::{is_retryable_result, TRANSIENT_STATUS_CODES};
pub use context::{CancelReason, Context};
pub use policy::{RetryPolicy, RetryPolicyBuilder, MAX_BACKOFF_EXPONENT};
pub use retry::{RetryError, RetryExecutor};
