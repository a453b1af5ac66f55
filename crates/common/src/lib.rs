//! Shared building blocks for the Mailgun provider crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error taxonomy, network signals, serde helpers
//! - `runtime`: cancellation context, retry executor, circuit breaker,
//!   metrics traits
//! - `observability`: Prometheus-backed metrics collector
//! - `test-utils`: recording collectors and fixtures for tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod utils;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod observability;
#[cfg(feature = "runtime")]
pub mod resilience;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", all(test, feature = "runtime")))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity, NetworkSignal};
#[cfg(feature = "runtime")]
pub use observability::{MetricsCollector, NoOpMetricsCollector};
#[cfg(feature = "runtime")]
pub use resilience::{
    BreakerError, BreakerSnapshot, CancelReason, CircuitBreaker, CircuitBreakerConfig,
    CircuitState, Clock, Context, MockClock, RetryError, RetryExecutor, RetryPolicy,
    RetryPolicyBuilder, SystemClock,
};
#[cfg(feature = "foundation")]
pub use utils::serde::duration_millis;
