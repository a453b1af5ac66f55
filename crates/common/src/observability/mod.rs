//! Metrics plumbing injected into the resilience layer.
//!
//! Components take an `Arc<dyn MetricsCollector>` at construction time; there
//! is no process-global registry.

#[cfg(feature = "observability")]
pub mod prometheus;
pub mod traits;

#[cfg(feature = "observability")]
pub use self::prometheus::PrometheusMetricsCollector;
pub use traits::{MetricsCollector, NoOpMetricsCollector};
