//! Test doubles for the resilience layer.
//!
//! - **[`metrics`]**: a [`MetricsCollector`](crate::observability::MetricsCollector)
//!   that records every sample for later assertions
//! - **[`errors`]**: a configurable error type with network signals
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use provider_mailgun_common::testing::RecordingMetricsCollector;
//! use provider_mailgun_common::MetricsCollector;
//!
//! let metrics = Arc::new(RecordingMetricsCollector::new());
//! metrics.increment_counter("calls_total", &[("operation", "get_domain")]);
//! assert_eq!(metrics.counter_total("calls_total", &[("operation", "get_domain")]), 1.0);
//! ```

#![allow(clippy::missing_panics_doc)]

pub mod errors;
pub mod metrics;

pub use errors::TestError;
pub use metrics::{RecordingMetricsCollector, Sample};
