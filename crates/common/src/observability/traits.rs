//! Metrics collection abstraction.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Sink for counters, gauges and histograms.
///
/// Labels are `(name, value)` pairs. Implementations must be cheap to call
/// from hot paths and must never fail the caller.
pub trait MetricsCollector: Send + Sync + Debug {
    /// Add one to a counter.
    fn increment_counter(&self, name: &str, labels: &[(&str, &str)]);

    /// Set a gauge to `value`.
    fn record_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]);

    /// Observe `value` in a histogram.
    fn record_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]);

    /// Observe a duration in seconds.
    fn record_duration(&self, name: &str, duration: Duration, labels: &[(&str, &str)]) {
        self.record_histogram(name, duration.as_secs_f64(), labels);
    }
}

impl<T: MetricsCollector + ?Sized> MetricsCollector for Arc<T> {
    fn increment_counter(&self, name: &str, labels: &[(&str, &str)]) {
        (**self).increment_counter(name, labels);
    }

    fn record_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        (**self).record_gauge(name, value, labels);
    }

    fn record_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        (**self).record_histogram(name, value, labels);
    }
}

/// Discards every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetricsCollector;

impl MetricsCollector for NoOpMetricsCollector {
    fn increment_counter(&self, _name: &str, _labels: &[(&str, &str)]) {}

    fn record_gauge(&self, _name: &str, _value: f64, _labels: &[(&str, &str)]) {}

    fn record_histogram(&self, _name: &str, _value: f64, _labels: &[(&str, &str)]) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingMetricsCollector;

    #[test]
    fn test_noop_collector_accepts_everything() {
        let collector = NoOpMetricsCollector;
        collector.increment_counter("anything", &[("a", "b")]);
        collector.record_gauge("anything", 1.0, &[]);
        collector.record_duration("anything", Duration::from_millis(5), &[]);
    }

    /// Validates the default `record_duration` conversion to seconds.
    ///
    /// Assertions:
    /// - A 1500ms duration is observed as 1.5.
    #[test]
    fn test_record_duration_uses_seconds() {
        let collector = Arc::new(RecordingMetricsCollector::new());
        collector.record_duration("latency", Duration::from_millis(1500), &[("op", "x")]);

        let samples = collector.histograms("latency");
        assert_eq!(samples.len(), 1);
        assert!((samples[0].value - 1.5).abs() < f64::EPSILON);
        assert_eq!(samples[0].label("op"), Some("x"));
    }
}
