//! Prometheus-backed [`MetricsCollector`].
//!
//! The collector registers the resilience metric families on a caller-owned
//! [`Registry`] and routes samples to them by name. Samples for unknown names
//! or with mismatched labels are dropped with a log line; emitting metrics
//! never fails the caller.

use std::collections::HashMap;

use prometheus::{CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use tracing::{trace, warn};

use super::traits::MetricsCollector;
use crate::error::{CommonError, CommonResult};
use crate::resilience::metrics as names;

const BACKOFF_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0, 30.0];

/// Routes resilience samples into Prometheus metric families.
#[derive(Debug, Clone)]
pub struct PrometheusMetricsCollector {
    registry: Registry,
    counters: HashMap<&'static str, CounterVec>,
    gauges: HashMap<&'static str, GaugeVec>,
    histograms: HashMap<&'static str, HistogramVec>,
}

impl PrometheusMetricsCollector {
    /// Register every resilience metric family on `registry`.
    pub fn new(registry: Registry) -> CommonResult<Self> {
        let mut collector = Self {
            registry,
            counters: HashMap::new(),
            gauges: HashMap::new(),
            histograms: HashMap::new(),
        };

        collector.counter(
            names::RETRY_ATTEMPTS_TOTAL,
            "Attempts made by the retry executor",
            &["operation", "outcome"],
        )?;
        collector.counter(
            names::RETRY_OPERATIONS_TOTAL,
            "Retry executor runs by final outcome",
            &["operation", "outcome"],
        )?;
        collector.histogram(
            names::RETRY_BACKOFF_SECONDS,
            "Backoff delays slept between attempts",
            &["operation"],
        )?;
        collector.gauge(
            names::CIRCUIT_BREAKER_STATE,
            "Circuit breaker state (0=closed, 1=open, 2=half-open)",
            &["breaker"],
        )?;
        collector.counter(
            names::CIRCUIT_BREAKER_TRANSITIONS_TOTAL,
            "Circuit breaker state transitions",
            &["breaker", "from", "to"],
        )?;
        collector.counter(
            names::CIRCUIT_BREAKER_REJECTIONS_TOTAL,
            "Calls rejected while the circuit breaker was open",
            &["breaker"],
        )?;

        Ok(collector)
    }

    /// The registry samples are recorded into.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn render(&self) -> CommonResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| CommonError::serialization_format("prometheus", e.to_string()))?;
        String::from_utf8(buffer)
            .map_err(|e| CommonError::serialization_format("prometheus", e.to_string()))
    }

    fn counter(&mut self, name: &'static str, help: &str, labels: &[&str]) -> CommonResult<()> {
        let vec = CounterVec::new(Opts::new(name, help), labels).map_err(registration_error)?;
        self.registry.register(Box::new(vec.clone())).map_err(registration_error)?;
        self.counters.insert(name, vec);
        Ok(())
    }

    fn gauge(&mut self, name: &'static str, help: &str, labels: &[&str]) -> CommonResult<()> {
        let vec = GaugeVec::new(Opts::new(name, help), labels).map_err(registration_error)?;
        self.registry.register(Box::new(vec.clone())).map_err(registration_error)?;
        self.gauges.insert(name, vec);
        Ok(())
    }

    fn histogram(&mut self, name: &'static str, help: &str, labels: &[&str]) -> CommonResult<()> {
        let opts = HistogramOpts::new(name, help).buckets(BACKOFF_BUCKETS.to_vec());
        let vec = HistogramVec::new(opts, labels).map_err(registration_error)?;
        self.registry.register(Box::new(vec.clone())).map_err(registration_error)?;
        self.histograms.insert(name, vec);
        Ok(())
    }
}

fn registration_error(err: prometheus::Error) -> CommonError {
    CommonError::internal(format!("metric registration failed: {err}"))
}

fn label_map<'a>(labels: &[(&'a str, &'a str)]) -> HashMap<&'a str, &'a str> {
    labels.iter().copied().collect()
}

impl MetricsCollector for PrometheusMetricsCollector {
    fn increment_counter(&self, name: &str, labels: &[(&str, &str)]) {
        let Some(vec) = self.counters.get(name) else {
            trace!(metric = name, "dropping sample for unregistered counter");
            return;
        };
        match vec.get_metric_with(&label_map(labels)) {
            Ok(counter) => counter.inc(),
            Err(e) => warn!(metric = name, error = %e, "counter labels rejected"),
        }
    }

    fn record_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        let Some(vec) = self.gauges.get(name) else {
            trace!(metric = name, "dropping sample for unregistered gauge");
            return;
        };
        match vec.get_metric_with(&label_map(labels)) {
            Ok(gauge) => gauge.set(value),
            Err(e) => warn!(metric = name, error = %e, "gauge labels rejected"),
        }
    }

    fn record_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        let Some(vec) = self.histograms.get(name) else {
            trace!(metric = name, "dropping sample for unregistered histogram");
            return;
        };
        match vec.get_metric_with(&label_map(labels)) {
            Ok(histogram) => histogram.observe(value),
            Err(e) => warn!(metric = name, error = %e, "histogram labels rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> PrometheusMetricsCollector {
        PrometheusMetricsCollector::new(Registry::new()).expect("register metrics")
    }

    /// Validates that samples reach the registry and render as text.
    ///
    /// Assertions:
    /// - The counter line carries both labels and the value 2.
    /// - The gauge reflects the last value set.
    #[test]
    fn test_counter_and_gauge_render() {
        let metrics = collector();
        let labels = [("operation", "create_domain"), ("outcome", "success")];
        metrics.increment_counter(names::RETRY_ATTEMPTS_TOTAL, &labels);
        metrics.increment_counter(names::RETRY_ATTEMPTS_TOTAL, &labels);
        metrics.record_gauge(names::CIRCUIT_BREAKER_STATE, 1.0, &[("breaker", "mailgun")]);

        let text = metrics.render().expect("render");
        assert!(text.contains(
            r#"provider_retry_attempts_total{operation="create_domain",outcome="success"} 2"#
        ));
        assert!(text.contains(r#"provider_circuit_breaker_state{breaker="mailgun"} 1"#));
    }

    #[test]
    fn test_histogram_observation() {
        let metrics = collector();
        metrics.record_histogram(names::RETRY_BACKOFF_SECONDS, 0.3, &[("operation", "get_route")]);

        let text = metrics.render().expect("render");
        assert!(text.contains(r#"provider_retry_backoff_seconds_count{operation="get_route"} 1"#));
    }

    /// Validates that bad samples are dropped instead of panicking.
    #[test]
    fn test_unknown_metric_and_bad_labels_are_ignored() {
        let metrics = collector();
        metrics.increment_counter("not_registered_total", &[]);
        metrics.increment_counter(names::RETRY_ATTEMPTS_TOTAL, &[("operation", "x")]);
        metrics.record_gauge(names::CIRCUIT_BREAKER_STATE, 0.0, &[("wrong", "label")]);

        let text = metrics.render().expect("render");
        assert!(!text.contains("not_registered_total"));
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        let _first = PrometheusMetricsCollector::new(registry.clone()).expect("first");
        assert!(PrometheusMetricsCollector::new(registry).is_err());
    }
}
