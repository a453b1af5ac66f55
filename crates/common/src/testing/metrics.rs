//! In-memory metrics collector.

use std::sync::{Mutex, PoisonError};

use crate::observability::MetricsCollector;

/// Kind of a recorded sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Counter,
    Gauge,
    Histogram,
}

/// One emitted metric sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub kind: SampleKind,
    pub name: String,
    pub value: f64,
    pub labels: Vec<(String, String)>,
}

impl Sample {
    /// Value of the label `key`, if present.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Whether every `(key, value)` pair in `expected` is present.
    pub fn matches(&self, expected: &[(&str, &str)]) -> bool {
        expected.iter().all(|(k, v)| self.label(k) == Some(*v))
    }
}

/// Records every sample in emission order.
#[derive(Debug, Default)]
pub struct RecordingMetricsCollector {
    samples: Mutex<Vec<Sample>>,
}

impl RecordingMetricsCollector {
    /// Empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// All samples so far, in emission order.
    pub fn samples(&self) -> Vec<Sample> {
        self.samples.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Drop every recorded sample.
    pub fn clear(&self) {
        self.samples.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Counter samples recorded under `name`.
    pub fn counters(&self, name: &str) -> Vec<Sample> {
        self.filter(SampleKind::Counter, name)
    }

    /// Gauge samples recorded under `name`.
    pub fn gauges(&self, name: &str) -> Vec<Sample> {
        self.filter(SampleKind::Gauge, name)
    }

    /// Histogram samples recorded under `name`.
    pub fn histograms(&self, name: &str) -> Vec<Sample> {
        self.filter(SampleKind::Histogram, name)
    }

    /// Sum of counter increments for `name` whose labels include `labels`.
    pub fn counter_total(&self, name: &str, labels: &[(&str, &str)]) -> f64 {
        self.counters(name).iter().filter(|s| s.matches(labels)).map(|s| s.value).sum()
    }

    /// Most recent gauge value for `name` whose labels include `labels`.
    pub fn last_gauge(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.gauges(name).iter().rev().find(|s| s.matches(labels)).map(|s| s.value)
    }

    fn filter(&self, kind: SampleKind, name: &str) -> Vec<Sample> {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.kind == kind && s.name == name)
            .cloned()
            .collect()
    }

    fn push(&self, kind: SampleKind, name: &str, value: f64, labels: &[(&str, &str)]) {
        let sample = Sample {
            kind,
            name: name.to_owned(),
            value,
            labels: labels.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect(),
        };
        self.samples.lock().unwrap_or_else(PoisonError::into_inner).push(sample);
    }
}

impl MetricsCollector for RecordingMetricsCollector {
    fn increment_counter(&self, name: &str, labels: &[(&str, &str)]) {
        self.push(SampleKind::Counter, name, 1.0, labels);
    }

    fn record_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        self.push(SampleKind::Gauge, name, value, labels);
    }

    fn record_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        self.push(SampleKind::Histogram, name, value, labels);
    }
}
