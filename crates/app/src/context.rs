//! Application context - dependency wiring
//!
//! Builds, in order: metrics registry, Prometheus collector, circuit
//! breaker, retry executor, transport, API client and the resilient facade
//! over it. Everything downstream receives its collaborators from here; no
//! component reaches for process-global state.

use std::sync::Arc;

use anyhow::Context as _;
use prometheus::Registry;
use provider_mailgun_common::observability::PrometheusMetricsCollector;
use provider_mailgun_common::{
    CircuitBreaker, CircuitState, MetricsCollector, RetryExecutor, RetryPolicy,
};
use provider_mailgun_core::{MailgunApi, ResilientClient};
use provider_mailgun_infra::{build_http_client, MailgunClient, ProviderConfig};
use tracing::info;

/// Shared state for the server and the observe command.
pub struct AppContext {
    pub config: ProviderConfig,
    pub client: ResilientClient,
    metrics: Arc<PrometheusMetricsCollector>,
}

impl AppContext {
    /// Wire the production stack against the configured endpoint.
    pub fn new(config: ProviderConfig) -> anyhow::Result<Self> {
        let http = build_http_client(&config).context("failed to build HTTP client")?;
        info!(
            base_url = %http.base_url(),
            region = %config.api.region,
            gateway_retries = config.http.gateway_retries,
            "configured Mailgun transport"
        );
        Self::with_api(config, Arc::new(MailgunClient::new(http)))
    }

    /// Wire the stack around any implementation of the API port.
    pub fn with_api(config: ProviderConfig, api: Arc<dyn MailgunApi>) -> anyhow::Result<Self> {
        let metrics = Arc::new(
            PrometheusMetricsCollector::new(Registry::new())
                .context("failed to register metrics")?,
        );
        let collector: Arc<dyn MetricsCollector> = metrics.clone();

        let breaker = CircuitBreaker::new(
            config.circuit_breaker.name.clone(),
            config.circuit_breaker.to_config()?,
            Arc::clone(&collector),
        )?;
        let policy = config.retry.to_policy()?;
        info!(
            breaker = %breaker.name(),
            failure_threshold = config.circuit_breaker.failure_threshold,
            max_attempts = policy.max_attempts(),
            "configured resilience layer"
        );

        let retry = RetryExecutor::new(RetryPolicy::conservative(), collector);
        let client = ResilientClient::new(api, retry, Arc::new(breaker)).with_policy(policy);

        Ok(Self { config, client, metrics })
    }

    /// Ready unless the API breaker is open.
    pub fn is_ready(&self) -> bool {
        self.client.breaker().state() != CircuitState::Open
    }

    /// Current state of the API breaker.
    pub fn breaker_state(&self) -> CircuitState {
        self.client.breaker().state()
    }

    /// Prometheus text exposition of every registered family.
    pub fn render_metrics(&self) -> anyhow::Result<String> {
        Ok(self.metrics.render()?)
    }
}
