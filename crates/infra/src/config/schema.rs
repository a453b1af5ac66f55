//! Configuration schema.
//!
//! Every section is optional in the file; missing keys take the defaults
//! below. Durations are written as integer milliseconds (`*_ms` keys).

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use provider_mailgun_common::utils::option_duration_millis;
use provider_mailgun_common::{
    duration_millis, CircuitBreakerConfig, CommonError, CommonResult, RetryPolicy,
};
use provider_mailgun_domain::Region;
use serde::{Deserialize, Serialize};
use url::Url;

/// Root configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api: ApiConfig,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerSettings,
    pub server: ServerConfig,
    pub controller: ControllerConfig,
}

impl ProviderConfig {
    /// Check cross-field constraints after loading and overrides.
    ///
    /// # Errors
    /// Returns [`CommonError::Config`] naming the offending field.
    pub fn validate(&self) -> CommonResult<()> {
        if self.api.api_key.trim().is_empty() {
            return Err(CommonError::config_field("api.api_key", "must not be empty"));
        }
        if self.api.username.trim().is_empty() {
            return Err(CommonError::config_field("api.username", "must not be empty"));
        }
        let base_url = self.api.effective_base_url();
        match Url::parse(&base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(CommonError::config_field(
                    "api.base_url",
                    format!("unsupported scheme '{}'", url.scheme()),
                ))
            }
            Err(e) => {
                return Err(CommonError::config_field(
                    "api.base_url",
                    format!("invalid URL '{base_url}': {e}"),
                ))
            }
        }
        if self.controller.max_concurrency == 0 {
            return Err(CommonError::config_field(
                "controller.max_concurrency",
                "must be greater than 0",
            ));
        }
        self.circuit_breaker.to_config()?;
        self.retry.to_policy()?;
        Ok(())
    }
}

/// Remote API endpoint and credentials.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub region: Region,
    /// Overrides the region's default endpoint.
    pub base_url: Option<String>,
    pub username: String,
    #[serde(skip_serializing)]
    pub api_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            region: Region::default(),
            base_url: None,
            username: "api".to_string(),
            api_key: String::new(),
        }
    }
}

impl ApiConfig {
    /// Explicit base URL, else the region default.
    pub fn effective_base_url(&self) -> String {
        match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => self.region.default_base_url().to_string(),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("region", &self.region)
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Transport tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(rename = "request_timeout_ms", with = "duration_millis")]
    pub request_timeout: Duration,
    #[serde(rename = "pool_idle_timeout_ms", with = "duration_millis")]
    pub pool_idle_timeout: Duration,
    pub max_idle_per_host: usize,
    /// Extra attempts made by the transport when the API answers 502.
    pub gateway_retries: u32,
    #[serde(rename = "gateway_backoff_ms", with = "duration_millis")]
    pub gateway_backoff: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            max_idle_per_host: 16,
            gateway_retries: 2,
            gateway_backoff: Duration::from_millis(500),
        }
    }
}

/// Named starting point for the operation-level retry policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryProfile {
    /// Conservative preset: 3 attempts, 250ms initial backoff.
    Default,
    /// API-tuned preset: 5 attempts, 500ms initial backoff.
    #[default]
    Api,
}

/// Operation-level retry policy: a profile plus optional overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub profile: RetryProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(
        rename = "initial_backoff_ms",
        with = "option_duration_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub initial_backoff: Option<Duration>,
    #[serde(
        rename = "max_backoff_ms",
        with = "option_duration_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_backoff: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_fraction: Option<f64>,
    /// Added to the profile's retryable substrings.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_retryable_substrings: Vec<String>,
}

impl RetryConfig {
    /// Build the policy: profile preset, then each override that is set.
    ///
    /// # Errors
    /// Returns [`CommonError::Config`] if the result fails policy validation.
    pub fn to_policy(&self) -> CommonResult<RetryPolicy> {
        let base = match self.profile {
            RetryProfile::Default => RetryPolicy::conservative(),
            RetryProfile::Api => RetryPolicy::api(),
        };
        let mut builder = base.to_builder();
        if let Some(attempts) = self.max_attempts {
            builder = builder.max_attempts(attempts);
        }
        if let Some(initial) = self.initial_backoff {
            builder = builder.initial_backoff(initial);
        }
        if let Some(max) = self.max_backoff {
            builder = builder.max_backoff(max);
        }
        if let Some(jitter) = self.jitter_fraction {
            builder = builder.jitter_fraction(jitter);
        }
        for substring in &self.extra_retryable_substrings {
            builder = builder.retryable_substring(substring);
        }
        builder.build()
    }
}

/// Circuit breaker tuning for the API dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Label used in logs and metrics.
    pub name: String,
    pub failure_threshold: u32,
    #[serde(rename = "reset_timeout_ms", with = "duration_millis")]
    pub reset_timeout: Duration,
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        let defaults = CircuitBreakerConfig::default();
        Self {
            name: "mailgun".to_string(),
            failure_threshold: defaults.failure_threshold,
            reset_timeout: defaults.reset_timeout,
            half_open_success_threshold: defaults.half_open_success_threshold,
        }
    }
}

impl CircuitBreakerSettings {
    /// Validated breaker configuration.
    pub fn to_config(&self) -> CommonResult<CircuitBreakerConfig> {
        if self.name.trim().is_empty() {
            return Err(CommonError::config_field("circuit_breaker.name", "must not be empty"));
        }
        CircuitBreakerConfig::builder()
            .failure_threshold(self.failure_threshold)
            .reset_timeout(self.reset_timeout)
            .half_open_success_threshold(self.half_open_success_threshold)
            .build()
    }
}

/// Health, readiness and metrics endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub health_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { health_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)) }
    }
}

/// Concurrency limits for batch commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Upper bound on concurrently running resource operations.
    pub max_concurrency: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { max_concurrency: 10 }
    }
}
