//! Configuration schema, loading and client construction.

pub mod credentials;
pub mod loader;
pub mod schema;

pub use credentials::ApiCredentials;
pub use loader::{apply_env_overrides, load, load_from_file, probe_config_paths};
pub use schema::{
    ApiConfig, CircuitBreakerSettings, ControllerConfig, HttpConfig, ProviderConfig, RetryConfig,
    RetryProfile, ServerConfig,
};

use provider_mailgun_common::CommonResult;

use crate::http::HttpClient;

/// Build the authenticated transport described by `config`.
pub fn build_http_client(config: &ProviderConfig) -> CommonResult<HttpClient> {
    HttpClient::builder()
        .base_url(config.api.effective_base_url())
        .credentials(config.api.username.clone(), config.api.api_key.clone())
        .timeout(config.http.request_timeout)
        .pool_idle_timeout(config.http.pool_idle_timeout)
        .pool_max_idle_per_host(config.http.max_idle_per_host)
        .gateway_retries(config.http.gateway_retries)
        .gateway_backoff(config.http.gateway_backoff)
        .user_agent(concat!("provider-mailgun/", env!("CARGO_PKG_VERSION")))
        .build()
}
