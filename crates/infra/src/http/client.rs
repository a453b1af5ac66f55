//! reqwest-based transport with gateway retries.
//!
//! [`HttpClient::send`] retries only on HTTP 502, which the API's edge
//! returns while a backend is being replaced. Every other outcome, including
//! other 5xx statuses and network failures, is returned to the caller so the
//! operation-level retry executor can classify it.

use std::time::Duration;

use provider_mailgun_common::{CommonError, CommonResult};
use provider_mailgun_domain::{ApiError, ApiResult};
use reqwest::{Client as ReqwestClient, Method, Response, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, warn};

/// Authenticated client bound to one API base URL.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    base_url: String,
    username: String,
    api_key: String,
    gateway_retries: u32,
    gateway_backoff: Duration,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("gateway_retries", &self.gateway_retries)
            .field("gateway_backoff", &self.gateway_backoff)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one logical request and decode the JSON response.
    ///
    /// A 502 is retried up to `gateway_retries` more times, sleeping
    /// `gateway_backoff * n` before the n-th retry. 204 and empty 2xx bodies
    /// decode as JSON `null`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        form: Option<&[(&'static str, String)]>,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt: u32 = 0;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .basic_auth(&self.username, Some(&self.api_key));
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(form) = form {
                request = request.form(form);
            }

            debug!(%method, url = %url, attempt = attempt + 1, "sending HTTP request");
            let response = request.send().await.map_err(transport_error)?;
            let status = response.status();
            debug!(%method, url = %url, status = status.as_u16(), "received HTTP response");

            if status == StatusCode::BAD_GATEWAY && attempt < self.gateway_retries {
                attempt += 1;
                let delay = self.gateway_backoff.saturating_mul(attempt);
                warn!(
                    %method,
                    url = %url,
                    retry = attempt,
                    max_retries = self.gateway_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "bad gateway, retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            return decode(&method, path, response).await;
        }
    }

    /// Send a request whose response body is irrelevant.
    pub async fn send_unit(
        &self,
        method: Method,
        path: &str,
        form: Option<&[(&'static str, String)]>,
    ) -> ApiResult<()> {
        self.send::<IgnoredAny>(method, path, &[], form).await.map(|_| ())
    }
}

async fn decode<T: DeserializeOwned>(method: &Method, path: &str, response: Response) -> ApiResult<T> {
    let status = response.status();
    let body = response.bytes().await.map_err(transport_error)?;

    if !status.is_success() {
        let message = error_message(status, &body);
        return Err(ApiError::status(method.as_str(), path, status.as_u16(), message));
    }

    let decoded = if status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_slice(&body)
    };
    decoded.map_err(|e| ApiError::Decode { message: e.to_string() })
}

/// The API's `message` field, else the raw body, else the status reason.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    let from_json = serde_json::from_slice::<serde_json::Value>(body).ok().and_then(|value| {
        value.get("message").and_then(serde_json::Value::as_str).map(str::to_owned)
    });
    if let Some(message) = from_json {
        return message;
    }
    let raw = String::from_utf8_lossy(body).trim().to_owned();
    if raw.is_empty() {
        status.canonical_reason().unwrap_or("unknown status").to_owned()
    } else {
        raw
    }
}

/// URLs are stripped; they embed resource identifiers.
///
/// The message joins the whole source chain so socket errors such as
/// "connection refused" reach the retry classifier.
fn transport_error(err: reqwest::Error) -> ApiError {
    let timed_out = err.is_timeout();
    let connect = err.is_connect();
    let err = err.without_url();
    ApiError::Transport { message: error_chain(&err), timed_out, connect }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    base_url: String,
    username: String,
    api_key: String,
    timeout: Duration,
    pool_idle_timeout: Duration,
    pool_max_idle_per_host: usize,
    gateway_retries: u32,
    gateway_backoff: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: "api".to_owned(),
            api_key: String::new(),
            timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 16,
            gateway_retries: 2,
            gateway_backoff: Duration::from_millis(500),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    /// Root of every request path.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Basic auth username and API key.
    pub fn credentials(mut self, username: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.username = username.into();
        self.api_key = api_key.into();
        self
    }

    /// Whole-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// How long idle pooled connections are kept.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Idle connections kept per host.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Extra attempts after a 502; zero disables gateway retries.
    pub fn gateway_retries(mut self, retries: u32) -> Self {
        self.gateway_retries = retries;
        self
    }

    /// Base delay between 502 retries; multiplied by the retry number.
    pub fn gateway_backoff(mut self, backoff: Duration) -> Self {
        self.gateway_backoff = backoff;
        self
    }

    /// User-Agent header value.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Validate the base URL and build the reqwest client.
    pub fn build(self) -> CommonResult<HttpClient> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| CommonError::config_field("api.base_url", e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CommonError::config_field(
                "api.base_url",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        let mut builder = ReqwestClient::builder()
            .timeout(self.timeout)
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host);
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        let client = builder
            .build()
            .map_err(|e| CommonError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpClient {
            client,
            base_url: self.base_url.trim_end_matches('/').to_owned(),
            username: self.username,
            api_key: self.api_key,
            gateway_retries: self.gateway_retries,
            gateway_backoff: self.gateway_backoff,
        })
    }
}
