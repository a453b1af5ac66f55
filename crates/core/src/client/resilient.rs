//! Retry and circuit-breaker facade over [`MailgunApi`].
//!
//! Every public method is one [`ResilientClient::call`]: the retry executor
//! drives the attempts and each attempt passes through the shared breaker
//! before reaching the API.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use provider_mailgun_common::{CircuitBreaker, Context, RetryExecutor, RetryPolicy};
use provider_mailgun_domain::{
    ApiResult, BounceObservation, BounceParameters, ComplaintObservation, ComplaintParameters,
    DomainObservation, DomainParameters, MailingListObservation, MailingListParameters,
    RouteObservation, RouteParameters, SmtpCredentialObservation, SmtpCredentialParameters,
    TemplateObservation, TemplateParameters, UnsubscribeObservation, UnsubscribeParameters,
    WebhookKind, WebhookObservation, WebhookParameters,
};

use super::ports::MailgunApi;
use crate::errors::{ProviderError, ProviderResult};

/// Resilient access to the remote API.
///
/// Cheap to clone; clones share the API handle and the breaker.
#[derive(Clone)]
pub struct ResilientClient {
    api: Arc<dyn MailgunApi>,
    retry: RetryExecutor,
    breaker: Arc<CircuitBreaker>,
    policy: RetryPolicy,
}

impl fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientClient")
            .field("breaker", &self.breaker.name())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ResilientClient {
    /// Build a client using the API retry profile.
    pub fn new(
        api: Arc<dyn MailgunApi>,
        retry: RetryExecutor,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self { api, retry, breaker, policy: RetryPolicy::api() }
    }

    /// Replace the retry policy applied to every operation.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The breaker shared by all operations.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Retry policy applied to every operation.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run one API operation through retries and the breaker.
    ///
    /// `op` is invoked once per attempt; the future it returns is only polled
    /// if the breaker admits the attempt, and is dropped if `ctx` ends while
    /// it is in flight.
    pub async fn call<T, F, Fut>(&self, ctx: &Context, operation: &str, mut op: F) -> ProviderResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        self.retry
            .run(ctx, operation, Some(&self.policy), || {
                let attempt = op();
                self.breaker.execute(ctx, move || attempt)
            })
            .await
            .map_err(ProviderError::from)
    }

    // Domains

    /// Create a domain.
    pub async fn create_domain(
        &self,
        ctx: &Context,
        params: &DomainParameters,
    ) -> ProviderResult<DomainObservation> {
        self.call(ctx, "create_domain", move || self.api.create_domain(params)).await
    }

    /// Fetch a domain.
    pub async fn get_domain(&self, ctx: &Context, name: &str) -> ProviderResult<DomainObservation> {
        self.call(ctx, "get_domain", move || self.api.get_domain(name)).await
    }

    /// Update a domain.
    pub async fn update_domain(
        &self,
        ctx: &Context,
        name: &str,
        params: &DomainParameters,
    ) -> ProviderResult<()> {
        self.call(ctx, "update_domain", move || self.api.update_domain(name, params)).await
    }

    /// Delete a domain.
    pub async fn delete_domain(&self, ctx: &Context, name: &str) -> ProviderResult<()> {
        self.call(ctx, "delete_domain", move || self.api.delete_domain(name)).await
    }

    // Routes

    /// Create a route.
    pub async fn create_route(
        &self,
        ctx: &Context,
        params: &RouteParameters,
    ) -> ProviderResult<RouteObservation> {
        self.call(ctx, "create_route", move || self.api.create_route(params)).await
    }

    /// Fetch a route.
    pub async fn get_route(&self, ctx: &Context, id: &str) -> ProviderResult<RouteObservation> {
        self.call(ctx, "get_route", move || self.api.get_route(id)).await
    }

    /// Update a route.
    pub async fn update_route(
        &self,
        ctx: &Context,
        id: &str,
        params: &RouteParameters,
    ) -> ProviderResult<RouteObservation> {
        self.call(ctx, "update_route", move || self.api.update_route(id, params)).await
    }

    /// Delete a route.
    pub async fn delete_route(&self, ctx: &Context, id: &str) -> ProviderResult<()> {
        self.call(ctx, "delete_route", move || self.api.delete_route(id)).await
    }

    // Mailing lists

    /// Create a mailing list.
    pub async fn create_mailing_list(
        &self,
        ctx: &Context,
        params: &MailingListParameters,
    ) -> ProviderResult<MailingListObservation> {
        self.call(ctx, "create_mailing_list", move || self.api.create_mailing_list(params)).await
    }

    /// Fetch a mailing list.
    pub async fn get_mailing_list(
        &self,
        ctx: &Context,
        address: &str,
    ) -> ProviderResult<MailingListObservation> {
        self.call(ctx, "get_mailing_list", move || self.api.get_mailing_list(address)).await
    }

    /// Update a mailing list.
    pub async fn update_mailing_list(
        &self,
        ctx: &Context,
        address: &str,
        params: &MailingListParameters,
    ) -> ProviderResult<MailingListObservation> {
        self.call(ctx, "update_mailing_list", move || {
            self.api.update_mailing_list(address, params)
        })
        .await
    }

    /// Delete a mailing list.
    pub async fn delete_mailing_list(&self, ctx: &Context, address: &str) -> ProviderResult<()> {
        self.call(ctx, "delete_mailing_list", move || self.api.delete_mailing_list(address)).await
    }

    // Webhooks

    /// Create a webhook.
    pub async fn create_webhook(
        &self,
        ctx: &Context,
        params: &WebhookParameters,
    ) -> ProviderResult<WebhookObservation> {
        self.call(ctx, "create_webhook", move || self.api.create_webhook(params)).await
    }

    /// Fetch a webhook.
    pub async fn get_webhook(
        &self,
        ctx: &Context,
        domain: &str,
        kind: WebhookKind,
    ) -> ProviderResult<WebhookObservation> {
        self.call(ctx, "get_webhook", move || self.api.get_webhook(domain, kind)).await
    }

    /// Update a webhook.
    pub async fn update_webhook(
        &self,
        ctx: &Context,
        params: &WebhookParameters,
    ) -> ProviderResult<WebhookObservation> {
        self.call(ctx, "update_webhook", move || self.api.update_webhook(params)).await
    }

    /// Delete a webhook.
    pub async fn delete_webhook(
        &self,
        ctx: &Context,
        domain: &str,
        kind: WebhookKind,
    ) -> ProviderResult<()> {
        self.call(ctx, "delete_webhook", move || self.api.delete_webhook(domain, kind)).await
    }

    // SMTP credentials

    /// Create an SMTP credential.
    pub async fn create_smtp_credential(
        &self,
        ctx: &Context,
        params: &SmtpCredentialParameters,
    ) -> ProviderResult<()> {
        self.call(ctx, "create_smtp_credential", move || self.api.create_smtp_credential(params))
            .await
    }

    /// Fetch an SMTP credential.
    pub async fn get_smtp_credential(
        &self,
        ctx: &Context,
        domain: &str,
        login: &str,
    ) -> ProviderResult<SmtpCredentialObservation> {
        self.call(ctx, "get_smtp_credential", move || self.api.get_smtp_credential(domain, login))
            .await
    }

    /// Change an SMTP credential's password.
    pub async fn update_smtp_credential_password(
        &self,
        ctx: &Context,
        params: &SmtpCredentialParameters,
    ) -> ProviderResult<()> {
        self.call(ctx, "update_smtp_credential_password", move || {
            self.api.update_smtp_credential_password(params)
        })
        .await
    }

    /// Delete an SMTP credential.
    pub async fn delete_smtp_credential(
        &self,
        ctx: &Context,
        domain: &str,
        login: &str,
    ) -> ProviderResult<()> {
        self.call(ctx, "delete_smtp_credential", move || {
            self.api.delete_smtp_credential(domain, login)
        })
        .await
    }

    // Templates

    /// Create a template.
    pub async fn create_template(
        &self,
        ctx: &Context,
        params: &TemplateParameters,
    ) -> ProviderResult<TemplateObservation> {
        self.call(ctx, "create_template", move || self.api.create_template(params)).await
    }

    /// Fetch a template.
    pub async fn get_template(
        &self,
        ctx: &Context,
        domain: &str,
        name: &str,
    ) -> ProviderResult<TemplateObservation> {
        self.call(ctx, "get_template", move || self.api.get_template(domain, name)).await
    }

    /// Update a template.
    pub async fn update_template(
        &self,
        ctx: &Context,
        params: &TemplateParameters,
    ) -> ProviderResult<()> {
        self.call(ctx, "update_template", move || self.api.update_template(params)).await
    }

    /// Delete a template.
    pub async fn delete_template(
        &self,
        ctx: &Context,
        domain: &str,
        name: &str,
    ) -> ProviderResult<()> {
        self.call(ctx, "delete_template", move || self.api.delete_template(domain, name)).await
    }

    // Bounces

    /// Create a bounce entry.
    pub async fn create_bounce(&self, ctx: &Context, params: &BounceParameters) -> ProviderResult<()> {
        self.call(ctx, "create_bounce", move || self.api.create_bounce(params)).await
    }

    /// Fetch a bounce entry.
    pub async fn get_bounce(
        &self,
        ctx: &Context,
        domain: &str,
        address: &str,
    ) -> ProviderResult<BounceObservation> {
        self.call(ctx, "get_bounce", move || self.api.get_bounce(domain, address)).await
    }

    /// Delete a bounce entry.
    pub async fn delete_bounce(
        &self,
        ctx: &Context,
        domain: &str,
        address: &str,
    ) -> ProviderResult<()> {
        self.call(ctx, "delete_bounce", move || self.api.delete_bounce(domain, address)).await
    }

    // Complaints

    /// Create a complaint entry.
    pub async fn create_complaint(
        &self,
        ctx: &Context,
        params: &ComplaintParameters,
    ) -> ProviderResult<()> {
        self.call(ctx, "create_complaint", move || self.api.create_complaint(params)).await
    }

    /// Fetch a complaint entry.
    pub async fn get_complaint(
        &self,
        ctx: &Context,
        domain: &str,
        address: &str,
    ) -> ProviderResult<ComplaintObservation> {
        self.call(ctx, "get_complaint", move || self.api.get_complaint(domain, address)).await
    }

    /// Delete a complaint entry.
    pub async fn delete_complaint(
        &self,
        ctx: &Context,
        domain: &str,
        address: &str,
    ) -> ProviderResult<()> {
        self.call(ctx, "delete_complaint", move || self.api.delete_complaint(domain, address)).await
    }

    // Unsubscribes

    /// Create an unsubscribe entry.
    pub async fn create_unsubscribe(
        &self,
        ctx: &Context,
        params: &UnsubscribeParameters,
    ) -> ProviderResult<()> {
        self.call(ctx, "create_unsubscribe", move || self.api.create_unsubscribe(params)).await
    }

    /// Fetch an unsubscribe entry.
    pub async fn get_unsubscribe(
        &self,
        ctx: &Context,
        domain: &str,
        address: &str,
    ) -> ProviderResult<UnsubscribeObservation> {
        self.call(ctx, "get_unsubscribe", move || self.api.get_unsubscribe(domain, address)).await
    }

    /// Delete an unsubscribe entry.
    pub async fn delete_unsubscribe(
        &self,
        ctx: &Context,
        domain: &str,
        address: &str,
    ) -> ProviderResult<()> {
        self.call(ctx, "delete_unsubscribe", move || self.api.delete_unsubscribe(domain, address))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use provider_mailgun_common::resilience::metrics as names;
    use provider_mailgun_common::testing::RecordingMetricsCollector;
    use provider_mailgun_common::{CircuitBreakerConfig, CircuitState};
    use provider_mailgun_domain::ApiError;

    use super::*;
    use crate::testing::InMemoryMailgun;

    fn client(api: Arc<InMemoryMailgun>, failure_threshold: u32) -> ResilientClient {
        let metrics = Arc::new(RecordingMetricsCollector::new());
        let breaker = CircuitBreaker::new(
            "mailgun",
            CircuitBreakerConfig::builder()
                .failure_threshold(failure_threshold)
                .build()
                .expect("config"),
            metrics.clone(),
        )
        .expect("breaker");
        let policy = RetryPolicy::api()
            .to_builder()
            .initial_backoff(Duration::from_millis(1))
            .max_backoff(Duration::from_millis(2))
            .build()
            .expect("policy");
        ResilientClient::new(api, RetryExecutor::new(policy.clone(), metrics), Arc::new(breaker))
            .with_policy(policy)
    }

    /// Validates that transient API failures are retried transparently.
    #[tokio::test]
    async fn test_retries_transient_failures() {
        let api = Arc::new(InMemoryMailgun::new());
        let client = client(api.clone(), 10);
        let ctx = Context::background();

        api.fail_next(2, ApiError::status("POST", "/v4/domains", 502, "Bad Gateway"));
        let created = client
            .create_domain(&ctx, &DomainParameters::new("mg.example.com"))
            .await
            .expect("created");

        assert_eq!(created.name, "mg.example.com");
        assert_eq!(api.calls("create_domain"), 3);
        assert_eq!(client.breaker().state(), CircuitState::Closed);
    }

    /// Validates that permanent failures surface after one attempt.
    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let api = Arc::new(InMemoryMailgun::new());
        let client = client(api.clone(), 10);

        let err = client.get_route(&Context::background(), "missing").await.expect_err("404");

        assert!(err.is_not_found());
        assert!(matches!(err, ProviderError::Api { .. }));
        assert_eq!(err.operation(), "get_route");
        assert_eq!(api.calls("get_route"), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempts() {
        let api = Arc::new(InMemoryMailgun::new());
        let client = client(api.clone(), 100);

        api.fail_next(10, ApiError::status("GET", "/v4/domains/x", 503, "Service Unavailable"));
        let err = client.get_domain(&Context::background(), "x").await.expect_err("exhausted");

        match err {
            ProviderError::Exhausted { attempts, ref source, .. } => {
                assert_eq!(attempts, 5);
                assert_eq!(source.status_code(), Some(503));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(api.calls("get_domain"), 5);
    }

    /// Validates that an open breaker stops calls from reaching the API.
    ///
    /// # Test Steps
    /// 1. Threshold 2; inject enough 503s to open the breaker
    /// 2. Verify the first call ends with the breaker open after 2 API calls
    /// 3. Verify a second call is rejected without touching the API
    #[tokio::test]
    async fn test_open_breaker_fails_fast() {
        let api = Arc::new(InMemoryMailgun::new());
        let client = client(api.clone(), 2);
        let ctx = Context::background();

        api.fail_next(10, ApiError::status("GET", "/v3/lists/a", 503, "Service Unavailable"));
        let first = client.get_mailing_list(&ctx, "a@mg.example.com").await.expect_err("open");
        assert!(first.is_circuit_open(), "{first}");
        assert_eq!(api.total_calls(), 2);

        let second = client.delete_route(&ctx, "r-1").await.expect_err("open");
        assert!(second.is_circuit_open());
        assert_eq!(api.total_calls(), 2);
        assert_eq!(client.breaker().state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let api = Arc::new(InMemoryMailgun::new());
        let client = client(api.clone(), 10);
        let ctx = Context::background();
        ctx.cancel();

        api.fail_next(1, ApiError::status("GET", "/", 429, "Too Many Requests"));
        let err = client.get_bounce(&ctx, "mg.example.com", "a@b.io").await.expect_err("cancel");

        assert!(err.is_cancelled());
        assert!(matches!(err, ProviderError::Cancelled { attempts: Some(1), .. }), "{err}");
        assert!(err.to_string().contains("cancelled during retry backoff after 1 attempts"), "{err}");
        assert_eq!(err.api_error().and_then(ApiError::status_code), Some(429));
    }

    #[tokio::test]
    async fn test_retry_metrics_use_operation_label() {
        let api = Arc::new(InMemoryMailgun::new());
        let metrics = Arc::new(RecordingMetricsCollector::new());
        let breaker = Arc::new(CircuitBreaker::with_defaults("mailgun").expect("breaker"));
        let client = ResilientClient::new(
            api,
            RetryExecutor::new(RetryPolicy::api(), metrics.clone()),
            breaker,
        );

        client
            .create_complaint(
                &Context::background(),
                &provider_mailgun_domain::ComplaintParameters {
                    domain: "mg.example.com".into(),
                    address: "a@b.io".into(),
                },
            )
            .await
            .expect("created");

        let total = metrics.counter_total(
            names::RETRY_OPERATIONS_TOTAL,
            &[("operation", "create_complaint"), ("outcome", "success")],
        );
        assert!((total - 1.0).abs() < 1e-9);
    }
}
