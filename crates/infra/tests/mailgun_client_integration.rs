//! Integration tests for the HTTP API client
//!
//! Runs the resilient client over the real transport against a wiremock
//! server, covering endpoint shapes and how the two retry layers stack.

use std::sync::Arc;
use std::time::Duration;

use provider_mailgun_common::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, Context, MetricsCollector,
    NoOpMetricsCollector, RetryExecutor, RetryPolicy,
};
use provider_mailgun_core::{
    ExternalResource, ProviderError, ResilientClient, RouteResource, UnsubscribeResource,
};
use provider_mailgun_domain::{
    DomainParameters, RouteParameters, SpamAction, UnsubscribeParameters,
};
use provider_mailgun_infra::{HttpClient, MailgunClient};
use serde_json::json;
use wiremock::matchers::{basic_auth, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Stack {
    client: ResilientClient,
    breaker: Arc<CircuitBreaker>,
}

fn stack(server: &MockServer, gateway_retries: u32, max_attempts: u32, threshold: u32) -> Stack {
    stack_at(server.uri(), gateway_retries, Duration::from_millis(1), max_attempts, threshold)
}

fn stack_at(
    base_url: String,
    gateway_retries: u32,
    gateway_backoff: Duration,
    max_attempts: u32,
    threshold: u32,
) -> Stack {
    let http = HttpClient::builder()
        .base_url(base_url)
        .credentials("api", "key-test")
        .gateway_retries(gateway_retries)
        .gateway_backoff(gateway_backoff)
        .build()
        .expect("http client");
    let metrics: Arc<dyn MetricsCollector> = Arc::new(NoOpMetricsCollector);
    let breaker = Arc::new(
        CircuitBreaker::new(
            "mailgun",
            CircuitBreakerConfig::builder()
                .failure_threshold(threshold)
                .build()
                .expect("breaker config"),
            Arc::clone(&metrics),
        )
        .expect("breaker"),
    );
    let policy = RetryPolicy::api()
        .to_builder()
        .max_attempts(max_attempts)
        .initial_backoff(Duration::from_millis(1))
        .max_backoff(Duration::from_millis(2))
        .jitter_fraction(0.0)
        .build()
        .expect("policy");
    let client = ResilientClient::new(
        Arc::new(MailgunClient::new(http)),
        RetryExecutor::new(policy.clone(), metrics),
        Arc::clone(&breaker),
    )
    .with_policy(policy);
    Stack { client, breaker }
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map(|requests| requests.len()).unwrap_or_default()
}

/// Validates the domain create request and the envelope decoding.
///
/// # Test Steps
/// 1. Expect an authenticated form POST to /v4/domains
/// 2. Respond with the domain plus DNS records beside it
/// 3. Verify the observation carries the records
#[tokio::test]
async fn test_create_domain_posts_form_and_merges_dns_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/domains"))
        .and(basic_auth("api", "key-test"))
        .and(body_string_contains("name=mg.example.com"))
        .and(body_string_contains("spam_action=tag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Domain DNS records have been created",
            "domain": {"name": "mg.example.com", "state": "unverified", "spam_action": "tag"},
            "receiving_dns_records": [{"record_type": "MX", "value": "mxa.mailgun.org", "priority": "10"}],
            "sending_dns_records": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let Stack { client, .. } = stack(&server, 0, 3, 5);
    let mut params = DomainParameters::new("mg.example.com");
    params.spam_action = Some(SpamAction::Tag);

    let observed = client.create_domain(&Context::background(), &params).await.expect("created");
    assert_eq!(observed.name, "mg.example.com");
    assert_eq!(observed.spam_action, Some(SpamAction::Tag));
    assert_eq!(observed.receiving_dns_records.len(), 1);
    assert!(observed.sending_dns_records.is_empty());
}

/// Validates the credential lookup, which filters the listing.
#[tokio::test]
async fn test_smtp_credential_lookup_filters_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/domains/mg.example.com/credentials"))
        .and(query_param("limit", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 2,
            "items": [
                {"login": "alice@mg.example.com", "mailbox": "alice@mg.example.com"},
                {"login": "bob@mg.example.com"}
            ]
        })))
        .mount(&server)
        .await;

    let Stack { client, .. } = stack(&server, 0, 3, 5);
    let ctx = Context::background();

    let found = client.get_smtp_credential(&ctx, "mg.example.com", "BOB").await.expect("found");
    assert_eq!(found.login, "bob@mg.example.com");

    let err = client.get_smtp_credential(&ctx, "mg.example.com", "carol").await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

/// Validates that a 503 is retried by the operation-level executor.
///
/// # Test Steps
/// 1. First two GETs answer 503, later ones 200
/// 2. Transport gateway retries disabled
/// 3. Verify success after exactly three requests
#[tokio::test]
async fn test_service_unavailable_retried_by_executor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/routes/abc123"))
        .respond_with(ResponseTemplate::new(503).set_body_string("service unavailable"))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/routes/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "route": {"id": "abc123", "priority": 1, "expression": "match_recipient('.*')", "actions": ["stop()"]}
        })))
        .mount(&server)
        .await;

    let Stack { client, .. } = stack(&server, 0, 5, 10);
    let route = client.get_route(&Context::background(), "abc123").await.expect("recovers");

    assert_eq!(route.id, "abc123");
    assert_eq!(request_count(&server).await, 3);
}

/// Validates that the two retry layers multiply.
///
/// # Test Steps
/// 1. Every request answers 502
/// 2. One gateway retry per attempt, two operation attempts
/// 3. Verify four requests were made and attempts were exhausted
#[tokio::test]
async fn test_bad_gateway_retries_multiply_across_layers() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v3/routes/abc123"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({"message": "Bad Gateway"})))
        .mount(&server)
        .await;

    let Stack { client, .. } = stack(&server, 1, 2, 10);
    let err = client.delete_route(&Context::background(), "abc123").await.unwrap_err();

    assert!(matches!(err, ProviderError::Exhausted { attempts: 2, .. }), "{err}");
    assert!(err.to_string().contains("failed after 2 attempts"), "{err}");
    assert_eq!(request_count(&server).await, 4);
}

/// Validates that a refused connection is retried as transient.
///
/// # Test Steps
/// 1. Point the client at a port nobody listens on
/// 2. Five operation attempts, breaker threshold above that
/// 3. Verify every attempt ran and the run ended exhausted
#[tokio::test]
async fn test_connection_refused_is_retried_until_exhausted() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let base_url = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);

    let Stack { client, breaker } = stack_at(base_url, 2, Duration::from_millis(1), 5, 10);
    let err = client.get_domain(&Context::background(), "mg.example.com").await.unwrap_err();

    match err {
        ProviderError::Exhausted { attempts, ref source, .. } => {
            assert_eq!(attempts, 5);
            assert!(source.to_string().to_lowercase().contains("connection refused"), "{source}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(breaker.state(), CircuitState::Closed);
}

/// Validates that the caller's deadline cuts the transport's 502 loop short.
///
/// # Test Steps
/// 1. Every request answers 502; ten gateway retries 500ms apart
/// 2. Call with a 200ms deadline
/// 3. Verify a cancellation well before the first gateway sleep ends, with
///    no failure recorded by the breaker
#[tokio::test]
async fn test_deadline_interrupts_gateway_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({"message": "Bad Gateway"})))
        .mount(&server)
        .await;

    let Stack { client, breaker } = stack_at(server.uri(), 10, Duration::from_millis(500), 5, 1);
    let ctx = Context::background().with_timeout(Duration::from_millis(200));

    let started = std::time::Instant::now();
    let err = client.get_route(&ctx, "r1").await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
    assert!(
        matches!(err, ProviderError::Cancelled { attempts: None, last_error: None, .. }),
        "{err}"
    );
    assert!(err.to_string().contains("context deadline exceeded"), "{err}");
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.snapshot().await.consecutive_failures, 0);
    assert_eq!(request_count(&server).await, 1);
}

/// Validates that a permanent error is surfaced on first occurrence.
#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/domains/missing.example.com"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Domain not found"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let Stack { client, .. } = stack(&server, 2, 5, 5);
    let err = client.get_domain(&Context::background(), "missing.example.com").await.unwrap_err();

    assert!(matches!(err, ProviderError::Api { .. }), "{err}");
    assert!(err.is_not_found());
    assert_eq!(err.operation(), "get_domain");
}

/// Validates that repeated failures open the breaker and later calls fail
/// without reaching the server.
#[tokio::test]
async fn test_breaker_opens_and_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let Stack { client, breaker } = stack(&server, 0, 5, 2);
    let ctx = Context::background();

    let first = client.get_route(&ctx, "r1").await.unwrap_err();
    assert!(first.is_circuit_open(), "{first}");
    assert_eq!(breaker.state(), CircuitState::Open);
    assert_eq!(request_count(&server).await, 2);

    let second = client.get_route(&ctx, "r2").await.unwrap_err();
    assert!(second.is_circuit_open(), "{second}");
    assert_eq!(request_count(&server).await, 2);
}

/// Validates the route lifecycle over HTTP: create returns the assigned id
/// and observe compares the mutable fields.
#[tokio::test]
async fn test_route_lifecycle_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/routes"))
        .and(body_string_contains("action=forward"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Route has been created",
            "route": {"id": "5f0a1b", "priority": 5, "description": "inbound",
                      "expression": "match_recipient('.*@mg.example.com')",
                      "actions": ["forward('https://example.com/inbound')"]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/routes/5f0a1b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "route": {"id": "5f0a1b", "priority": 5, "description": "inbound",
                      "expression": "match_recipient('.*@mg.example.com')",
                      "actions": ["forward('https://example.com/inbound')"]}
        })))
        .mount(&server)
        .await;

    let Stack { client, .. } = stack(&server, 0, 3, 5);
    let routes = RouteResource::new(client);
    let ctx = Context::background();
    let mut desired = RouteParameters {
        priority: 5,
        description: "inbound".into(),
        expression: "match_recipient('.*@mg.example.com')".into(),
        actions: vec!["forward('https://example.com/inbound')".into()],
    };

    let id = routes.create(&ctx, &desired).await.expect("created");
    assert_eq!(id, "5f0a1b");

    let observation = routes.observe(&ctx, &id, &desired).await.expect("observed");
    assert!(observation.exists && observation.up_to_date);

    desired.priority = 1;
    let observation = routes.observe(&ctx, &id, &desired).await.expect("observed");
    assert!(observation.exists && !observation.up_to_date);
}

/// Validates that deleting an unsubscribe that is already gone succeeds.
#[tokio::test]
async fn test_delete_missing_unsubscribe_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v3/mg.example.com/unsubscribes/gone%40example.com"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Address not found"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let Stack { client, .. } = stack(&server, 0, 3, 5);
    let unsubscribes = UnsubscribeResource::new(client);
    let params = UnsubscribeParameters {
        domain: "mg.example.com".into(),
        address: "gone@example.com".into(),
        tags: Vec::new(),
    };

    unsubscribes
        .delete(&Context::background(), "gone@example.com", &params)
        .await
        .expect("absent is deleted");
}
