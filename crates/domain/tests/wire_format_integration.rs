//! Integration tests for the wire formats of the resource types
//!
//! Covers decoding realistic API payloads and the JSON shape the CLI prints
//! for observations.

use provider_mailgun_common::ErrorClassification;
use provider_mailgun_domain::{
    ApiError, DomainEnvelope, DomainParameters, MailingListParameters, ResourceKind,
    RouteEnvelope, SmtpCredentialParameters, SpamAction, UnsubscribeObservation,
    WebhookKind, WebhookParameters,
};
use serde_json::json;

/// Validates decoding of a full domain response and re-encoding it.
///
/// # Test Steps
/// 1. Decode a v4 domain response with DNS records
/// 2. Serialize the observation back to JSON
/// 3. Verify `type` keeps its wire name and records are nested
#[test]
fn test_domain_observation_round_trip_shape() {
    let body = json!({
        "domain": {
            "created_at": "Wed, 10 Jul 2024 11:02:01 GMT",
            "id": "668e6a6974d75e1e1d0a2e8f",
            "is_disabled": false,
            "name": "mg.example.com",
            "require_tls": false,
            "smtp_login": "postmaster@mg.example.com",
            "spam_action": "block",
            "state": "active",
            "type": "custom",
            "web_scheme": "https",
            "wildcard": true
        },
        "receiving_dns_records": [
            {"cached": [], "priority": "10", "record_type": "MX", "valid": "valid", "value": "mxa.mailgun.org"}
        ],
        "sending_dns_records": [
            {"cached": [], "name": "mg.example.com", "record_type": "TXT", "valid": "valid",
             "value": "v=spf1 include:mailgun.org ~all"}
        ]
    });

    let observed = serde_json::from_value::<DomainEnvelope>(body)
        .expect("decode")
        .into_observation();
    assert_eq!(observed.spam_action, Some(SpamAction::Block));
    assert!(observed.wildcard);

    let printed = serde_json::to_value(&observed).expect("encode");
    assert_eq!(printed["type"], "custom");
    assert_eq!(printed["sending_dns_records"][0]["record_type"], "TXT");
    assert_eq!(printed["receiving_dns_records"][0]["priority"], "10");
}

/// Validates that parameter types load from JSON documents with defaults.
#[test]
fn test_parameters_from_json() {
    let domain: DomainParameters =
        serde_json::from_value(json!({"name": "mg.example.com", "spam_action": "tag"}))
            .expect("domain");
    assert_eq!(domain.spam_action, Some(SpamAction::Tag));
    assert!(domain.ips.is_empty());

    let webhook: WebhookParameters = serde_json::from_value(json!({
        "domain": "mg.example.com",
        "kind": "temporary_fail",
        "urls": ["https://hooks.example.com/mailgun"]
    }))
    .expect("webhook");
    assert_eq!(webhook.kind, WebhookKind::TemporaryFail);
    assert!(webhook.validate().is_ok());

    let list: MailingListParameters =
        serde_json::from_value(json!({"address": "ops@mg.example.com"})).expect("list");
    assert_eq!(list.form().len(), 1);
}

/// Validates that secrets never leave through serialization.
#[test]
fn test_secrets_are_not_serialized() {
    let params = SmtpCredentialParameters {
        domain: "mg.example.com".into(),
        login: "alice".into(),
        password: "s3cret-pass".into(),
    };
    let encoded = serde_json::to_string(&params).expect("encode");
    assert!(!encoded.contains("s3cret-pass"));

    let domain = DomainParameters {
        smtp_password: Some("another-secret".into()),
        ..DomainParameters::new("mg.example.com")
    };
    assert!(!serde_json::to_string(&domain).expect("encode").contains("another-secret"));
}

#[test]
fn test_route_update_response_decodes_at_top_level() {
    let created: RouteEnvelope = serde_json::from_value(json!({
        "message": "Route has been created",
        "route": {"id": "r-1", "priority": 2, "expression": "match_recipient(\".*@mg.example.com\")",
                  "actions": ["forward(\"http://example.com/messages\")"]}
    }))
    .expect("create response");
    assert_eq!(created.route.priority, 2);

    let updated: provider_mailgun_domain::RouteObservation = serde_json::from_value(json!({
        "message": "Route has been updated",
        "id": "r-1", "priority": 3, "expression": "catch_all()", "actions": null
    }))
    .expect("update response");
    assert_eq!(updated.id, "r-1");
    assert!(updated.actions.is_empty());
}

#[test]
fn test_unsubscribe_tags_null() {
    let observed: UnsubscribeObservation =
        serde_json::from_value(json!({"address": "a@b.io", "tags": null})).expect("decode");
    assert!(observed.tags.is_empty());
}

/// Validates that every resource kind parses from its CLI spelling.
#[test]
fn test_resource_kind_cli_spelling() {
    for kind in ResourceKind::ALL {
        assert_eq!(kind.to_string().parse::<ResourceKind>(), Ok(kind));
    }
    assert!("queue".parse::<ResourceKind>().is_err());
}

#[test]
fn test_status_error_classification_from_text() {
    let err = ApiError::status("PUT", "/v3/routes/503abc", 400, "bad expression");
    assert!(!err.is_retryable());
    assert!(!err.to_string().contains("503"));
}
