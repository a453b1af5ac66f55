//! Port interface for the Mailgun REST API
//!
//! Each method is one logical API call. Implementations may retry at the
//! transport level but never above it; operation-level retries belong to
//! [`super::ResilientClient`].

use async_trait::async_trait;
use provider_mailgun_domain::{
    ApiResult, BounceObservation, BounceParameters, ComplaintObservation, ComplaintParameters,
    DomainObservation, DomainParameters, MailingListObservation, MailingListParameters,
    RouteObservation, RouteParameters, SmtpCredentialObservation, SmtpCredentialParameters,
    TemplateObservation, TemplateParameters, UnsubscribeObservation, UnsubscribeParameters,
    WebhookKind, WebhookObservation, WebhookParameters,
};

/// Raw operations on the remote API.
#[async_trait]
pub trait MailgunApi: Send + Sync {
    // Domains
    async fn create_domain(&self, params: &DomainParameters) -> ApiResult<DomainObservation>;
    async fn get_domain(&self, name: &str) -> ApiResult<DomainObservation>;
    async fn update_domain(&self, name: &str, params: &DomainParameters) -> ApiResult<()>;
    async fn delete_domain(&self, name: &str) -> ApiResult<()>;

    // Routes
    async fn create_route(&self, params: &RouteParameters) -> ApiResult<RouteObservation>;
    async fn get_route(&self, id: &str) -> ApiResult<RouteObservation>;
    async fn update_route(&self, id: &str, params: &RouteParameters)
        -> ApiResult<RouteObservation>;
    async fn delete_route(&self, id: &str) -> ApiResult<()>;

    // Mailing lists
    async fn create_mailing_list(
        &self,
        params: &MailingListParameters,
    ) -> ApiResult<MailingListObservation>;
    async fn get_mailing_list(&self, address: &str) -> ApiResult<MailingListObservation>;
    async fn update_mailing_list(
        &self,
        address: &str,
        params: &MailingListParameters,
    ) -> ApiResult<MailingListObservation>;
    async fn delete_mailing_list(&self, address: &str) -> ApiResult<()>;

    // Webhooks
    async fn create_webhook(&self, params: &WebhookParameters) -> ApiResult<WebhookObservation>;
    async fn get_webhook(&self, domain: &str, kind: WebhookKind) -> ApiResult<WebhookObservation>;
    async fn update_webhook(&self, params: &WebhookParameters) -> ApiResult<WebhookObservation>;
    async fn delete_webhook(&self, domain: &str, kind: WebhookKind) -> ApiResult<()>;

    // SMTP credentials
    async fn create_smtp_credential(&self, params: &SmtpCredentialParameters) -> ApiResult<()>;
    async fn get_smtp_credential(
        &self,
        domain: &str,
        login: &str,
    ) -> ApiResult<SmtpCredentialObservation>;
    async fn update_smtp_credential_password(
        &self,
        params: &SmtpCredentialParameters,
    ) -> ApiResult<()>;
    async fn delete_smtp_credential(&self, domain: &str, login: &str) -> ApiResult<()>;

    // Templates
    async fn create_template(&self, params: &TemplateParameters)
        -> ApiResult<TemplateObservation>;
    async fn get_template(&self, domain: &str, name: &str) -> ApiResult<TemplateObservation>;
    async fn update_template(&self, params: &TemplateParameters) -> ApiResult<()>;
    async fn delete_template(&self, domain: &str, name: &str) -> ApiResult<()>;

    // Suppressions
    async fn create_bounce(&self, params: &BounceParameters) -> ApiResult<()>;
    async fn get_bounce(&self, domain: &str, address: &str) -> ApiResult<BounceObservation>;
    async fn delete_bounce(&self, domain: &str, address: &str) -> ApiResult<()>;

    async fn create_complaint(&self, params: &ComplaintParameters) -> ApiResult<()>;
    async fn get_complaint(&self, domain: &str, address: &str)
        -> ApiResult<ComplaintObservation>;
    async fn delete_complaint(&self, domain: &str, address: &str) -> ApiResult<()>;

    async fn create_unsubscribe(&self, params: &UnsubscribeParameters) -> ApiResult<()>;
    async fn get_unsubscribe(
        &self,
        domain: &str,
        address: &str,
    ) -> ApiResult<UnsubscribeObservation>;
    async fn delete_unsubscribe(&self, domain: &str, address: &str) -> ApiResult<()>;
}
