//! [`MailgunApi`] over HTTP.
//!
//! One method per endpoint; path segments taken from user input are
//! percent-encoded. Operation-level retries and circuit breaking are added
//! above this layer by [`provider_mailgun_core::ResilientClient`].

use async_trait::async_trait;
use provider_mailgun_core::MailgunApi;
use provider_mailgun_domain::{
    ApiError, ApiResult, BounceObservation, BounceParameters, ComplaintObservation,
    ComplaintParameters, DomainEnvelope, DomainObservation, DomainParameters,
    MailingListEnvelope, MailingListObservation, MailingListParameters, RouteEnvelope,
    RouteObservation, RouteParameters, SmtpCredentialList, SmtpCredentialObservation,
    SmtpCredentialParameters, TemplateEnvelope, TemplateObservation, TemplateParameters,
    UnsubscribeObservation, UnsubscribeParameters, WebhookEnvelope, WebhookKind,
    WebhookObservation, WebhookParameters,
};
use reqwest::Method;
use urlencoding::encode;

use crate::http::HttpClient;

/// Page size used when listing SMTP credentials.
const CREDENTIAL_PAGE_LIMIT: &str = "1000";

/// HTTP implementation of the API port.
#[derive(Debug, Clone)]
pub struct MailgunClient {
    http: HttpClient,
}

impl MailgunClient {
    /// Client over an authenticated transport.
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.http.send(Method::GET, path, &[], None).await
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&'static str, String)],
    ) -> ApiResult<T> {
        self.http.send(Method::POST, path, &[], Some(form)).await
    }

    async fn put<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&'static str, String)],
    ) -> ApiResult<T> {
        self.http.send(Method::PUT, path, &[], Some(form)).await
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        self.http.send_unit(Method::DELETE, path, None).await
    }
}

fn domain_path(name: &str) -> String {
    format!("/v4/domains/{}", encode(name))
}

fn route_path(id: &str) -> String {
    format!("/v3/routes/{}", encode(id))
}

fn list_path(address: &str) -> String {
    format!("/v3/lists/{}", encode(address))
}

fn webhooks_path(domain: &str) -> String {
    format!("/v3/domains/{}/webhooks", encode(domain))
}

fn credentials_path(domain: &str) -> String {
    format!("/v3/domains/{}/credentials", encode(domain))
}

fn templates_path(domain: &str) -> String {
    format!("/v3/{}/templates", encode(domain))
}

fn suppression_path(domain: &str, list: &str) -> String {
    format!("/v3/{}/{list}", encode(domain))
}

#[async_trait]
impl MailgunApi for MailgunClient {
    async fn create_domain(&self, params: &DomainParameters) -> ApiResult<DomainObservation> {
        let envelope: DomainEnvelope = self.post("/v4/domains", &params.create_form()).await?;
        Ok(envelope.into_observation())
    }

    async fn get_domain(&self, name: &str) -> ApiResult<DomainObservation> {
        let envelope: DomainEnvelope = self.get(&domain_path(name)).await?;
        Ok(envelope.into_observation())
    }

    async fn update_domain(&self, name: &str, params: &DomainParameters) -> ApiResult<()> {
        self.http
            .send_unit(Method::PUT, &domain_path(name), Some(params.update_form().as_slice()))
            .await
    }

    /// Deletion is only exposed on the v3 endpoint.
    async fn delete_domain(&self, name: &str) -> ApiResult<()> {
        self.delete(&format!("/v3/domains/{}", encode(name))).await
    }

    async fn create_route(&self, params: &RouteParameters) -> ApiResult<RouteObservation> {
        let envelope: RouteEnvelope = self.post("/v3/routes", &params.form()).await?;
        Ok(envelope.route)
    }

    async fn get_route(&self, id: &str) -> ApiResult<RouteObservation> {
        let envelope: RouteEnvelope = self.get(&route_path(id)).await?;
        Ok(envelope.route)
    }

    /// The update response carries the route at the top level.
    async fn update_route(&self, id: &str, params: &RouteParameters) -> ApiResult<RouteObservation> {
        self.put(&route_path(id), &params.form()).await
    }

    async fn delete_route(&self, id: &str) -> ApiResult<()> {
        self.delete(&route_path(id)).await
    }

    async fn create_mailing_list(
        &self,
        params: &MailingListParameters,
    ) -> ApiResult<MailingListObservation> {
        let envelope: MailingListEnvelope = self.post("/v3/lists", &params.form()).await?;
        Ok(envelope.list)
    }

    async fn get_mailing_list(&self, address: &str) -> ApiResult<MailingListObservation> {
        let envelope: MailingListEnvelope = self.get(&list_path(address)).await?;
        Ok(envelope.list)
    }

    async fn update_mailing_list(
        &self,
        address: &str,
        params: &MailingListParameters,
    ) -> ApiResult<MailingListObservation> {
        let envelope: MailingListEnvelope = self.put(&list_path(address), &params.form()).await?;
        Ok(envelope.list)
    }

    async fn delete_mailing_list(&self, address: &str) -> ApiResult<()> {
        self.delete(&list_path(address)).await
    }

    async fn create_webhook(&self, params: &WebhookParameters) -> ApiResult<WebhookObservation> {
        let envelope: WebhookEnvelope =
            self.post(&webhooks_path(&params.domain), &params.create_form()).await?;
        Ok(envelope.into_observation(&params.domain, params.kind))
    }

    async fn get_webhook(&self, domain: &str, kind: WebhookKind) -> ApiResult<WebhookObservation> {
        let path = format!("{}/{kind}", webhooks_path(domain));
        let envelope: WebhookEnvelope = self.get(&path).await?;
        Ok(envelope.into_observation(domain, kind))
    }

    async fn update_webhook(&self, params: &WebhookParameters) -> ApiResult<WebhookObservation> {
        let path = format!("{}/{}", webhooks_path(&params.domain), params.kind);
        let envelope: WebhookEnvelope = self.put(&path, &params.update_form()).await?;
        Ok(envelope.into_observation(&params.domain, params.kind))
    }

    async fn delete_webhook(&self, domain: &str, kind: WebhookKind) -> ApiResult<()> {
        self.delete(&format!("{}/{kind}", webhooks_path(domain))).await
    }

    async fn create_smtp_credential(&self, params: &SmtpCredentialParameters) -> ApiResult<()> {
        let path = credentials_path(&params.domain);
        self.http.send_unit(Method::POST, &path, Some(params.create_form().as_slice())).await
    }

    /// There is no single-credential endpoint; the listing is filtered.
    async fn get_smtp_credential(
        &self,
        domain: &str,
        login: &str,
    ) -> ApiResult<SmtpCredentialObservation> {
        let path = credentials_path(domain);
        let list: SmtpCredentialList =
            self.http.send(Method::GET, &path, &[("limit", CREDENTIAL_PAGE_LIMIT)], None).await?;
        list.find(domain, login)
            .ok_or_else(|| ApiError::status("GET", path, 404, "credential not found"))
    }

    async fn update_smtp_credential_password(
        &self,
        params: &SmtpCredentialParameters,
    ) -> ApiResult<()> {
        let path = format!("{}/{}", credentials_path(&params.domain), encode(&params.login));
        self.http.send_unit(Method::PUT, &path, Some(params.password_form().as_slice())).await
    }

    async fn delete_smtp_credential(&self, domain: &str, login: &str) -> ApiResult<()> {
        self.delete(&format!("{}/{}", credentials_path(domain), encode(login))).await
    }

    async fn create_template(&self, params: &TemplateParameters) -> ApiResult<TemplateObservation> {
        let envelope: TemplateEnvelope =
            self.post(&templates_path(&params.domain), &params.create_form()).await?;
        Ok(envelope.template)
    }

    /// Includes the active version.
    async fn get_template(&self, domain: &str, name: &str) -> ApiResult<TemplateObservation> {
        let path = format!("{}/{}", templates_path(domain), encode(name));
        let envelope: TemplateEnvelope =
            self.http.send(Method::GET, &path, &[("active", "yes")], None).await?;
        Ok(envelope.template)
    }

    async fn update_template(&self, params: &TemplateParameters) -> ApiResult<()> {
        let path = format!("{}/{}", templates_path(&params.domain), encode(&params.name));
        self.http.send_unit(Method::PUT, &path, Some(params.update_form().as_slice())).await
    }

    async fn delete_template(&self, domain: &str, name: &str) -> ApiResult<()> {
        self.delete(&format!("{}/{}", templates_path(domain), encode(name))).await
    }

    async fn create_bounce(&self, params: &BounceParameters) -> ApiResult<()> {
        let path = suppression_path(&params.domain, "bounces");
        self.http.send_unit(Method::POST, &path, Some(params.form().as_slice())).await
    }

    async fn get_bounce(&self, domain: &str, address: &str) -> ApiResult<BounceObservation> {
        self.get(&format!("{}/{}", suppression_path(domain, "bounces"), encode(address))).await
    }

    async fn delete_bounce(&self, domain: &str, address: &str) -> ApiResult<()> {
        self.delete(&format!("{}/{}", suppression_path(domain, "bounces"), encode(address))).await
    }

    async fn create_complaint(&self, params: &ComplaintParameters) -> ApiResult<()> {
        let path = suppression_path(&params.domain, "complaints");
        self.http.send_unit(Method::POST, &path, Some(params.form().as_slice())).await
    }

    async fn get_complaint(&self, domain: &str, address: &str) -> ApiResult<ComplaintObservation> {
        self.get(&format!("{}/{}", suppression_path(domain, "complaints"), encode(address))).await
    }

    async fn delete_complaint(&self, domain: &str, address: &str) -> ApiResult<()> {
        self.delete(&format!("{}/{}", suppression_path(domain, "complaints"), encode(address)))
            .await
    }

    async fn create_unsubscribe(&self, params: &UnsubscribeParameters) -> ApiResult<()> {
        let path = suppression_path(&params.domain, "unsubscribes");
        self.http.send_unit(Method::POST, &path, Some(params.form().as_slice())).await
    }

    async fn get_unsubscribe(
        &self,
        domain: &str,
        address: &str,
    ) -> ApiResult<UnsubscribeObservation> {
        self.get(&format!("{}/{}", suppression_path(domain, "unsubscribes"), encode(address))).await
    }

    async fn delete_unsubscribe(&self, domain: &str, address: &str) -> ApiResult<()> {
        self.delete(&format!("{}/{}", suppression_path(domain, "unsubscribes"), encode(address)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_encode_user_segments() {
        assert_eq!(list_path("dev@mg.example.com"), "/v3/lists/dev%40mg.example.com");
        assert_eq!(route_path("a/b"), "/v3/routes/a%2Fb");
        assert_eq!(suppression_path("mg.example.com", "bounces"), "/v3/mg.example.com/bounces");
        assert_eq!(
            format!("{}/{}", webhooks_path("mg.example.com"), WebhookKind::PermanentFail),
            "/v3/domains/mg.example.com/webhooks/permanent_fail"
        );
    }
}
