use std::collections::BTreeSet;

use async_trait::async_trait;
use provider_mailgun_common::Context;
use provider_mailgun_domain::{ResourceKind, WebhookObservation, WebhookParameters};

use super::{check, found, gone, ExternalResource, Observation};
use crate::client::ResilientClient;
use crate::errors::ProviderResult;

/// Domain webhooks, named by event kind within the desired domain.
#[derive(Debug, Clone)]
pub struct WebhookResource {
    client: ResilientClient,
}

impl WebhookResource {
    /// Lifecycle over the resilient client.
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }
}

/// URL order is not significant.
fn is_up_to_date(desired: &WebhookParameters, observed: &WebhookObservation) -> bool {
    let want: BTreeSet<&str> = desired.urls.iter().map(String::as_str).collect();
    let have: BTreeSet<&str> = observed.urls.iter().map(String::as_str).collect();
    want == have
}

#[async_trait]
impl ExternalResource for WebhookResource {
    type Parameters = WebhookParameters;
    type Observed = WebhookObservation;

    const KIND: ResourceKind = ResourceKind::Webhook;

    async fn observe(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &WebhookParameters,
    ) -> ProviderResult<Observation<WebhookObservation>> {
        if external_name.is_empty() {
            return Ok(Observation::absent());
        }
        Ok(match found(self.client.get_webhook(ctx, &desired.domain, desired.kind).await)? {
            Some(observed) => {
                let up_to_date = is_up_to_date(desired, &observed);
                Observation::present(observed, up_to_date)
            }
            None => Observation::absent(),
        })
    }

    async fn create(&self, ctx: &Context, desired: &WebhookParameters) -> ProviderResult<String> {
        check("create_webhook", desired.validate())?;
        Ok(self.client.create_webhook(ctx, desired).await?.kind.to_string())
    }

    async fn update(
        &self,
        ctx: &Context,
        _external_name: &str,
        desired: &WebhookParameters,
    ) -> ProviderResult<()> {
        check("update_webhook", desired.validate())?;
        self.client.update_webhook(ctx, desired).await.map(|_| ())
    }

    async fn delete(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &WebhookParameters,
    ) -> ProviderResult<()> {
        let result = self.client.delete_webhook(ctx, &desired.domain, desired.kind).await;
        gone(Self::KIND, external_name, result)
    }
}

#[cfg(test)]
mod tests {
    use provider_mailgun_domain::WebhookKind;

    use super::*;

    #[test]
    fn test_url_order_is_ignored() {
        let desired = WebhookParameters {
            domain: "mg.example.com".into(),
            kind: WebhookKind::Delivered,
            urls: vec!["https://a".into(), "https://b".into()],
        };
        let observed = WebhookObservation {
            domain: "mg.example.com".into(),
            kind: WebhookKind::Delivered,
            urls: vec!["https://b".into(), "https://a".into()],
        };
        assert!(is_up_to_date(&desired, &observed));
    }
}
