use async_trait::async_trait;
use provider_mailgun_common::Context;
use provider_mailgun_domain::{ResourceKind, TemplateObservation, TemplateParameters};

use super::{check, found, gone, ExternalResource, Observation};
use crate::client::ResilientClient;
use crate::errors::ProviderResult;

/// Templates, named by template name within the desired domain.
#[derive(Debug, Clone)]
pub struct TemplateResource {
    client: ResilientClient,
}

impl TemplateResource {
    /// Lifecycle over the resilient client.
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }
}

/// Only the description can be updated in place.
fn is_up_to_date(desired: &TemplateParameters, observed: &TemplateObservation) -> bool {
    desired.description.as_ref().map_or(true, |d| *d == observed.description)
}

#[async_trait]
impl ExternalResource for TemplateResource {
    type Parameters = TemplateParameters;
    type Observed = TemplateObservation;

    const KIND: ResourceKind = ResourceKind::Template;

    async fn observe(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &TemplateParameters,
    ) -> ProviderResult<Observation<TemplateObservation>> {
        if external_name.is_empty() {
            return Ok(Observation::absent());
        }
        Ok(match found(self.client.get_template(ctx, &desired.domain, external_name).await)? {
            Some(observed) => {
                let up_to_date = is_up_to_date(desired, &observed);
                Observation::present(observed, up_to_date)
            }
            None => Observation::absent(),
        })
    }

    async fn create(&self, ctx: &Context, desired: &TemplateParameters) -> ProviderResult<String> {
        check("create_template", desired.validate())?;
        Ok(self.client.create_template(ctx, desired).await?.name)
    }

    async fn update(
        &self,
        ctx: &Context,
        _external_name: &str,
        desired: &TemplateParameters,
    ) -> ProviderResult<()> {
        self.client.update_template(ctx, desired).await
    }

    async fn delete(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &TemplateParameters,
    ) -> ProviderResult<()> {
        let result = self.client.delete_template(ctx, &desired.domain, external_name).await;
        gone(Self::KIND, external_name, result)
    }
}
