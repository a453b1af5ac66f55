use async_trait::async_trait;
use provider_mailgun_common::Context;
use provider_mailgun_domain::{DomainObservation, DomainParameters, ResourceKind};
use tracing::info;

use super::{check, found, gone, ExternalResource, Observation};
use crate::client::ResilientClient;
use crate::errors::ProviderResult;

/// Sending domains, named by domain name.
#[derive(Debug, Clone)]
pub struct DomainResource {
    client: ResilientClient,
}

impl DomainResource {
    /// Lifecycle over the resilient client.
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }
}

/// Unset optional fields leave the remote value alone.
fn is_up_to_date(desired: &DomainParameters, observed: &DomainObservation) -> bool {
    desired.spam_action.map_or(true, |v| Some(v) == observed.spam_action)
        && desired.wildcard.map_or(true, |v| v == observed.wildcard)
        && desired.web_scheme.map_or(true, |v| Some(v) == observed.web_scheme)
}

#[async_trait]
impl ExternalResource for DomainResource {
    type Parameters = DomainParameters;
    type Observed = DomainObservation;

    const KIND: ResourceKind = ResourceKind::Domain;

    async fn observe(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &DomainParameters,
    ) -> ProviderResult<Observation<DomainObservation>> {
        if external_name.is_empty() {
            return Ok(Observation::absent());
        }
        Ok(match found(self.client.get_domain(ctx, external_name).await)? {
            Some(observed) => {
                let up_to_date = is_up_to_date(desired, &observed);
                Observation::present(observed, up_to_date)
            }
            None => Observation::absent(),
        })
    }

    async fn create(&self, ctx: &Context, desired: &DomainParameters) -> ProviderResult<String> {
        check("create_domain", desired.validate())?;
        let created = self.client.create_domain(ctx, desired).await?;
        info!(domain = %created.name, state = %created.state, "created domain");
        Ok(created.name)
    }

    async fn update(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &DomainParameters,
    ) -> ProviderResult<()> {
        self.client.update_domain(ctx, external_name, desired).await
    }

    async fn delete(
        &self,
        ctx: &Context,
        external_name: &str,
        _desired: &DomainParameters,
    ) -> ProviderResult<()> {
        gone(Self::KIND, external_name, self.client.delete_domain(ctx, external_name).await)
    }
}
