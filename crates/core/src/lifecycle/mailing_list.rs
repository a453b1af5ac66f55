use async_trait::async_trait;
use provider_mailgun_common::Context;
use provider_mailgun_domain::{MailingListObservation, MailingListParameters, ResourceKind};

use super::{check, found, gone, ExternalResource, Observation};
use crate::client::ResilientClient;
use crate::errors::ProviderResult;

/// Mailing lists, named by list address.
#[derive(Debug, Clone)]
pub struct MailingListResource {
    client: ResilientClient,
}

impl MailingListResource {
    /// Lifecycle over the resilient client.
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }
}

fn is_up_to_date(desired: &MailingListParameters, observed: &MailingListObservation) -> bool {
    desired.address.eq_ignore_ascii_case(&observed.address)
        && desired.name.as_ref().map_or(true, |v| *v == observed.name)
        && desired.description.as_ref().map_or(true, |v| *v == observed.description)
        && desired.access_level.map_or(true, |v| Some(v) == observed.access_level)
        && desired.reply_preference.map_or(true, |v| Some(v) == observed.reply_preference)
}

#[async_trait]
impl ExternalResource for MailingListResource {
    type Parameters = MailingListParameters;
    type Observed = MailingListObservation;

    const KIND: ResourceKind = ResourceKind::MailingList;

    async fn observe(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &MailingListParameters,
    ) -> ProviderResult<Observation<MailingListObservation>> {
        if external_name.is_empty() {
            return Ok(Observation::absent());
        }
        Ok(match found(self.client.get_mailing_list(ctx, external_name).await)? {
            Some(observed) => {
                let up_to_date = is_up_to_date(desired, &observed);
                Observation::present(observed, up_to_date)
            }
            None => Observation::absent(),
        })
    }

    async fn create(
        &self,
        ctx: &Context,
        desired: &MailingListParameters,
    ) -> ProviderResult<String> {
        check("create_mailing_list", desired.validate())?;
        Ok(self.client.create_mailing_list(ctx, desired).await?.address)
    }

    /// The address can change; the list is updated under its old one.
    async fn update(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &MailingListParameters,
    ) -> ProviderResult<()> {
        check("update_mailing_list", desired.validate())?;
        self.client.update_mailing_list(ctx, external_name, desired).await.map(|_| ())
    }

    async fn delete(
        &self,
        ctx: &Context,
        external_name: &str,
        _desired: &MailingListParameters,
    ) -> ProviderResult<()> {
        gone(Self::KIND, external_name, self.client.delete_mailing_list(ctx, external_name).await)
    }
}
