use async_trait::async_trait;
use provider_mailgun_common::Context;
use provider_mailgun_domain::{ResourceKind, SmtpCredentialObservation, SmtpCredentialParameters};

use super::{check, found, gone, ExternalResource, Observation};
use crate::client::ResilientClient;
use crate::errors::ProviderResult;

/// SMTP credentials, named by login within the desired domain.
///
/// The API never returns passwords, so an existing credential always
/// observes as up to date; password rotation is an explicit update.
#[derive(Debug, Clone)]
pub struct SmtpCredentialResource {
    client: ResilientClient,
}

impl SmtpCredentialResource {
    /// Lifecycle over the resilient client.
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExternalResource for SmtpCredentialResource {
    type Parameters = SmtpCredentialParameters;
    type Observed = SmtpCredentialObservation;

    const KIND: ResourceKind = ResourceKind::SmtpCredential;

    async fn observe(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &SmtpCredentialParameters,
    ) -> ProviderResult<Observation<SmtpCredentialObservation>> {
        if external_name.is_empty() {
            return Ok(Observation::absent());
        }
        let result = self.client.get_smtp_credential(ctx, &desired.domain, external_name).await;
        Ok(found(result)?.map_or_else(Observation::absent, |o| Observation::present(o, true)))
    }

    async fn create(
        &self,
        ctx: &Context,
        desired: &SmtpCredentialParameters,
    ) -> ProviderResult<String> {
        check("create_smtp_credential", desired.validate())?;
        self.client.create_smtp_credential(ctx, desired).await?;
        Ok(desired.full_login())
    }

    async fn update(
        &self,
        ctx: &Context,
        _external_name: &str,
        desired: &SmtpCredentialParameters,
    ) -> ProviderResult<()> {
        check("update_smtp_credential_password", desired.validate())?;
        self.client.update_smtp_credential_password(ctx, desired).await
    }

    async fn delete(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &SmtpCredentialParameters,
    ) -> ProviderResult<()> {
        let result = self.client.delete_smtp_credential(ctx, &desired.domain, external_name).await;
        gone(Self::KIND, external_name, result)
    }
}
