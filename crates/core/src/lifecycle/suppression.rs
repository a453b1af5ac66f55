//! Bounces, complaints and unsubscribes.
//!
//! Re-posting an entry overwrites it, so update is create.

use std::collections::BTreeSet;

use async_trait::async_trait;
use provider_mailgun_common::Context;
use provider_mailgun_domain::{
    BounceObservation, BounceParameters, ComplaintObservation, ComplaintParameters, ResourceKind,
    UnsubscribeObservation, UnsubscribeParameters,
};

use super::{check, found, gone, ExternalResource, Observation};
use crate::client::ResilientClient;
use crate::errors::ProviderResult;

/// Bounce suppression entries.
#[derive(Debug, Clone)]
pub struct BounceResource {
    client: ResilientClient,
}

impl BounceResource {
    /// Lifecycle over the resilient client.
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }
}

fn bounce_up_to_date(desired: &BounceParameters, observed: &BounceObservation) -> bool {
    let code_matches = desired
        .code
        .map_or(true, |code| observed.code.as_deref() == Some(code.to_string().as_str()));
    code_matches && desired.error.as_ref().map_or(true, |e| observed.error.as_ref() == Some(e))
}

#[async_trait]
impl ExternalResource for BounceResource {
    type Parameters = BounceParameters;
    type Observed = BounceObservation;

    const KIND: ResourceKind = ResourceKind::Bounce;

    async fn observe(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &BounceParameters,
    ) -> ProviderResult<Observation<BounceObservation>> {
        if external_name.is_empty() {
            return Ok(Observation::absent());
        }
        Ok(match found(self.client.get_bounce(ctx, &desired.domain, external_name).await)? {
            Some(observed) => {
                let up_to_date = bounce_up_to_date(desired, &observed);
                Observation::present(observed, up_to_date)
            }
            None => Observation::absent(),
        })
    }

    async fn create(&self, ctx: &Context, desired: &BounceParameters) -> ProviderResult<String> {
        check("create_bounce", desired.validate())?;
        self.client.create_bounce(ctx, desired).await?;
        Ok(desired.address.clone())
    }

    async fn update(
        &self,
        ctx: &Context,
        _external_name: &str,
        desired: &BounceParameters,
    ) -> ProviderResult<()> {
        self.create(ctx, desired).await.map(|_| ())
    }

    async fn delete(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &BounceParameters,
    ) -> ProviderResult<()> {
        let result = self.client.delete_bounce(ctx, &desired.domain, external_name).await;
        gone(Self::KIND, external_name, result)
    }
}

/// Complaint suppression entries.
#[derive(Debug, Clone)]
pub struct ComplaintResource {
    client: ResilientClient,
}

impl ComplaintResource {
    /// Lifecycle over the resilient client.
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExternalResource for ComplaintResource {
    type Parameters = ComplaintParameters;
    type Observed = ComplaintObservation;

    const KIND: ResourceKind = ResourceKind::Complaint;

    async fn observe(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &ComplaintParameters,
    ) -> ProviderResult<Observation<ComplaintObservation>> {
        if external_name.is_empty() {
            return Ok(Observation::absent());
        }
        let result = self.client.get_complaint(ctx, &desired.domain, external_name).await;
        // A complaint carries no mutable fields; existing means up to date.
        Ok(found(result)?.map_or_else(Observation::absent, |o| Observation::present(o, true)))
    }

    async fn create(&self, ctx: &Context, desired: &ComplaintParameters) -> ProviderResult<String> {
        check("create_complaint", desired.validate())?;
        self.client.create_complaint(ctx, desired).await?;
        Ok(desired.address.clone())
    }

    async fn update(
        &self,
        ctx: &Context,
        _external_name: &str,
        desired: &ComplaintParameters,
    ) -> ProviderResult<()> {
        self.create(ctx, desired).await.map(|_| ())
    }

    async fn delete(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &ComplaintParameters,
    ) -> ProviderResult<()> {
        let result = self.client.delete_complaint(ctx, &desired.domain, external_name).await;
        gone(Self::KIND, external_name, result)
    }
}

/// Unsubscribe suppression entries.
#[derive(Debug, Clone)]
pub struct UnsubscribeResource {
    client: ResilientClient,
}

impl UnsubscribeResource {
    /// Lifecycle over the resilient client.
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }
}

fn unsubscribe_up_to_date(desired: &UnsubscribeParameters, observed: &UnsubscribeObservation) -> bool {
    let want: BTreeSet<String> = desired.effective_tags().into_iter().collect();
    let have: BTreeSet<String> = observed.tags.iter().cloned().collect();
    want == have
}

#[async_trait]
impl ExternalResource for UnsubscribeResource {
    type Parameters = UnsubscribeParameters;
    type Observed = UnsubscribeObservation;

    const KIND: ResourceKind = ResourceKind::Unsubscribe;

    async fn observe(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &UnsubscribeParameters,
    ) -> ProviderResult<Observation<UnsubscribeObservation>> {
        if external_name.is_empty() {
            return Ok(Observation::absent());
        }
        Ok(match found(self.client.get_unsubscribe(ctx, &desired.domain, external_name).await)? {
            Some(observed) => {
                let up_to_date = unsubscribe_up_to_date(desired, &observed);
                Observation::present(observed, up_to_date)
            }
            None => Observation::absent(),
        })
    }

    async fn create(
        &self,
        ctx: &Context,
        desired: &UnsubscribeParameters,
    ) -> ProviderResult<String> {
        check("create_unsubscribe", desired.validate())?;
        self.client.create_unsubscribe(ctx, desired).await?;
        Ok(desired.address.clone())
    }

    async fn update(
        &self,
        ctx: &Context,
        _external_name: &str,
        desired: &UnsubscribeParameters,
    ) -> ProviderResult<()> {
        self.create(ctx, desired).await.map(|_| ())
    }

    async fn delete(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &UnsubscribeParameters,
    ) -> ProviderResult<()> {
        let result = self.client.delete_unsubscribe(ctx, &desired.domain, external_name).await;
        gone(Self::KIND, external_name, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounce_compares_code_as_text() {
        let desired = BounceParameters {
            domain: "mg.example.com".into(),
            address: "a@b.io".into(),
            code: Some(550),
            error: None,
        };
        let observed = BounceObservation {
            address: "a@b.io".into(),
            code: Some("550".into()),
            error: Some("mailbox full".into()),
            created_at: None,
        };
        assert!(bounce_up_to_date(&desired, &observed));
        assert!(!bounce_up_to_date(&BounceParameters { code: Some(421), ..desired }, &observed));
    }

    #[test]
    fn test_unsubscribe_without_tags_means_all() {
        let desired = UnsubscribeParameters {
            domain: "mg.example.com".into(),
            address: "a@b.io".into(),
            tags: Vec::new(),
        };
        let observed =
            UnsubscribeObservation { address: "a@b.io".into(), tags: vec!["*".into()], created_at: None };
        assert!(unsubscribe_up_to_date(&desired, &observed));
    }
}
