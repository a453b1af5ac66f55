use async_trait::async_trait;
use provider_mailgun_common::Context;
use provider_mailgun_domain::{ResourceKind, RouteObservation, RouteParameters};
use tracing::info;

use super::{check, found, gone, ExternalResource, Observation};
use crate::client::ResilientClient;
use crate::errors::ProviderResult;

/// Inbound routes, named by the id the API assigns on create.
#[derive(Debug, Clone)]
pub struct RouteResource {
    client: ResilientClient,
}

impl RouteResource {
    /// Lifecycle over the resilient client.
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }
}

fn is_up_to_date(desired: &RouteParameters, observed: &RouteObservation) -> bool {
    desired.priority == observed.priority
        && desired.description == observed.description
        && desired.expression == observed.expression
        && desired.actions == observed.actions
}

#[async_trait]
impl ExternalResource for RouteResource {
    type Parameters = RouteParameters;
    type Observed = RouteObservation;

    const KIND: ResourceKind = ResourceKind::Route;

    async fn observe(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &RouteParameters,
    ) -> ProviderResult<Observation<RouteObservation>> {
        // No id yet means the route was never created.
        if external_name.is_empty() {
            return Ok(Observation::absent());
        }
        Ok(match found(self.client.get_route(ctx, external_name).await)? {
            Some(observed) => {
                let up_to_date = is_up_to_date(desired, &observed);
                Observation::present(observed, up_to_date)
            }
            None => Observation::absent(),
        })
    }

    async fn create(&self, ctx: &Context, desired: &RouteParameters) -> ProviderResult<String> {
        check("create_route", desired.validate())?;
        let created = self.client.create_route(ctx, desired).await?;
        info!(route = %created.id, expression = %created.expression, "created route");
        Ok(created.id)
    }

    async fn update(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &RouteParameters,
    ) -> ProviderResult<()> {
        check("update_route", desired.validate())?;
        self.client.update_route(ctx, external_name, desired).await.map(|_| ())
    }

    async fn delete(
        &self,
        ctx: &Context,
        external_name: &str,
        _desired: &RouteParameters,
    ) -> ProviderResult<()> {
        gone(Self::KIND, external_name, self.client.delete_route(ctx, external_name).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_order_matters() {
        let desired = RouteParameters {
            priority: 0,
            description: String::new(),
            expression: "catch_all()".into(),
            actions: vec!["forward(\"x\")".into(), "stop()".into()],
        };
        let mut observed = RouteObservation {
            id: "r".into(),
            priority: 0,
            description: String::new(),
            expression: "catch_all()".into(),
            actions: desired.actions.clone(),
            created_at: None,
        };
        assert!(is_up_to_date(&desired, &observed));
        observed.actions.reverse();
        assert!(!is_up_to_date(&desired, &observed));
    }
}
