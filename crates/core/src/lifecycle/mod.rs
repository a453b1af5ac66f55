//! External resource lifecycle: observe, create, update, delete.
//!
//! Each resource kind maps its desired parameters onto the resilient client.
//! Two rules hold for every kind:
//! - a not-found answer while observing means the resource is absent
//! - a not-found answer while deleting means the deletion already happened

mod domain;
mod mailing_list;
mod route;
mod smtp_credential;
mod suppression;
mod template;
mod webhook;

pub use domain::DomainResource;
pub use mailing_list::MailingListResource;
pub use route::RouteResource;
pub use smtp_credential::SmtpCredentialResource;
pub use suppression::{BounceResource, ComplaintResource, UnsubscribeResource};
pub use template::TemplateResource;
pub use webhook::WebhookResource;

use async_trait::async_trait;
use provider_mailgun_common::Context;
use provider_mailgun_domain::{ApiError, ResourceKind, WebhookKind};
use serde::Serialize;
use tracing::debug;

use crate::client::ResilientClient;
use crate::errors::{ProviderError, ProviderResult};

/// What observing a resource found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation<T> {
    pub exists: bool,
    pub up_to_date: bool,
    pub observed: Option<T>,
}

impl<T> Observation<T> {
    /// Nothing exists remotely.
    pub fn absent() -> Self {
        Self { exists: false, up_to_date: false, observed: None }
    }

    /// The resource exists; `up_to_date` compares it with the desired state.
    pub fn present(observed: T, up_to_date: bool) -> Self {
        Self { exists: true, up_to_date, observed: Some(observed) }
    }
}

/// Lifecycle of one kind of remote resource.
///
/// `external_name` is the identifier the API knows the resource by: the
/// domain name, route id, list address, webhook kind, SMTP login, template
/// name or suppressed address.
#[async_trait]
pub trait ExternalResource: Send + Sync {
    type Parameters: Send + Sync;
    type Observed: Serialize + Send;

    const KIND: ResourceKind;

    async fn observe(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &Self::Parameters,
    ) -> ProviderResult<Observation<Self::Observed>>;

    /// Create the resource and return its external name.
    async fn create(&self, ctx: &Context, desired: &Self::Parameters) -> ProviderResult<String>;

    async fn update(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &Self::Parameters,
    ) -> ProviderResult<()>;

    async fn delete(
        &self,
        ctx: &Context,
        external_name: &str,
        desired: &Self::Parameters,
    ) -> ProviderResult<()>;
}

/// Map a not-found error to `None`.
pub(crate) fn found<T>(result: ProviderResult<T>) -> ProviderResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Treat a not-found error on delete as success.
pub(crate) fn gone(kind: ResourceKind, name: &str, result: ProviderResult<()>) -> ProviderResult<()> {
    match result {
        Err(err) if err.is_not_found() => {
            debug!(kind = %kind, name, "resource already absent");
            Ok(())
        }
        other => other,
    }
}

/// Reject parameters the API would refuse before spending a call.
pub(crate) fn check(operation: &str, result: Result<(), ApiError>) -> ProviderResult<()> {
    result.map_err(|e| ProviderError::api(operation, e))
}

/// Observe one resource by identifier, rendered as JSON.
///
/// Returns `None` when the resource does not exist. Domain-scoped kinds need
/// `domain`.
pub async fn observe_by_id(
    client: &ResilientClient,
    ctx: &Context,
    kind: ResourceKind,
    domain: Option<&str>,
    id: &str,
) -> ProviderResult<Option<serde_json::Value>> {
    let scope = || require_domain(kind, domain);

    let value = match kind {
        ResourceKind::Domain => to_json(found(client.get_domain(ctx, id).await)?),
        ResourceKind::Route => to_json(found(client.get_route(ctx, id).await)?),
        ResourceKind::MailingList => to_json(found(client.get_mailing_list(ctx, id).await)?),
        ResourceKind::Webhook => {
            let hook: WebhookKind = id
                .parse()
                .map_err(|e: String| ProviderError::api("observe", ApiError::invalid_request(e)))?;
            to_json(found(client.get_webhook(ctx, scope()?, hook).await)?)
        }
        ResourceKind::SmtpCredential => {
            to_json(found(client.get_smtp_credential(ctx, scope()?, id).await)?)
        }
        ResourceKind::Template => to_json(found(client.get_template(ctx, scope()?, id).await)?),
        ResourceKind::Bounce => to_json(found(client.get_bounce(ctx, scope()?, id).await)?),
        ResourceKind::Complaint => to_json(found(client.get_complaint(ctx, scope()?, id).await)?),
        ResourceKind::Unsubscribe => {
            to_json(found(client.get_unsubscribe(ctx, scope()?, id).await)?)
        }
    };
    value.map_err(|e| {
        ProviderError::api("observe", ApiError::Decode { message: e.to_string() })
    })
}

fn require_domain(kind: ResourceKind, domain: Option<&str>) -> ProviderResult<&str> {
    domain.filter(|d| !d.is_empty()).ok_or_else(|| {
        ProviderError::api(
            "observe",
            ApiError::invalid_request(format!("a domain is required to observe a {kind}")),
        )
    })
}

fn to_json<T: Serialize>(value: Option<T>) -> serde_json::Result<Option<serde_json::Value>> {
    value.map(serde_json::to_value).transpose()
}
