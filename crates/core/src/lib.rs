//! # provider-mailgun-core
//!
//! Provider logic with no transport code.
//!
//! This crate contains:
//! - [`MailgunApi`], the port the HTTP adapter implements
//! - [`ResilientClient`], retries and circuit breaking around that port
//! - [`ProviderError`], the flattened failure taxonomy
//! - the per-kind external resource lifecycle
//!
//! ## Architecture Principles
//! - Depends on `provider-mailgun-common` and `provider-mailgun-domain` only
//! - All I/O goes through [`MailgunApi`]

pub mod client;
pub mod errors;
pub mod lifecycle;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use client::{MailgunApi, ResilientClient};
pub use errors::{ProviderError, ProviderResult};
pub use lifecycle::{
    observe_by_id, BounceResource, ComplaintResource, DomainResource, ExternalResource,
    MailingListResource, Observation, RouteResource, SmtpCredentialResource, TemplateResource,
    UnsubscribeResource, WebhookResource,
};
