//! # Mailgun Provider Infrastructure
//!
//! Implementations of the core ports.
//!
//! This crate contains:
//! - The reqwest transport with its 502 retry loop ([`http`])
//! - The HTTP implementation of `MailgunApi` ([`api`])
//! - Configuration schema, loader and credential parsing ([`config`])
//!
//! Two retry layers are stacked at runtime: the transport retries a 502 up
//! to `gateway_retries` extra times, and the resilient client retries the
//! whole operation up to `max_attempts` times. One logical operation can
//! therefore issue `(gateway_retries + 1) * max_attempts` requests.

pub mod api;
pub mod config;
pub mod http;

pub use api::MailgunClient;
pub use config::{build_http_client, ProviderConfig};
pub use http::{HttpClient, HttpClientBuilder};
