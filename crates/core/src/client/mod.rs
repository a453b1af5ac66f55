//! Access to the remote API.
//!
//! [`ports::MailgunApi`] is the raw, single-attempt surface implemented by
//! the HTTP adapter. [`ResilientClient`] wraps any implementation with the
//! retry executor and the shared circuit breaker.

pub mod ports;
pub mod resilient;

pub use ports::MailgunApi;
pub use resilient::ResilientClient;
