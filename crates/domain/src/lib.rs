//! # provider-mailgun-domain
//!
//! Plain data for the Mailgun provider.
//!
//! This crate contains:
//! - [`ApiError`], the failure of a single raw API call
//! - parameter (desired) and observation (remote) types for the nine
//!   resource kinds, with their form encodings
//!
//! ## Architecture
//! - Depends only on the foundation tier of `provider-mailgun-common`
//! - No I/O; every type here is a value

pub mod errors;
pub mod macros;
pub mod types;

pub use errors::{is_not_found_message, ApiError, ApiResult};
pub use types::*;
