//! # Mailgun Provider
//!
//! Binary crate: CLI, logging, dependency wiring, the health/readiness/
//! metrics server and the one-shot `observe` command.

pub mod cli;
pub mod context;
pub mod logging;
pub mod observe;
pub mod server;

pub use context::AppContext;
