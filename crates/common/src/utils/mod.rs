//! Small helpers shared by the provider crates.
//!
//! - **[`serde`]**: millisecond encodings for `Duration` fields in config files

pub mod serde;

pub use self::serde::{duration_millis, option_duration_millis};
