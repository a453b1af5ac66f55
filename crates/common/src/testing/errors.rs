//! A scriptable error type for exercising the classifier and executor.

use std::fmt;

use crate::error::NetworkSignal;

/// Error with a fixed message and optional network signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestError {
    pub message: String,
    pub timed_out: Option<bool>,
    pub temporary: Option<bool>,
}

impl TestError {
    /// Plain error carrying only `message`.
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self { message: message.into(), timed_out: None, temporary: None }
    }

    /// A retryable error under every built-in policy.
    pub fn transient() -> Self {
        Self::new("503 service unavailable")
    }

    /// An error no built-in policy retries.
    pub fn permanent() -> Self {
        Self::new("400 bad request: invalid domain name")
    }

    /// A network timeout with a message no substring matches.
    pub fn network_timeout() -> Self {
        Self { message: "dial failed".into(), timed_out: Some(true), temporary: Some(true) }
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TestError {}

impl NetworkSignal for TestError {
    fn timed_out(&self) -> Option<bool> {
        self.timed_out
    }

    fn temporary(&self) -> Option<bool> {
        self.temporary
    }
}
