//! Shared error vocabulary for the provider crates.
//!
//! Three pieces live here:
//!
//! 1. **`CommonError`**: configuration, serialization and internal failures
//!    that are not tied to a particular remote call.
//! 2. **`ErrorClassification`**: the trait every library error implements so
//!    callers can ask "retry?", "how bad?", "wait how long?" uniformly.
//! 3. **`NetworkSignal`**: the capability through which an error reports
//!    network-level timeout semantics to the retry classifier.
//!
//! Module-specific errors compose with these rather than duplicating them:
//!
//! ```rust,ignore
//! #[derive(Debug, thiserror::Error)]
//! pub enum LoaderError {
//!     #[error("config file not found")]
//!     Missing,
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//! ```

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Standard result type using [`CommonError`].
pub type CommonResult<T> = Result<T, CommonError>;

/// Error variants shared across crates.
#[derive(Debug, Clone, Error)]
pub enum CommonError {
    /// Invalid or missing configuration.
    #[error("Configuration error{}: {message}", field_suffix(.field.as_deref()))]
    Config { message: String, field: Option<String> },

    /// Parsing or rendering a document failed.
    #[error("Serialization error{}: {message}", format_suffix(.format.as_deref()))]
    Serialization { message: String, format: Option<String> },

    /// Invariant violation; should not happen.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn field_suffix(field: Option<&str>) -> String {
    field.map(|f| format!(" in field '{f}'")).unwrap_or_default()
}

fn format_suffix(format: Option<&str>) -> String {
    format.map(|f| format!(" ({f})")).unwrap_or_default()
}

impl CommonError {
    /// Create a configuration error without a field.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Create a configuration error for a specific field.
    pub fn config_field<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Create a serialization error naming the document format.
    pub fn serialization_format<F: Into<String>, S: Into<String>>(format: F, message: S) -> Self {
        Self::Serialization { message: message.into(), format: Some(format.into()) }
    }

    /// Create an internal error.
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }
}

impl ErrorClassification for CommonError {
    /// Local failures; repeating them changes nothing.
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Internal { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Uniform classification interface for library errors.
pub trait ErrorClassification {
    /// Whether repeating the failed operation may succeed.
    fn is_retryable(&self) -> bool;

    /// Severity for logging and alerting decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Whether the error signals a broken invariant.
    fn is_critical(&self) -> bool;

    /// Suggested delay before retrying, when the error carries one.
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Expected condition, e.g. a resource that does not exist yet
    Info,
    /// Degraded but operational
    Warning,
    /// Failure requiring attention
    Error,
    /// System integrity at risk
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

/// Network-level semantics an error may expose to the retry classifier.
///
/// `None` means the error carries no network information at all. The
/// classifier only acts on [`timed_out`](Self::timed_out); `temporary` is
/// reported for diagnostics but never makes an error retryable on its own.
pub trait NetworkSignal {
    /// `Some(true)` when the failure was a network timeout.
    fn timed_out(&self) -> Option<bool> {
        None
    }

    /// `Some(true)` when the failure was flagged as temporary.
    fn temporary(&self) -> Option<bool> {
        None
    }
}

impl NetworkSignal for io::Error {
    fn timed_out(&self) -> Option<bool> {
        Some(self.kind() == io::ErrorKind::TimedOut)
    }

    fn temporary(&self) -> Option<bool> {
        Some(matches!(
            self.kind(),
            io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        ))
    }
}

impl<T: NetworkSignal + ?Sized> NetworkSignal for &T {
    fn timed_out(&self) -> Option<bool> {
        (**self).timed_out()
    }

    fn temporary(&self) -> Option<bool> {
        (**self).temporary()
    }
}

impl<T: NetworkSignal + ?Sized> NetworkSignal for Box<T> {
    fn timed_out(&self) -> Option<bool> {
        (**self).timed_out()
    }

    fn temporary(&self) -> Option<bool> {
        (**self).temporary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates the rendered text of field-scoped configuration errors.
    ///
    /// Assertions:
    /// - The field name and message both appear.
    #[test]
    fn test_config_field_display() {
        let err = CommonError::config_field("api.api_key", "must not be empty");
        assert_eq!(err.to_string(), "Configuration error in field 'api.api_key': must not be empty");

        let bare = CommonError::config("no config file found");
        assert_eq!(bare.to_string(), "Configuration error: no config file found");
    }

    #[test]
    fn test_serialization_format_display() {
        let err = CommonError::serialization_format("TOML", "expected table");
        assert_eq!(err.to_string(), "Serialization error (TOML): expected table");
    }

    /// Validates classification of the shared variants.
    ///
    /// Assertions:
    /// - No variant is retryable.
    /// - Internal errors are critical; config errors are not.
    #[test]
    fn test_common_error_classification() {
        let config = CommonError::config("bad");
        assert!(!config.is_retryable());
        assert!(!config.is_critical());
        assert_eq!(config.severity(), ErrorSeverity::Error);

        let internal = CommonError::internal("unreachable state");
        assert!(!internal.is_retryable());
        assert!(internal.is_critical());
        assert_eq!(internal.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_severity_ordering_and_display() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARNING");
    }

    /// Validates the io::Error network signals.
    ///
    /// Assertions:
    /// - `TimedOut` reports both timed_out and temporary.
    /// - `ConnectionRefused` reports neither.
    #[test]
    fn test_io_error_network_signal() {
        let timeout = io::Error::new(io::ErrorKind::TimedOut, "deadline");
        assert_eq!(timeout.timed_out(), Some(true));
        assert_eq!(timeout.temporary(), Some(true));

        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(refused.timed_out(), Some(false));
        assert_eq!(refused.temporary(), Some(false));

        let interrupted = io::Error::new(io::ErrorKind::Interrupted, "eintr");
        assert_eq!(interrupted.timed_out(), Some(false));
        assert_eq!(interrupted.temporary(), Some(true));
    }
}
