//! Errors raised by a single call to the remote API.

use std::time::Duration;

use provider_mailgun_common::{ErrorClassification, ErrorSeverity, NetworkSignal};
use thiserror::Error;

/// Failure of one raw API call.
///
/// The rendered text is what the retry classifier inspects, so status codes
/// are embedded in it. Request paths are kept out of the text because
/// resource identifiers (route ids, addresses) can contain digit runs that
/// would look like status codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The API answered with a non-2xx status.
    #[error("{method} request failed with status {status}: {message}")]
    Status { method: String, path: String, status: u16, message: String },

    /// No usable response was received.
    #[error("transport error: {message}")]
    Transport { message: String, timed_out: bool, connect: bool },

    /// A 2xx response body did not match the expected shape.
    #[error("failed to decode response: {message}")]
    Decode { message: String },

    /// The request could not be built from the given parameters.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

/// Result type for raw API calls.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Non-2xx response.
    pub fn status<M, P, S>(method: M, path: P, status: u16, message: S) -> Self
    where
        M: Into<String>,
        P: Into<String>,
        S: Into<String>,
    {
        Self::Status { method: method.into(), path: path.into(), status, message: message.into() }
    }

    /// Rejected locally before any request was sent.
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest { message: message.into() }
    }

    /// HTTP status, when the API answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error means the resource does not exist.
    ///
    /// Matches on the rendered text ("404" / "not found") so wrapped and
    /// re-rendered errors classify the same way.
    pub fn is_not_found(&self) -> bool {
        if self.status_code() == Some(404) {
            return true;
        }
        is_not_found_message(&self.to_string())
    }
}

/// Substring test shared by every layer that wraps an [`ApiError`].
pub fn is_not_found_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("404") || lower.contains("not found")
}

impl NetworkSignal for ApiError {
    fn timed_out(&self) -> Option<bool> {
        match self {
            Self::Transport { timed_out, .. } => Some(*timed_out),
            _ => None,
        }
    }

    fn temporary(&self) -> Option<bool> {
        match self {
            Self::Transport { connect, .. } => Some(*connect),
            _ => None,
        }
    }
}

impl ErrorClassification for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            Self::Transport { timed_out, connect, .. } => *timed_out || *connect,
            Self::Decode { .. } | Self::InvalidRequest { .. } => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Status { status: 404, .. } => ErrorSeverity::Info,
            Self::Status { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Warning
            }
            Self::Transport { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
