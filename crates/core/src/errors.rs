//! Errors surfaced by the resilient client and the resource lifecycle.

use std::time::Duration;

use provider_mailgun_common::{
    BreakerError, CancelReason, ErrorClassification, ErrorSeverity, RetryError,
};
use provider_mailgun_domain::ApiError;
use thiserror::Error;

/// Outcome of a failed provider operation, flattened from the retry and
/// breaker layers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The API rejected the call with a permanent error.
    #[error("{operation}: {source}")]
    Api { operation: String, source: ApiError },

    /// Every attempt failed with a retryable error.
    #[error("{operation}: failed after {attempts} attempts: {source}")]
    Exhausted { operation: String, attempts: u32, source: ApiError },

    /// The shared circuit breaker refused the call.
    #[error("{operation}: circuit breaker '{breaker}' is open")]
    CircuitOpen { operation: String, breaker: String },

    /// The caller's context ended first.
    ///
    /// `attempts` is set when the run stopped in a retry backoff and unset
    /// when it stopped inside the circuit breaker.
    #[error("{operation}: {}: {reason}", cancel_phase(.attempts))]
    Cancelled {
        operation: String,
        attempts: Option<u32>,
        #[source]
        reason: CancelReason,
        last_error: Option<ApiError>,
    },
}

fn cancel_phase(attempts: &Option<u32>) -> String {
    match attempts {
        Some(n) => format!("cancelled during retry backoff after {n} attempts"),
        None => "cancelled in circuit breaker".to_owned(),
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    /// Wrap an error raised before any call was made.
    pub fn api<S: Into<String>>(operation: S, source: ApiError) -> Self {
        Self::Api { operation: operation.into(), source }
    }

    /// Name of the operation that failed.
    pub fn operation(&self) -> &str {
        match self {
            Self::Api { operation, .. }
            | Self::Exhausted { operation, .. }
            | Self::CircuitOpen { operation, .. }
            | Self::Cancelled { operation, .. } => operation,
        }
    }

    /// The last API error seen, if the API was reached.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api { source, .. } | Self::Exhausted { source, .. } => Some(source),
            Self::Cancelled { last_error, .. } => last_error.as_ref(),
            Self::CircuitOpen { .. } => None,
        }
    }

    /// Whether the remote resource does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api { source, .. } | Self::Exhausted { source, .. } => source.is_not_found(),
            Self::CircuitOpen { .. } | Self::Cancelled { .. } => false,
        }
    }

    /// Whether the breaker rejected the call without reaching the API.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }

    /// Whether the caller's context ended the operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<RetryError<BreakerError<ApiError>>> for ProviderError {
    fn from(err: RetryError<BreakerError<ApiError>>) -> Self {
        match err {
            RetryError::Exhausted { operation, attempts, source } => match source {
                BreakerError::Operation(source) => Self::Exhausted { operation, attempts, source },
                other => from_breaker(operation, other),
            },
            RetryError::NonRetryable { operation, source, .. } => match source {
                BreakerError::Operation(source) => Self::Api { operation, source },
                other => from_breaker(operation, other),
            },
            RetryError::Cancelled { operation, attempts, reason, last_error } => Self::Cancelled {
                operation,
                attempts: Some(attempts),
                reason,
                last_error: last_error.into_operation(),
            },
        }
    }
}

fn from_breaker(operation: String, err: BreakerError<ApiError>) -> ProviderError {
    match err {
        BreakerError::Open { breaker } => ProviderError::CircuitOpen { operation, breaker },
        BreakerError::Cancelled { reason, .. } => {
            ProviderError::Cancelled { operation, attempts: None, reason, last_error: None }
        }
        BreakerError::Operation(source) => ProviderError::Api { operation, source },
    }
}

impl ErrorClassification for ProviderError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Api { source, .. } => source.is_retryable(),
            Self::Exhausted { .. } | Self::CircuitOpen { .. } => true,
            Self::Cancelled { .. } => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Api { source, .. } => source.severity(),
            Self::Exhausted { .. } | Self::CircuitOpen { .. } => ErrorSeverity::Warning,
            Self::Cancelled { .. } => ErrorSeverity::Info,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
