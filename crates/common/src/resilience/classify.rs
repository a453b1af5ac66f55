//! Retryable-error classification.
//!
//! The classifier looks at what an error *says*, not at its type: network
//! timeout signals first, then HTTP status codes embedded in the rendered
//! message, then the policy's configured substrings. Upstream message changes
//! can therefore cause false negatives; the tests pin every phrase relied on.

use std::fmt::Display;

use super::policy::RetryPolicy;
use crate::error::NetworkSignal;

/// Status codes whose presence in an error message marks it transient.
pub const TRANSIENT_STATUS_CODES: &[&str] = &["429", "502", "503", "504"];

impl RetryPolicy {
    /// Whether `err` is worth another attempt under this policy.
    ///
    /// A merely temporary (non-timeout) network error is not retried.
    pub fn is_retryable<E>(&self, err: &E) -> bool
    where
        E: NetworkSignal + Display + ?Sized,
    {
        if err.timed_out() == Some(true) {
            return true;
        }

        let message = err.to_string().to_lowercase();
        if TRANSIENT_STATUS_CODES.iter().any(|code| message.contains(code)) {
            return true;
        }

        self.retryable_error_substrings().any(|needle| message.contains(needle))
    }
}

/// Classify a whole result; success is never retryable.
pub fn is_retryable_result<T, E>(policy: &RetryPolicy, result: &Result<T, E>) -> bool
where
    E: NetworkSignal + Display,
{
    match result {
        Ok(_) => false,
        Err(err) => policy.is_retryable(err),
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::io;

    use super::*;

    #[derive(Debug)]
    struct Msg(&'static str);

    impl fmt::Display for Msg {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl NetworkSignal for Msg {}

    #[derive(Debug)]
    struct NetErr {
        timeout: bool,
        temporary: bool,
    }

    impl fmt::Display for NetErr {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("dial tcp 10.0.0.1:443: operation failed")
        }
    }

    impl NetworkSignal for NetErr {
        fn timed_out(&self) -> Option<bool> {
            Some(self.timeout)
        }

        fn temporary(&self) -> Option<bool> {
            Some(self.temporary)
        }
    }

    #[test]
    fn test_ok_result_is_not_retryable() {
        let policy = RetryPolicy::conservative();
        let ok: Result<(), Msg> = Ok(());
        assert!(!is_retryable_result(&policy, &ok));
        assert!(is_retryable_result(&policy, &Err::<(), _>(Msg("503 service unavailable"))));
    }

    /// Validates the timeout signal and the ignored temporary signal.
    ///
    /// Assertions:
    /// - A timed-out network error is retryable.
    /// - A temporary but not timed-out one is not.
    #[test]
    fn test_network_timeout_vs_temporary() {
        let policy = RetryPolicy::conservative();
        assert!(policy.is_retryable(&NetErr { timeout: true, temporary: false }));
        assert!(!policy.is_retryable(&NetErr { timeout: false, temporary: true }));

        let io_timeout = io::Error::new(io::ErrorKind::TimedOut, "read");
        assert!(policy.is_retryable(&io_timeout));
    }

    /// Validates status-code and phrase matching.
    ///
    /// Assertions:
    /// - 429/502/503/504 and the pinned phrases are retryable.
    /// - 404 and "not found" variants are not.
    #[test]
    fn test_status_codes_and_phrases() {
        let policy = RetryPolicy::conservative();

        for retryable in [
            "503 service unavailable",
            "502 bad gateway",
            "too many requests",
            "HTTP 429",
            "POST /v4/domains: status 504",
            "Connection Refused by peer",
            "connection reset by peer",
            "read timeout",
            "Rate Limit reached",
            "resource temporarily unavailable",
        ] {
            assert!(policy.is_retryable(&Msg(retryable)), "expected retryable: {retryable}");
        }

        for permanent in [
            "404 not found",
            "domain not found",
            "401 unauthorized",
            "400 bad request: invalid address",
            "forbidden",
        ] {
            assert!(!policy.is_retryable(&Msg(permanent)), "expected permanent: {permanent}");
        }
    }

    #[test]
    fn test_api_profile_phrases() {
        let conservative = RetryPolicy::conservative();
        let api = RetryPolicy::api();

        let err = Msg("write: broken pipe");
        assert!(!conservative.is_retryable(&err));
        assert!(api.is_retryable(&err));
        assert!(api.is_retryable(&Msg("unexpected EOF")));
    }

    #[test]
    fn test_custom_substrings_replace_defaults() {
        let policy = RetryPolicy::builder()
            .retryable_substrings(["quota exceeded"])
            .build()
            .expect("valid policy");

        assert!(policy.is_retryable(&Msg("Quota Exceeded for domain")));
        assert!(!policy.is_retryable(&Msg("connection refused")));
        // status codes are fixed regardless of the configured phrases
        assert!(policy.is_retryable(&Msg("status 503")));
    }
}
