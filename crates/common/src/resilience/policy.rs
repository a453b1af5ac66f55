//! Retry policy and backoff calculation.
//!
//! A [`RetryPolicy`] is immutable once built. Two presets exist:
//! [`RetryPolicy::conservative`] (also the `Default`) for generic call sites
//! and [`RetryPolicy::api`] tuned for the remote REST API.

use std::collections::BTreeSet;
use std::time::Duration;

use rand::Rng;

use crate::error::{CommonError, CommonResult};

/// Cap on the backoff exponent so `2^attempt` never overflows.
pub const MAX_BACKOFF_EXPONENT: u32 = 30;

const CONSERVATIVE_SUBSTRINGS: &[&str] = &[
    "timeout",
    "connection refused",
    "connection reset",
    "rate limit",
    "too many requests",
    "service unavailable",
    "temporarily unavailable",
];

const API_EXTRA_SUBSTRINGS: &[&str] = &[
    "bad gateway",
    "gateway timeout",
    "i/o timeout",
    "broken pipe",
    "unexpected eof",
    "server closed",
];

/// How many times to attempt an operation and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    jitter_fraction: f64,
    retryable_error_substrings: BTreeSet<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::conservative()
    }
}

impl RetryPolicy {
    /// 3 attempts, 250ms initial backoff, 16s cap, 10% jitter.
    pub fn conservative() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(16),
            jitter_fraction: 0.1,
            retryable_error_substrings: lowercase_set(CONSERVATIVE_SUBSTRINGS.iter().copied()),
        }
    }

    /// 5 attempts, 500ms initial backoff, 30s cap, 20% jitter, and a broader
    /// set of retryable phrases.
    pub fn api() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            jitter_fraction: 0.2,
            retryable_error_substrings: lowercase_set(
                CONSERVATIVE_SUBSTRINGS.iter().chain(API_EXTRA_SUBSTRINGS).copied(),
            ),
        }
    }

    /// Start a builder seeded with the conservative preset.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::from(Self::conservative())
    }

    /// Start a builder seeded with this policy.
    pub fn to_builder(&self) -> RetryPolicyBuilder {
        RetryPolicyBuilder::from(self.clone())
    }

    /// Total attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the first retry.
    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    /// Upper bound on any single delay.
    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    /// Relative spread applied to each delay.
    pub fn jitter_fraction(&self) -> f64 {
        self.jitter_fraction
    }

    /// Configured substrings, lowercase.
    pub fn retryable_error_substrings(&self) -> impl Iterator<Item = &str> {
        self.retryable_error_substrings.iter().map(String::as_str)
    }

    /// Check the invariants every policy must hold.
    pub fn validate(&self) -> CommonResult<()> {
        if self.max_attempts == 0 {
            return Err(CommonError::config_field("retry.max_attempts", "must be at least 1"));
        }
        if self.initial_backoff > self.max_backoff {
            return Err(CommonError::config_field(
                "retry.initial_backoff",
                format!(
                    "initial backoff ({:?}) cannot exceed max backoff ({:?})",
                    self.initial_backoff, self.max_backoff
                ),
            ));
        }
        if !self.jitter_fraction.is_finite() || !(0.0..=1.0).contains(&self.jitter_fraction) {
            return Err(CommonError::config_field(
                "retry.jitter_fraction",
                format!("must be within [0, 1], got {}", self.jitter_fraction),
            ));
        }
        Ok(())
    }

    /// Delay before the retry that follows attempt number `attempt`
    /// (zero-based), using the thread-local RNG for jitter.
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        self.calculate_backoff_with(attempt, &mut rand::thread_rng())
    }

    /// Same as [`calculate_backoff`](Self::calculate_backoff) with a caller
    /// supplied random source.
    ///
    /// `initial * 2^attempt`, clamped to `max_backoff`, then perturbed by up to
    /// `±jitter_fraction` of itself. A negative result falls back to
    /// `initial_backoff`. The result always lies in `[0, max_backoff]`.
    pub fn calculate_backoff_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let exponent = attempt.min(MAX_BACKOFF_EXPONENT);
        let base = self.initial_backoff.saturating_mul(1_u32 << exponent).min(self.max_backoff);

        if self.jitter_fraction <= 0.0 || base.is_zero() {
            return base;
        }

        let spread = base.as_secs_f64() * self.jitter_fraction;
        let offset = rng.gen_range(-spread..=spread);
        let jittered = base.as_secs_f64() + offset;

        let delay = if jittered < 0.0 {
            self.initial_backoff
        } else {
            Duration::try_from_secs_f64(jittered).unwrap_or(self.initial_backoff)
        };
        delay.min(self.max_backoff)
    }
}

/// Validating builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl From<RetryPolicy> for RetryPolicyBuilder {
    fn from(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

impl RetryPolicyBuilder {
    /// Total attempts, including the first.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.policy.max_attempts = attempts;
        self
    }

    /// Delay before the first retry.
    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.policy.initial_backoff = backoff;
        self
    }

    /// Upper bound on any single delay.
    pub fn max_backoff(mut self, backoff: Duration) -> Self {
        self.policy.max_backoff = backoff;
        self
    }

    /// Relative spread in `[0, 1]`.
    pub fn jitter_fraction(mut self, fraction: f64) -> Self {
        self.policy.jitter_fraction = fraction;
        self
    }

    /// Add one retryable substring (matched case-insensitively).
    pub fn retryable_substring<S: AsRef<str>>(mut self, substring: S) -> Self {
        self.policy.retryable_error_substrings.insert(substring.as_ref().to_lowercase());
        self
    }

    /// Replace the retryable substrings.
    pub fn retryable_substrings<I, S>(mut self, substrings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.policy.retryable_error_substrings =
            substrings.into_iter().map(|s| s.as_ref().to_lowercase()).collect();
        self
    }

    /// Validate and return the policy.
    pub fn build(self) -> CommonResult<RetryPolicy> {
        self.policy.validate()?;
        Ok(self.policy)
    }
}

fn lowercase_set<'a>(items: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    items.map(str::to_lowercase).collect()
}
