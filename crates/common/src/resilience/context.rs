//! Cancellation and deadline propagation for resilient calls.
//!
//! A [`Context`] pairs a [`CancellationToken`] with an optional deadline.
//! Every blocking wait in the resilience layer (backoff sleeps, breaker lock
//! acquisition) races [`Context::done`] so that no call outlives its caller.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`Context`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelReason {
    /// The token was cancelled explicitly.
    #[error("context canceled")]
    Cancelled,
    /// The deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation scope for one logical unit of work.
///
/// Cloning shares the same token and deadline. [`child`](Self::child) derives
/// a scope that is cancelled together with its parent but can also be
/// cancelled or shortened on its own.
#[derive(Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.token.is_cancelled())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Context {
    /// A scope that is never cancelled unless [`cancel`](Self::cancel) is
    /// called.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a child scope that expires `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child scope that expires at `deadline`.
    ///
    /// The earlier of the parent's and the new deadline wins.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self { token: self.token.child_token(), deadline: Some(deadline) }
    }

    /// Derive a child scope with the same deadline.
    pub fn child(&self) -> Self {
        Self { token: self.token.child_token(), deadline: self.deadline }
    }

    /// Cancel this scope and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Deadline, if one is set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Non-blocking check; `None` while the scope is still live.
    pub fn err(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            return Some(CancelReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the scope is cancelled or its deadline passes.
    ///
    /// Explicit cancellation wins when both are already true.
    pub async fn done(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    () = self.token.cancelled() => CancelReason::Cancelled,
                    () = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                CancelReason::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_reason_display() {
        assert_eq!(CancelReason::Cancelled.to_string(), "context canceled");
        assert_eq!(CancelReason::DeadlineExceeded.to_string(), "context deadline exceeded");
    }

    /// Validates that a background context stays live until cancelled.
    ///
    /// Assertions:
    /// - `err()` is `None` before cancel and `Cancelled` after.
    /// - `done()` resolves with `Cancelled`.
    #[tokio::test]
    async fn test_background_cancel() {
        let ctx = Context::background();
        assert_eq!(ctx.err(), None);

        ctx.cancel();
        assert_eq!(ctx.err(), Some(CancelReason::Cancelled));
        assert_eq!(ctx.done().await, CancelReason::Cancelled);
    }

    /// Validates deadline expiry under paused virtual time.
    ///
    /// Assertions:
    /// - `done()` resolves with `DeadlineExceeded` once time reaches the
    ///   deadline.
    #[tokio::test(start_paused = true)]
    async fn test_timeout_expires() {
        let ctx = Context::background().with_timeout(Duration::from_millis(200));
        assert_eq!(ctx.err(), None);

        assert_eq!(ctx.done().await, CancelReason::DeadlineExceeded);
        assert_eq!(ctx.err(), Some(CancelReason::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_parent_cancel_propagates_to_child() {
        let parent = Context::background();
        let child = parent.child().with_timeout(Duration::from_secs(60));

        parent.cancel();
        assert_eq!(child.done().await, CancelReason::Cancelled);
    }

    /// Validates that cancelling a child leaves its parent live.
    #[test]
    fn test_child_cancel_does_not_reach_parent() {
        let parent = Context::background();
        let child = parent.child();

        child.cancel();
        assert_eq!(child.err(), Some(CancelReason::Cancelled));
        assert_eq!(parent.err(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_keeps_earlier_parent_deadline() {
        let parent = Context::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(30));

        assert_eq!(child.deadline(), parent.deadline());
        assert!(child.remaining().is_some_and(|r| r <= Duration::from_secs(1)));
    }
}
