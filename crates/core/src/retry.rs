//! Retry policy for slide visual generation.
//!
//! Failures are classified once at the boundary and the policy is consulted
//! by the executor, instead of scattering try/retry calls through the job
//! itself. Attempts are 0-based: attempt 0 is the first try, so a policy
//! with `max_retries = 3` runs at most 4 times.

use std::time::Duration;

/// How a generation failure should be treated by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Provider rate limiting. Retried with exponential backoff.
    RateLimited,
    /// Provider connectivity or API errors. Retried with a flat delay.
    Transient,
    /// Database error during the final persist step. Retried with a short
    /// flat delay.
    Persistence,
    /// Missing records, unusable output, unclassified faults. Never retried.
    Permanent,
}

impl FailureKind {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FailureKind::Permanent)
    }
}

/// What the executor should do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait for the given delay, then re-run the job.
    RetryAfter(Duration),
    /// No further attempts.
    GiveUp,
}

/// Base delay for rate-limit backoff.
const RATE_LIMIT_BASE_SECS: u64 = 60;
/// Ceiling for rate-limit backoff.
const RATE_LIMIT_CAP_SECS: u64 = 600;
/// Flat delay for transient provider errors.
const TRANSIENT_DELAY_SECS: u64 = 30;
/// Flat delay for persist-step database errors.
const PERSISTENCE_DELAY_SECS: u64 = 15;

/// Bounded retry policy consulted by the job executor.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of re-runs after the initial attempt.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

impl RetryPolicy {
    /// Decide what to do after `kind` failed on 0-based `attempt`.
    pub fn decide(&self, kind: FailureKind, attempt: u32) -> RetryDecision {
        if !kind.is_retryable() || attempt >= self.max_retries {
            return RetryDecision::GiveUp;
        }
        RetryDecision::RetryAfter(backoff_delay(kind, attempt))
    }
}

/// Backoff delay for a retryable failure on 0-based `attempt`.
///
/// Rate limits back off exponentially (`60 * 2^attempt`, capped at 600 s);
/// other transient errors wait a flat 30 s; persist-step database errors
/// wait a flat 15 s.
pub fn backoff_delay(kind: FailureKind, attempt: u32) -> Duration {
    let secs = match kind {
        FailureKind::RateLimited => {
            let exp = RATE_LIMIT_BASE_SECS.saturating_mul(1u64 << attempt.min(16));
            exp.min(RATE_LIMIT_CAP_SECS)
        }
        FailureKind::Transient => TRANSIENT_DELAY_SECS,
        FailureKind::Persistence => PERSISTENCE_DELAY_SECS,
        FailureKind::Permanent => 0,
    };
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(FailureKind::RateLimited, 0).as_secs(), 60);
        assert_eq!(backoff_delay(FailureKind::RateLimited, 1).as_secs(), 120);
        assert_eq!(backoff_delay(FailureKind::RateLimited, 2).as_secs(), 240);
        assert_eq!(backoff_delay(FailureKind::RateLimited, 3).as_secs(), 480);
        assert_eq!(backoff_delay(FailureKind::RateLimited, 4).as_secs(), 600);
        assert_eq!(backoff_delay(FailureKind::RateLimited, 60).as_secs(), 600);
    }

    #[test]
    fn transient_and_persistence_delays_are_flat() {
        for attempt in 0..3 {
            assert_eq!(backoff_delay(FailureKind::Transient, attempt).as_secs(), 30);
            assert_eq!(
                backoff_delay(FailureKind::Persistence, attempt).as_secs(),
                15
            );
        }
    }

    #[test]
    fn permanent_failures_never_retry() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(FailureKind::Permanent, 0),
            RetryDecision::GiveUp
        );
    }

    #[test]
    fn retries_are_bounded() {
        let policy = RetryPolicy::default();
        assert!(matches!(
            policy.decide(FailureKind::RateLimited, 2),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(
            policy.decide(FailureKind::RateLimited, 3),
            RetryDecision::GiveUp
        );
    }
}
