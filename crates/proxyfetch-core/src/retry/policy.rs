use serde::Serialize;
use std::time::Duration;

/// Why a failed attempt is considered transient.
///
/// Only retryable failures carry a kind; fatal failures never reach the
/// backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Attempt exceeded the per-request timeout.
    Timeout,
    /// Network-level failure (proxy unreachable, connection reset, DNS).
    Connection,
    /// Server answered with a 5xx status.
    ServerError(u16),
    /// Transport error that is normally fatal but was whitelisted in config.
    Whitelisted,
}

/// Exponential backoff bounded above and below.
///
/// Pure: computing a delay never sleeps or reads a clock, so the policy can be
/// tested without any runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each later attempt.
    pub base_delay: Duration,
    /// Lower bound on any delay.
    pub min_delay: Duration,
    /// Upper bound on any delay.
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl BackoffPolicy {
    /// Delay to wait after retryable failure number `attempt` (1-based), or
    /// `None` when the attempt budget is spent.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(self.raw_delay(attempt).max(self.min_delay).min(self.max_delay))
    }

    /// `base * 2^(attempt-1)` in nanoseconds, saturating at `Duration::MAX`.
    fn raw_delay(&self, attempt: u32) -> Duration {
        let factor = 1u128
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u128::MAX);
        let nanos = self.base_delay.as_nanos().saturating_mul(factor);
        match u64::try_from(nanos / 1_000_000_000) {
            Ok(secs) => Duration::new(secs, (nanos % 1_000_000_000) as u32),
            Err(_) => Duration::MAX,
        }
    }

    /// True if no retry is ever issued (first failure is terminal).
    pub fn is_single_shot(&self) -> bool {
        self.max_attempts <= 1
    }
}
