//! Batch-level configuration errors, detected before any task starts.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("request timeout must be non-zero")]
    ZeroTimeout,
    #[error("retry policy must allow at least one attempt")]
    ZeroAttempts,
    #[error("minimum backoff delay {min:?} exceeds maximum {max:?}")]
    DelayBounds { min: Duration, max: Duration },
    #[error("target #{index} ({url:?}) is not a valid HTTP(S) URL: {reason}")]
    InvalidTarget {
        index: usize,
        url: String,
        reason: String,
    },
    #[error("task at position {position} has id {id}; ids must match submission order")]
    TaskOrder { position: usize, id: usize },
}
