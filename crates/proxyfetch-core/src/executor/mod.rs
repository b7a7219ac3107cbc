//! Request executor: runs a batch of fetch tasks under a concurrency gate,
//! retrying transient failures per the backoff policy.
//!
//! Results come back index-aligned with the submitted tasks regardless of
//! completion order. Per-task failures never surface as `Err`; only
//! [`ConfigError`] does, and only before any task starts.

mod error;
mod result;
mod task;

pub use error::ConfigError;
pub use result::{BatchResult, TaskResult};

use crate::events::EventSink;
use crate::gate::ConcurrencyGate;
use crate::retry::BackoffPolicy;
use crate::transport::{Transport, TransportErrorKind};
use futures::future::join_all;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use task::{run_task, TaskContext};

/// One URL to fetch, identified by its position in the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    pub id: usize,
    pub url: Url,
}

impl FetchTask {
    /// Build the tasks for a batch, ids following input order. Rejects
    /// anything that is not an absolute http(s) URL.
    pub fn batch<S: AsRef<str>>(urls: &[S]) -> Result<Vec<FetchTask>, ConfigError> {
        urls.iter()
            .enumerate()
            .map(|(index, raw)| {
                let raw = raw.as_ref().trim();
                let invalid = |reason: String| ConfigError::InvalidTarget {
                    index,
                    url: raw.to_string(),
                    reason,
                };
                let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
                match url.scheme() {
                    "http" | "https" => Ok(FetchTask { id: index, url }),
                    other => Err(invalid(format!("unsupported scheme {:?}", other))),
                }
            })
            .collect()
    }
}

/// Whether a task keeps its gate slot while sleeping between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotPolicy {
    /// Give the slot back during backoff and re-acquire before the next
    /// attempt, so queued tasks can run meanwhile.
    #[default]
    ReleaseDuringBackoff,
    /// Hold the slot across every attempt of the task, backoff included.
    HoldDuringBackoff,
}

/// Batch-level parameters.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum number of tasks executing at once.
    pub concurrency: usize,
    pub policy: BackoffPolicy,
    /// Timeout for each individual attempt.
    pub request_timeout: Duration,
    pub slot_policy: SlotPolicy,
    /// Transport error kinds retried even though they are normally fatal.
    pub extra_retryable: Vec<TransportErrorKind>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 10,
            policy: BackoffPolicy::default(),
            request_timeout: Duration::from_secs(30),
            slot_policy: SlotPolicy::default(),
            extra_retryable: Vec::new(),
        }
    }
}

impl BatchOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.policy.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.policy.min_delay > self.policy.max_delay {
            return Err(ConfigError::DelayBounds {
                min: self.policy.min_delay,
                max: self.policy.max_delay,
            });
        }
        Ok(())
    }
}

/// Run every task to a terminal result and return them in submission order.
///
/// The gate is created here and lives only for this call. Cancelling `cancel`
/// stops queued, in-flight and backing-off tasks promptly; each of them ends
/// as `Failed { Cancelled }` while already-terminal results are kept.
pub async fn execute_batch(
    tasks: &[FetchTask],
    options: &BatchOptions,
    transport: &dyn Transport,
    sink: &dyn EventSink,
    cancel: &CancellationToken,
) -> Result<BatchResult, ConfigError> {
    options.validate()?;
    for (position, task) in tasks.iter().enumerate() {
        if task.id != position {
            return Err(ConfigError::TaskOrder {
                position,
                id: task.id,
            });
        }
    }

    let gate = ConcurrencyGate::new(options.concurrency);
    let ctx = TaskContext {
        gate: &gate,
        options,
        transport,
        sink,
        cancel,
    };

    tracing::info!(
        tasks = tasks.len(),
        concurrency = options.concurrency,
        max_attempts = options.policy.max_attempts,
        "batch started"
    );

    let results = join_all(tasks.iter().map(|task| run_task(&ctx, task))).await;
    let batch = BatchResult::new(results);

    tracing::info!(
        completed = batch.completed_count(),
        failed = batch.failed_count(),
        cancelled = batch.cancelled_count(),
        peak_in_flight = gate.peak(),
        "batch finished"
    );
    Ok(batch)
}
