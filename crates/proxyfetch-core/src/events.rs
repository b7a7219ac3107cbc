//! Structured executor events and the sinks that receive them.
//!
//! The executor reports every attempt and every terminal result to an injected
//! [`EventSink`]. No ordering is guaranteed between tasks.

use crate::retry::{ErrorKind, FailureReason};
use serde::Serialize;
use tokio::sync::mpsc;

/// Whether a failed attempt may be followed by another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "class", content = "kind", rename_all = "snake_case")]
pub enum FailureClass {
    Retryable(ErrorKind),
    Fatal,
}

/// Compact terminal state reported in [`ExecutorEvent::TaskTerminal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TerminalState {
    Completed { attempts: u32, body_len: usize },
    Failed { reason: FailureReason, attempts_made: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutorEvent {
    AttemptStarted {
        task_id: usize,
        attempt: u32,
    },
    AttemptSucceeded {
        task_id: usize,
        attempt: u32,
    },
    AttemptFailed {
        task_id: usize,
        attempt: u32,
        classification: FailureClass,
        reason: FailureReason,
    },
    TaskTerminal {
        task_id: usize,
        result: TerminalState,
    },
}

impl ExecutorEvent {
    pub fn task_id(&self) -> usize {
        match self {
            ExecutorEvent::AttemptStarted { task_id, .. }
            | ExecutorEvent::AttemptSucceeded { task_id, .. }
            | ExecutorEvent::AttemptFailed { task_id, .. }
            | ExecutorEvent::TaskTerminal { task_id, .. } => *task_id,
        }
    }
}

/// Receives executor events. Must not block: it is called from inside the
/// per-task futures.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ExecutorEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ExecutorEvent) {}
}

/// Logs events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: ExecutorEvent) {
        match event {
            ExecutorEvent::AttemptStarted { task_id, attempt } => {
                tracing::debug!(task_id, attempt, "attempt started");
            }
            ExecutorEvent::AttemptSucceeded { task_id, attempt } => {
                tracing::debug!(task_id, attempt, "attempt succeeded");
            }
            ExecutorEvent::AttemptFailed {
                task_id,
                attempt,
                classification,
                reason,
            } => match classification {
                FailureClass::Retryable(kind) => {
                    tracing::warn!(task_id, attempt, ?kind, reason = %reason, "attempt failed, retryable");
                }
                FailureClass::Fatal => {
                    tracing::warn!(task_id, attempt, reason = %reason, "attempt failed");
                }
            },
            ExecutorEvent::TaskTerminal { task_id, result } => match result {
                TerminalState::Completed { attempts, body_len } => {
                    tracing::info!(task_id, attempts, body_len, "task completed");
                }
                TerminalState::Failed {
                    reason,
                    attempts_made,
                } => {
                    tracing::error!(task_id, attempts_made, reason = %reason, "task failed");
                }
            },
        }
    }
}

/// Forwards events to a channel; a closed receiver silently drops them.
impl EventSink for mpsc::UnboundedSender<ExecutorEvent> {
    fn emit(&self, event: ExecutorEvent) {
        let _ = self.send(event);
    }
}
