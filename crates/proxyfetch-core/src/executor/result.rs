//! Per-task and per-batch results.

use crate::events::TerminalState;
use crate::retry::FailureReason;

/// Final state of one task. Written exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    Completed { body: Vec<u8>, attempts: u32 },
    Failed { reason: FailureReason, attempts_made: u32 },
}

impl TaskResult {
    pub(super) fn cancelled(attempts_made: u32) -> Self {
        TaskResult::Failed {
            reason: FailureReason::Cancelled,
            attempts_made,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskResult::Completed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskResult::Failed { reason, .. } if reason.is_cancelled())
    }

    /// Attempts issued against the transport for this task.
    pub fn attempts(&self) -> u32 {
        match self {
            TaskResult::Completed { attempts, .. } => *attempts,
            TaskResult::Failed { attempts_made, .. } => *attempts_made,
        }
    }

    pub fn body(&self) -> Option<&[u8]> {
        match self {
            TaskResult::Completed { body, .. } => Some(body),
            TaskResult::Failed { .. } => None,
        }
    }

    pub fn terminal_state(&self) -> TerminalState {
        match self {
            TaskResult::Completed { body, attempts } => TerminalState::Completed {
                attempts: *attempts,
                body_len: body.len(),
            },
            TaskResult::Failed {
                reason,
                attempts_made,
            } => TerminalState::Failed {
                reason: reason.clone(),
                attempts_made: *attempts_made,
            },
        }
    }
}

/// One result per submitted task, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    results: Vec<TaskResult>,
}

impl BatchResult {
    pub(super) fn new(results: Vec<TaskResult>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result of the task submitted at position `index`.
    pub fn get(&self, index: usize) -> Option<&TaskResult> {
        self.results.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TaskResult> {
        self.results.iter()
    }

    pub fn completed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_completed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.completed_count()
    }

    pub fn cancelled_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_cancelled()).count()
    }

    pub fn all_completed(&self) -> bool {
        self.results.iter().all(TaskResult::is_completed)
    }

    pub fn into_results(self) -> Vec<TaskResult> {
        self.results
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a TaskResult;
    type IntoIter = std::slice::Iter<'a, TaskResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
