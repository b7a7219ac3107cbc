//! Why an attempt (and ultimately a task) failed.

use crate::transport::TransportError;
use serde::Serialize;
use std::fmt;

/// Failure reason carried by a failed attempt and by `TaskResult::Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Server answered with a status that is not a success.
    Http(u16),
    /// No usable response (timeout, connection, malformed, ...).
    Transport(TransportError),
    /// The batch was cancelled before this task reached a terminal state.
    Cancelled,
}

impl FailureReason {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FailureReason::Cancelled)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Http(code) => write!(f, "HTTP {}", code),
            FailureReason::Transport(e) => write!(f, "{}", e),
            FailureReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl Serialize for FailureReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<TransportError> for FailureReason {
    fn from(e: TransportError) -> Self {
        FailureReason::Transport(e)
    }
}
