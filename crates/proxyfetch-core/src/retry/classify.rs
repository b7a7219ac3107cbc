//! Classify HTTP statuses and transport errors into attempt outcomes.

use super::error::FailureReason;
use super::policy::ErrorKind;
use crate::transport::{Response, TransportError, TransportErrorKind};

/// Result of one attempt, as seen by the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success { body: Vec<u8> },
    Retryable { kind: ErrorKind, reason: FailureReason },
    Fatal { reason: FailureReason },
}

impl AttemptOutcome {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AttemptOutcome::Retryable { .. })
    }
}

/// Coarse class of an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Retryable(ErrorKind),
    Fatal,
}

/// Classify an HTTP status.
///
/// Anything below 400 counts as success (redirects are followed by the
/// transport); 5xx is retryable and 4xx is not.
pub fn classify_http_status(code: u16) -> StatusClass {
    match code {
        0..=399 => StatusClass::Success,
        400..=499 => StatusClass::Fatal,
        _ => StatusClass::Retryable(ErrorKind::ServerError(code)),
    }
}

/// Classify a transport error. `extra_retryable` whitelists normally-fatal kinds.
///
/// Timeouts and connection failures are always retryable; an aborted
/// transfer never is.
pub fn classify_transport_error(
    e: &TransportError,
    extra_retryable: &[TransportErrorKind],
) -> Option<ErrorKind> {
    match e.kind() {
        TransportErrorKind::Timeout => Some(ErrorKind::Timeout),
        TransportErrorKind::Connection => Some(ErrorKind::Connection),
        TransportErrorKind::Aborted => None,
        kind @ (TransportErrorKind::Malformed | TransportErrorKind::Other) => {
            extra_retryable.contains(&kind).then_some(ErrorKind::Whitelisted)
        }
    }
}

/// Classify the result of one `Transport::send` call.
pub fn classify(
    result: Result<Response, TransportError>,
    extra_retryable: &[TransportErrorKind],
) -> AttemptOutcome {
    match result {
        Ok(resp) => match classify_http_status(resp.status) {
            StatusClass::Success => AttemptOutcome::Success { body: resp.body },
            StatusClass::Retryable(kind) => AttemptOutcome::Retryable {
                kind,
                reason: FailureReason::Http(resp.status),
            },
            StatusClass::Fatal => AttemptOutcome::Fatal {
                reason: FailureReason::Http(resp.status),
            },
        },
        Err(e) => match classify_transport_error(&e, extra_retryable) {
            Some(kind) => AttemptOutcome::Retryable {
                kind,
                reason: e.into(),
            },
            None => AttemptOutcome::Fatal { reason: e.into() },
        },
    }
}
