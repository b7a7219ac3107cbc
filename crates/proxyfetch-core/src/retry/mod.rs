//! Retry and backoff policy.
//!
//! Error classification (status codes, timeouts, connection failures) and the
//! exponential backoff decision live here so the executor's retry loop only
//! has to act on them.

mod classify;
mod error;
mod policy;

pub use classify::{
    classify, classify_http_status, classify_transport_error, AttemptOutcome, StatusClass,
};
pub use error::FailureReason;
pub use policy::{BackoffPolicy, ErrorKind};
