//! Proxy-aware HTTP transport.
//!
//! The executor only sees the [`Transport`] trait; [`CurlTransport`] is the
//! production implementation routing every request through one proxy.

mod libcurl;

pub use libcurl::{CurlTransport, ProxySettings};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Transfer-level failure: no usable HTTP response was obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("transfer aborted")]
    Aborted,
    #[error("{0}")]
    Other(String),
}

/// Coarse kind of a [`TransportError`], used to whitelist normally-fatal
/// errors for retry in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportErrorKind {
    Timeout,
    Connection,
    Malformed,
    Aborted,
    Other,
}

impl TransportError {
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            TransportError::Timeout(_) => TransportErrorKind::Timeout,
            TransportError::Connection(_) => TransportErrorKind::Connection,
            TransportError::Malformed(_) => TransportErrorKind::Malformed,
            TransportError::Aborted => TransportErrorKind::Aborted,
            TransportError::Other(_) => TransportErrorKind::Other,
        }
    }
}

/// Sends one GET through the configured proxy.
///
/// Implementations are shared by every task of a batch and must not mutate
/// their configuration while a batch runs. Dropping the returned future must
/// stop the underlying transfer.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, url: &Url, timeout: Duration) -> Result<Response, TransportError>;
}
