//! libcurl transport: one GET per call, tunneled through the configured proxy.
//!
//! libcurl is blocking, so each transfer runs on tokio's blocking pool. The
//! transfer polls an abort flag from its progress callback; the flag is set
//! when the `send` future is dropped (timeout or batch cancellation).

use super::{Response, Transport, TransportError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Where and as whom to connect to the upstream proxy.
#[derive(Clone)]
pub struct ProxySettings {
    /// `scheme://host:port`, without credentials.
    pub endpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for ProxySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxySettings")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Production [`Transport`] backed by the curl crate.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    proxy: ProxySettings,
    connect_timeout: Duration,
    user_agent: String,
}

impl CurlTransport {
    pub fn new(proxy: ProxySettings) -> Self {
        Self {
            proxy,
            connect_timeout: Duration::from_secs(15),
            user_agent: format!("proxyfetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Cap on the TCP/TLS handshake (to the proxy) per attempt. Never exceeds
    /// the request timeout.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn proxy(&self) -> &ProxySettings {
        &self.proxy
    }
}

/// Sets the abort flag when dropped so an abandoned transfer stops promptly.
struct AbortOnDrop(Arc<AtomicBool>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

#[async_trait]
impl Transport for CurlTransport {
    async fn send(&self, url: &Url, timeout: Duration) -> Result<Response, TransportError> {
        let abort = Arc::new(AtomicBool::new(false));
        let _abort_guard = AbortOnDrop(Arc::clone(&abort));

        let url = url.as_str().to_owned();
        let proxy = self.proxy.clone();
        let user_agent = self.user_agent.clone();
        let connect_timeout = self.connect_timeout.min(timeout);

        let handle = tokio::task::spawn_blocking(move || {
            perform_get(&url, &proxy, &user_agent, timeout, connect_timeout, &abort)
        });
        match handle.await {
            Ok(result) => result,
            Err(e) => Err(TransportError::Other(format!("transfer task failed: {}", e))),
        }
    }
}

fn perform_get(
    url: &str,
    proxy: &ProxySettings,
    user_agent: &str,
    timeout: Duration,
    connect_timeout: Duration,
    abort: &AtomicBool,
) -> Result<Response, TransportError> {
    let setup = |e: curl::Error| TransportError::Other(format!("curl setup: {}", e));
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(setup)?;
    easy.proxy(&proxy.endpoint).map_err(setup)?;
    if let Some(username) = &proxy.username {
        easy.proxy_username(username).map_err(setup)?;
    }
    if let Some(password) = &proxy.password {
        easy.proxy_password(password).map_err(setup)?;
    }
    easy.useragent(user_agent).map_err(setup)?;
    easy.follow_location(true).map_err(setup)?;
    easy.max_redirections(10).map_err(setup)?;
    easy.connect_timeout(connect_timeout).map_err(setup)?;
    easy.timeout(timeout).map_err(setup)?;
    easy.progress(true).map_err(setup)?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(setup)?;
        transfer
            .progress_function(|_, _, _, _| !abort.load(Ordering::Relaxed))
            .map_err(setup)?;
        transfer.perform()
    };
    if let Err(e) = performed {
        // HTTPS targets go through a CONNECT tunnel; a refused CONNECT is an
        // HTTP answer from the proxy, not a network failure.
        if let Some(status) = refused_tunnel_status(easy.http_connectcode().unwrap_or(0)) {
            return Ok(Response {
                status,
                body: Vec::new(),
            });
        }
        return Err(map_curl_error(&e, timeout));
    }

    let code = easy.response_code().map_err(setup)?;
    if code == 0 {
        return Err(TransportError::Malformed("no HTTP status received".to_string()));
    }
    let status = u16::try_from(code)
        .map_err(|_| TransportError::Malformed(format!("invalid HTTP status {}", code)))?;
    Ok(Response { status, body })
}

/// Status of a CONNECT the proxy answered with 4xx/5xx, if any.
fn refused_tunnel_status(connect_code: u32) -> Option<u16> {
    if connect_code < 400 {
        return None;
    }
    u16::try_from(connect_code).ok()
}

/// Map a libcurl failure onto the transport error taxonomy.
pub(crate) fn map_curl_error(e: &curl::Error, timeout: Duration) -> TransportError {
    if e.is_operation_timedout() {
        return TransportError::Timeout(timeout);
    }
    if e.is_aborted_by_callback() {
        return TransportError::Aborted;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_ssl_connect_error()
    {
        return TransportError::Connection(e.to_string());
    }
    if e.is_partial_file() || e.is_bad_content_encoding() || e.is_http2_error() {
        return TransportError::Malformed(e.to_string());
    }
    TransportError::Other(e.to_string())
}
