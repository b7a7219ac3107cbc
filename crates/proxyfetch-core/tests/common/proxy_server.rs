//! Minimal HTTP/1.1 forward proxy for integration tests.
//!
//! Accepts absolute-form requests (`GET http://origin.test/ok HTTP/1.1`),
//! checks `Proxy-Authorization` (407 on mismatch, including `CONNECT`) and
//! answers directly instead of forwarding:
//!
//! - `/ok`: 200 with body `hello via proxy`
//! - `/missing`: 404
//! - `/flaky`: 503 for the first two hits, then 200 `recovered`
//! - `/slow`: 200 after a 3 second pause

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Handle to a running proxy; the server lives until the process exits.
#[derive(Clone)]
pub struct ProxyServer {
    pub endpoint: String,
    request_lines: Arc<Mutex<Vec<String>>>,
}

impl ProxyServer {
    pub fn request_lines(&self) -> Vec<String> {
        self.request_lines.lock().unwrap().clone()
    }
}

/// Start a proxy expecting `Proxy-Authorization: <expected_auth>`.
pub fn start(expected_auth: &str) -> ProxyServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let request_lines = Arc::new(Mutex::new(Vec::new()));
    let flaky_hits = Arc::new(AtomicUsize::new(0));
    let expected_auth = expected_auth.to_string();

    let lines = Arc::clone(&request_lines);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let lines = Arc::clone(&lines);
            let flaky_hits = Arc::clone(&flaky_hits);
            let expected_auth = expected_auth.clone();
            thread::spawn(move || handle(stream, &expected_auth, &lines, &flaky_hits));
        }
    });

    ProxyServer {
        endpoint: format!("http://127.0.0.1:{}", port),
        request_lines,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    expected_auth: &str,
    lines: &Mutex<Vec<String>>,
    flaky_hits: &AtomicUsize,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let request = String::from_utf8_lossy(&buf).to_string();
    let mut header_lines = request.lines();
    let request_line = header_lines.next().unwrap_or("").to_string();
    lines.lock().unwrap().push(request_line.clone());

    let auth = header_lines
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("proxy-authorization"))
        .map(|(_, value)| value.trim().to_string());
    if auth.as_deref() != Some(expected_auth) {
        respond(
            &mut stream,
            "407 Proxy Authentication Required",
            "Proxy-Authenticate: Basic realm=\"test\"\r\n",
            b"",
        );
        return;
    }

    let target = request_line.split_whitespace().nth(1).unwrap_or("");
    let path = target
        .strip_prefix("http://")
        .and_then(|rest| rest.find('/').map(|i| &rest[i..]))
        .unwrap_or(target);
    match path {
        "/ok" => respond(&mut stream, "200 OK", "", b"hello via proxy"),
        "/missing" => respond(&mut stream, "404 Not Found", "", b"nope"),
        "/flaky" => {
            if flaky_hits.fetch_add(1, Ordering::SeqCst) < 2 {
                respond(&mut stream, "503 Service Unavailable", "", b"busy");
            } else {
                respond(&mut stream, "200 OK", "", b"recovered");
            }
        }
        "/slow" => {
            thread::sleep(Duration::from_secs(3));
            respond(&mut stream, "200 OK", "", b"late");
        }
        _ => respond(&mut stream, "404 Not Found", "", b""),
    }
}

fn respond(stream: &mut std::net::TcpStream, status: &str, extra_headers: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n",
        status,
        body.len(),
        extra_headers
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}
