//! Scripted in-memory transport and recording sink for executor tests.
//!
//! Replies are scripted per URL and consumed in order; once a script runs
//! out, the default reply is used. Latency is simulated with tokio's clock so
//! tests can run with a paused runtime.

use async_trait::async_trait;
use proxyfetch_core::events::{EventSink, ExecutorEvent};
use proxyfetch_core::transport::{Response, Transport, TransportError};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16),
    Fail(TransportError),
    /// Never answers; only a timeout or cancellation ends the call.
    Hang,
}

pub struct ScriptedTransport {
    default: Reply,
    latency: Duration,
    latency_for: HashMap<String, Duration>,
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, Instant)>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(default: Reply) -> Self {
        Self {
            default,
            latency: Duration::ZERO,
            latency_for: HashMap::new(),
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn latency_for(mut self, url: &str, latency: Duration) -> Self {
        self.latency_for.insert(url.to_string(), latency);
        self
    }

    pub fn script(self, url: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), replies.into());
        self
    }

    /// Instants at which `url` was sent, in order.
    pub fn calls_for(&self, url: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn next_reply(&self, url: &str) -> Reply {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.default.clone())
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, url: &Url, _timeout: Duration) -> Result<Response, TransportError> {
        let key = url.as_str().to_string();
        self.calls.lock().unwrap().push((key.clone(), Instant::now()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let reply = self.next_reply(&key);
        let latency = self.latency_for.get(&key).copied().unwrap_or(self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match reply {
            Reply::Status(status) => Ok(Response {
                status,
                body: format!("{} {}", key, status).into_bytes(),
            }),
            Reply::Fail(e) => Err(e),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// Sink that keeps every event for later inspection.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ExecutorEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ExecutorEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn events_for(&self, task_id: usize) -> Vec<ExecutorEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.task_id() == task_id)
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: ExecutorEvent) {
        self.events.lock().unwrap().push(event);
    }
}
