//! Concurrency gate: caps how many tasks of one batch execute at once.
//!
//! Tasks acquire a slot before sending and release it by dropping the
//! returned [`GateSlot`]. Waiters are admitted in FIFO order and are never
//! dropped; closing the gate wakes every waiter with [`GateClosed`].

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Semaphore, SemaphorePermit};

/// Returned by [`ConcurrencyGate::acquire`] once the gate has been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("concurrency gate closed")]
pub struct GateClosed;

/// Counting admission control with a fixed capacity.
#[derive(Debug)]
pub struct ConcurrencyGate {
    capacity: usize,
    semaphore: Semaphore,
    in_use: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyGate {
    /// Create a gate with `capacity` slots (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            semaphore: Semaphore::new(capacity),
            in_use: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently held.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    /// Highest number of slots ever held at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    /// Wait for a free slot. Suspends only the calling task.
    pub async fn acquire(&self) -> Result<GateSlot<'_>, GateClosed> {
        let permit = self.semaphore.acquire().await.map_err(|_| GateClosed)?;
        let now = self.in_use.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        Ok(GateSlot {
            gate: self,
            _permit: permit,
        })
    }

    /// Close the gate: pending and future `acquire` calls fail. Slots already
    /// held stay valid until dropped.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }
}

/// One held slot; released when dropped.
#[derive(Debug)]
pub struct GateSlot<'a> {
    gate: &'a ConcurrencyGate,
    _permit: SemaphorePermit<'a>,
}

impl Drop for GateSlot<'_> {
    fn drop(&mut self) {
        // Runs before the permit field is dropped, so in_use never overshoots.
        self.gate.in_use.fetch_sub(1, Ordering::AcqRel);
    }
}
