//! Bounded-wait FIFO between `Transport::send` and the writer loop.

use super::error::{TransportError, TransportResult};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use std::time::Duration;

/// Default number of items the queue holds before `put` starts waiting.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// FIFO of outbound text payloads.
///
/// Clones share the same underlying channel; the transport keeps one and the
/// writer loop of the active session holds another.
#[derive(Debug, Clone)]
pub struct OutboundQueue {
    tx: Sender<String>,
    rx: Receiver<String>,
    capacity: usize,
}

impl OutboundQueue {
    /// Create a queue holding at most `capacity` items (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = bounded(capacity);
        Self { tx, rx, capacity }
    }

    /// Append `item`, waiting up to `max_wait` for room.
    pub fn put(&self, item: String, max_wait: Duration) -> TransportResult<()> {
        self.tx.send_timeout(item, max_wait).map_err(|e| match e {
            SendTimeoutError::Timeout(_) => TransportError::QueueTimeout(max_wait),
            SendTimeoutError::Disconnected(_) => TransportError::QueueClosed,
        })
    }

    /// Take the oldest item, waiting up to `max_wait`.
    ///
    /// `None` means nothing arrived in time; callers simply poll again.
    pub fn get(&self, max_wait: Duration) -> Option<String> {
        match self.rx.recv_timeout(max_wait) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drop every queued item, returning how many were discarded.
    pub fn purge(&self) -> usize {
        self.rx.try_iter().count()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for OutboundQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
