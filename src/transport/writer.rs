//! Writer loop: drains the outbound queue onto the device.

use super::codec;
use super::error::TransportError;
use super::event::TransportEvent;
use super::queue::OutboundQueue;
use crate::port::SerialPortAdapter;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// How long one dequeue attempt waits; bounds the loop's reaction to disconnect.
pub const WRITE_POLL: Duration = Duration::from_millis(100);

pub(crate) struct WriterLoop {
    port: Box<dyn SerialPortAdapter>,
    running: Arc<AtomicBool>,
    queue: OutboundQueue,
    events: Sender<TransportEvent>,
}

impl WriterLoop {
    pub(crate) fn new(
        port: Box<dyn SerialPortAdapter>,
        running: Arc<AtomicBool>,
        queue: OutboundQueue,
        events: Sender<TransportEvent>,
    ) -> Self {
        Self {
            port,
            running,
            queue,
            events,
        }
    }

    /// Run until the session's running flag is cleared.
    ///
    /// Delivery is at-most-once: a payload whose write fails is reported and
    /// dropped, never re-queued.
    pub(crate) fn run(mut self) {
        debug!(port = %self.port.name(), "writer loop started");
        while self.running.load(Ordering::Acquire) {
            let Some(item) = self.queue.get(WRITE_POLL) else {
                continue;
            };
            if !self.running.load(Ordering::Acquire) {
                debug!("session closing; dropping dequeued item");
                break;
            }
            let bytes = codec::encode(&item);
            match self.port.write_all_bytes(&bytes) {
                Ok(()) => trace!(bytes = bytes.len(), "sent"),
                Err(e) => {
                    warn!(port = %self.port.name(), error = %e, "serial write failed");
                    let _ = self
                        .events
                        .send(TransportEvent::Error(TransportError::Write(e.to_string())));
                }
            }
        }
        debug!(port = %self.port.name(), "writer loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockSerialPort;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_failed_write_is_reported_and_dropped() {
        let port = MockSerialPort::new("MOCK0");
        port.fail_writes(1);
        let queue = OutboundQueue::new(4);
        let running = Arc::new(AtomicBool::new(true));
        let (tx, rx) = unbounded();

        queue.put("lost".into(), WRITE_POLL).unwrap();
        queue.put("kept".into(), WRITE_POLL).unwrap();

        let writer = WriterLoop::new(Box::new(port.clone()), running.clone(), queue, tx);
        let handle = std::thread::spawn(move || writer.run());

        assert!(port.wait_for_writes(1, Duration::from_secs(2)));
        running.store(false, Ordering::Release);
        handle.join().unwrap();

        assert_eq!(port.written_text(), "kept");
        assert!(matches!(
            rx.try_recv(),
            Ok(TransportEvent::Error(TransportError::Write(_)))
        ));
    }
}
