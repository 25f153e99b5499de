//! Reader loop: polls the device and forwards decoded text.

use super::codec::LossyDecoder;
use super::error::TransportError;
use super::event::TransportEvent;
use crate::port::{PortError, SerialPortAdapter, READ_TIMEOUT};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

const READ_CHUNK: usize = 1024;

pub(crate) struct ReaderLoop {
    port: Box<dyn SerialPortAdapter>,
    running: Arc<AtomicBool>,
    events: Sender<TransportEvent>,
    decoder: LossyDecoder,
    buf: Vec<u8>,
    chunk: Vec<u8>,
}

impl ReaderLoop {
    pub(crate) fn new(
        port: Box<dyn SerialPortAdapter>,
        running: Arc<AtomicBool>,
        events: Sender<TransportEvent>,
    ) -> Self {
        Self {
            port,
            running,
            events,
            decoder: LossyDecoder::new(),
            buf: vec![0; READ_CHUNK],
            chunk: Vec::with_capacity(READ_CHUNK),
        }
    }

    /// Run until the session's running flag is cleared.
    ///
    /// Read failures are reported and the loop keeps going; only `disconnect`
    /// ends a session.
    pub(crate) fn run(mut self) {
        debug!(port = %self.port.name(), "reader loop started");
        while self.running.load(Ordering::Acquire) {
            match self.poll() {
                Ok(0) => {}
                Ok(n) => {
                    trace!(bytes = n, "received");
                    let text = self.decoder.decode(&self.chunk);
                    if !text.is_empty() {
                        let _ = self.events.send(TransportEvent::Data(text));
                    }
                }
                Err(e) => {
                    if !self.running.load(Ordering::Acquire) {
                        break;
                    }
                    warn!(port = %self.port.name(), error = %e, "serial read failed");
                    let _ = self
                        .events
                        .send(TransportEvent::Error(TransportError::Read(e.to_string())));
                    // A vanished device fails instantly; pace the retries.
                    std::thread::sleep(READ_TIMEOUT);
                }
            }
        }

        let tail = self.decoder.finish();
        if !tail.is_empty() {
            let _ = self.events.send(TransportEvent::Data(tail));
        }
        debug!(port = %self.port.name(), "reader loop stopped");
    }

    /// Read everything currently available into `self.chunk`.
    ///
    /// The first read blocks for at most the port timeout; follow-up reads
    /// only drain what the driver already holds.
    fn poll(&mut self) -> Result<usize, PortError> {
        self.chunk.clear();
        match self.port.read_bytes(&mut self.buf) {
            Ok(n) => self.chunk.extend_from_slice(&self.buf[..n]),
            Err(e) if e.is_idle() => return Ok(0),
            Err(e) => return Err(e),
        }

        while let Some(waiting) = self.port.bytes_to_read().filter(|&n| n > 0) {
            let want = waiting.min(self.buf.len());
            match self.port.read_bytes(&mut self.buf[..want]) {
                Ok(0) => break,
                Ok(n) => self.chunk.extend_from_slice(&self.buf[..n]),
                // Keep what we have; a real fault resurfaces on the next poll.
                Err(_) => break,
            }
        }
        Ok(self.chunk.len())
    }
}
