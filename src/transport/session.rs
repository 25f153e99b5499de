//! One open connection: the device handle, the running flag and its workers.

use super::error::{TransportError, TransportResult};
use super::event::TransportEvent;
use super::queue::OutboundQueue;
use super::reader::ReaderLoop;
use super::writer::WriterLoop;
use crate::port::SerialPortAdapter;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// An active connection.
///
/// While `running` is set the handle is present and both loops are alive.
/// Dropping the session (or calling [`PortSession::close`]) clears the flag,
/// releases the handle and waits for both loops to exit.
#[derive(Debug)]
pub struct PortSession {
    port_name: String,
    baud_rate: u32,
    handle: Option<Box<dyn SerialPortAdapter>>,
    running: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

impl PortSession {
    /// Take ownership of an opened device and start the reader and writer loops.
    pub(crate) fn start(
        handle: Box<dyn SerialPortAdapter>,
        baud_rate: u32,
        queue: OutboundQueue,
        events: Sender<TransportEvent>,
    ) -> TransportResult<Self> {
        let port_name = handle.name().to_string();
        let clone_err = |e: crate::port::PortError| TransportError::OpenFailed {
            port: port_name.clone(),
            reason: e.to_string(),
        };
        let reader_port = handle.try_clone_adapter().map_err(clone_err)?;
        let writer_port = handle.try_clone_adapter().map_err(clone_err)?;

        let mut session = Self {
            port_name: port_name.clone(),
            baud_rate,
            handle: Some(handle),
            running: Arc::new(AtomicBool::new(true)),
            reader: None,
            writer: None,
        };

        // On failure `session` drops here, which stops whatever did start.
        let reader = ReaderLoop::new(reader_port, session.running.clone(), events.clone());
        session.reader = Some(spawn_worker("reader", move || reader.run())?);

        let writer = WriterLoop::new(writer_port, session.running.clone(), queue, events);
        session.writer = Some(spawn_worker("writer", move || writer.run())?);

        Ok(session)
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Running, holding a handle, and the device still reports itself open.
    pub fn is_open(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.handle.as_ref().is_some_and(|h| h.is_open())
    }

    /// Stop both loops and release the device.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        self.handle = None;
        for (worker, handle) in [("reader", self.reader.take()), ("writer", self.writer.take())] {
            if let Some(handle) = handle {
                if handle.join().is_err() {
                    error!(port = %self.port_name, worker, "worker thread panicked");
                }
            }
        }
        debug!(port = %self.port_name, "session closed");
    }
}

impl Drop for PortSession {
    fn drop(&mut self) {
        if self.reader.is_some() || self.writer.is_some() || self.handle.is_some() {
            self.shutdown();
        }
    }
}

fn spawn_worker<F>(worker: &'static str, body: F) -> TransportResult<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(format!("gdiags-{worker}"))
        .spawn(body)
        .map_err(|e| TransportError::Spawn {
            worker,
            reason: e.to_string(),
        })
}
