//! The transport facade.

use super::error::{TransportError, TransportResult};
use super::event::{TransportEvent, TransportObserver};
use super::queue::OutboundQueue;
use super::session::PortSession;
use super::TransportOptions;
use crate::port::{PortConfiguration, PortOpener, SystemPortOpener, DEFAULT_BAUD_RATE};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Bidirectional bridge between a command stream and one serial port.
///
/// All methods are meant to be called from a single owning context. Worker
/// threads report back exclusively through [`TransportEvent`]s, which the
/// owner drains with [`Transport::events`] or [`Transport::drain_events`].
///
/// # Example
/// ```
/// use gdiags::port::MockPortOpener;
/// use gdiags::transport::{Transport, TransportEvent, TransportOptions};
///
/// let opener = MockPortOpener::new();
/// let device = opener.add_port("/dev/ttyMOCK0");
/// let mut transport = Transport::with_opener(opener, TransportOptions::default());
///
/// transport.connect("/dev/ttyMOCK0", 115_200).unwrap();
/// transport.send("P50").unwrap();
/// assert!(device.wait_for_writes(1, std::time::Duration::from_secs(2)));
/// transport.disconnect();
///
/// assert_eq!(device.written_text(), "P50");
/// assert!(!transport.is_connected());
/// ```
pub struct Transport {
    opener: Arc<dyn PortOpener>,
    options: TransportOptions,
    queue: OutboundQueue,
    session: Option<PortSession>,
    events_tx: Sender<TransportEvent>,
    events_rx: Receiver<TransportEvent>,
}

impl Transport {
    /// Transport backed by real serial hardware.
    pub fn new(options: TransportOptions) -> Self {
        Self::with_opener(SystemPortOpener, options)
    }

    /// Transport that acquires devices through `opener`.
    pub fn with_opener(opener: impl PortOpener + 'static, options: TransportOptions) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            opener: Arc::new(opener),
            queue: OutboundQueue::new(options.queue_capacity),
            options,
            session: None,
            events_tx,
            events_rx,
        }
    }

    /// Open `port_name` and start the reader and writer loops.
    ///
    /// Failures are returned and also emitted once as
    /// [`TransportEvent::Error`]; an existing session is never disturbed.
    pub fn connect(&mut self, port_name: &str, baud_rate: u32) -> TransportResult<()> {
        match self.open_session(port_name, baud_rate) {
            Ok(session) => {
                info!(port = %port_name, baud_rate, "connected");
                self.session = Some(session);
                self.emit(TransportEvent::Connected {
                    port: port_name.to_string(),
                    baud_rate,
                });
                Ok(())
            }
            Err(e) => {
                warn!(port = %port_name, error = %e, "connect failed");
                self.emit(TransportEvent::Error(e.clone()));
                Err(e)
            }
        }
    }

    /// [`Transport::connect`] at the default 115200 baud.
    pub fn connect_default(&mut self, port_name: &str) -> TransportResult<()> {
        self.connect(port_name, DEFAULT_BAUD_RATE)
    }

    fn open_session(&self, port_name: &str, baud_rate: u32) -> TransportResult<PortSession> {
        if port_name.trim().is_empty() {
            return Err(TransportError::InvalidConfig(
                "port name must not be empty".into(),
            ));
        }
        if baud_rate == 0 {
            return Err(TransportError::InvalidConfig(
                "baud rate must be positive".into(),
            ));
        }
        if let Some(ref session) = self.session {
            return Err(TransportError::AlreadyConnected(
                session.port_name().to_string(),
            ));
        }

        let config = PortConfiguration::with_baud(baud_rate);
        let handle = self
            .opener
            .open(port_name, &config)
            .map_err(|e| TransportError::open(port_name, e))?;
        PortSession::start(handle, baud_rate, self.queue.clone(), self.events_tx.clone())
    }

    /// Stop the session and release the port.
    ///
    /// Returns once both loops have exited, so no data or writes from the old
    /// session follow. Always emits [`TransportEvent::Disconnected`], even if
    /// nothing was connected.
    pub fn disconnect(&mut self) {
        match self.session.take() {
            Some(session) => {
                let port = session.port_name().to_string();
                session.close();
                info!(port = %port, "disconnected");
            }
            None => debug!("disconnect requested while not connected"),
        }

        if self.options.purge_on_disconnect {
            let dropped = self.queue.purge();
            if dropped > 0 {
                debug!(dropped, "purged unsent items");
            }
        }
        self.emit(TransportEvent::Disconnected);
    }

    /// Queue `text` for the writer loop.
    ///
    /// While disconnected the payload is discarded and `Ok` is returned
    /// immediately. While connected the call waits up to the configured send
    /// timeout for queue space and fails with
    /// [`TransportError::QueueTimeout`] if none frees up.
    pub fn send(&self, text: impl Into<String>) -> TransportResult<()> {
        let text = text.into();
        if !self.is_connected() {
            debug!(len = text.len(), "not connected; dropping outbound item");
            return Ok(());
        }
        self.queue.put(text, self.options.send_timeout)
    }

    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(PortSession::is_open)
    }

    /// Name and baud rate of the active session.
    pub fn connected_port(&self) -> Option<(&str, u32)> {
        self.session
            .as_ref()
            .map(|s| (s.port_name(), s.baud_rate()))
    }

    /// Items waiting for the writer loop.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// A receiver for transport events.
    ///
    /// Receivers share one stream: each event goes to exactly one of them.
    pub fn events(&self) -> Receiver<TransportEvent> {
        self.events_rx.clone()
    }

    /// Dispatch every queued event to `observer` without blocking.
    ///
    /// Returns how many events were delivered.
    pub fn drain_events<O: TransportObserver + ?Sized>(&self, observer: &mut O) -> usize {
        let mut delivered = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            event.dispatch(observer);
            delivered += 1;
        }
        delivered
    }

    fn emit(&self, event: TransportEvent) {
        // We hold a receiver ourselves, so the channel cannot be disconnected.
        let _ = self.events_tx.send(event);
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(TransportOptions::default())
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("session", &self.session)
            .field("pending", &self.queue.len())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockPortOpener;
    use std::time::Duration;

    fn mock_transport() -> (Transport, MockPortOpener) {
        let opener = MockPortOpener::new();
        let transport = Transport::with_opener(opener.clone(), TransportOptions::default());
        (transport, opener)
    }

    #[test]
    fn test_rejects_empty_port_name() {
        let (mut transport, _) = mock_transport();
        let err = transport.connect("  ", 115_200).unwrap_err();
        assert!(matches!(err, TransportError::InvalidConfig(_)));
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_rejects_zero_baud() {
        let (mut transport, opener) = mock_transport();
        opener.add_port("MOCK0");
        let err = transport.connect("MOCK0", 0).unwrap_err();
        assert!(matches!(err, TransportError::InvalidConfig(_)));
        assert!(opener.opened().is_empty());
    }

    #[test]
    fn test_second_connect_keeps_first_session() {
        let (mut transport, opener) = mock_transport();
        opener.add_port("MOCK0");
        opener.add_port("MOCK1");

        transport.connect("MOCK0", 9600).unwrap();
        let err = transport.connect("MOCK1", 9600).unwrap_err();

        assert_eq!(err, TransportError::AlreadyConnected("MOCK0".into()));
        assert_eq!(transport.connected_port(), Some(("MOCK0", 9600)));
        transport.disconnect();
    }

    #[test]
    fn test_connect_uses_read_timeout_and_8n1() {
        let (mut transport, opener) = mock_transport();
        opener.add_port("MOCK0");

        transport.connect_default("MOCK0").unwrap();
        let (_, config) = opener.opened().remove(0);
        assert_eq!(config, PortConfiguration::with_baud(115_200));
        transport.disconnect();
    }

    #[test]
    fn test_purge_on_disconnect_discards_backlog() {
        let opener = MockPortOpener::new();
        let device = opener.add_port("MOCK0");
        device.set_write_delay(Duration::from_millis(200));
        let mut transport = Transport::with_opener(opener, TransportOptions::default());

        transport.connect("MOCK0", 9600).unwrap();
        for item in ["a", "b", "c", "d"] {
            transport.send(item).unwrap();
        }
        transport.disconnect();

        assert_eq!(transport.pending(), 0);
    }

    #[test]
    fn test_backlog_kept_when_purge_disabled() {
        let opener = MockPortOpener::new();
        let device = opener.add_port("MOCK0");
        device.set_write_delay(Duration::from_millis(200));
        let options = TransportOptions {
            purge_on_disconnect: false,
            ..TransportOptions::default()
        };
        let mut transport = Transport::with_opener(opener, options);

        transport.connect("MOCK0", 9600).unwrap();
        for item in ["a", "b", "c", "d"] {
            transport.send(item).unwrap();
        }
        transport.disconnect();

        assert!(transport.pending() > 0);
    }
}
