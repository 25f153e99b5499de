//! Serial transport: the asynchronous bridge between outbound commands and
//! a serial device.
//!
//! ```text
//! send() ──> OutboundQueue ──> WriterLoop ──> device
//!                                             │
//! events() <── TransportEvent <── ReaderLoop <┘
//! ```
//!
//! A [`Transport`] owns at most one [`PortSession`]. Each session runs a reader
//! and a writer on their own threads, sharing only an atomic running flag and
//! the outbound queue. Failures inside the loops never propagate to the
//! caller; they arrive as [`TransportEvent::Error`].

pub mod codec;
pub mod error;
pub mod event;
pub mod handler;
pub mod queue;
mod reader;
pub mod session;
mod writer;

pub use codec::LossyDecoder;
pub use error::{TransportError, TransportResult};
pub use event::{TransportEvent, TransportObserver};
pub use handler::Transport;
pub use queue::{OutboundQueue, DEFAULT_QUEUE_CAPACITY};
pub use session::PortSession;
pub use writer::WRITE_POLL;

use std::time::Duration;

/// Default bound on how long `send` waits for queue space.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables for a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Outbound queue capacity in items.
    pub queue_capacity: usize,
    /// How long `send` waits for queue space while connected.
    pub send_timeout: Duration,
    /// Drop unsent items when disconnecting.
    pub purge_on_disconnect: bool,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            purge_on_disconnect: true,
        }
    }
}
