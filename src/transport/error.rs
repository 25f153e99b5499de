//! Transport error taxonomy.
//!
//! Errors carry their detail as text so they can be both returned to a caller
//! and copied onto the event channel.

use crate::port::PortError;
use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by the transport, either returned or sent as events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection parameters were rejected before touching the device.
    #[error("Invalid connection parameters: {0}")]
    InvalidConfig(String),

    /// `connect` was called while a session is active.
    #[error("Already connected to {0}; disconnect first")]
    AlreadyConnected(String),

    /// The requested device does not exist.
    #[error("Serial port not found: {0}")]
    PortNotFound(String),

    /// The device exists but could not be opened.
    #[error("Failed to open {port}: {reason}")]
    OpenFailed { port: String, reason: String },

    /// A read from an open port failed.
    #[error("Read failed: {0}")]
    Read(String),

    /// A write to an open port failed; the payload was dropped.
    #[error("Write failed: {0}")]
    Write(String),

    /// The outbound queue did not accept an item within the wait bound.
    #[error("Outbound queue full: item not accepted within {0:?}")]
    QueueTimeout(Duration),

    /// The outbound queue can no longer accept items.
    #[error("Outbound queue closed")]
    QueueClosed,

    /// A worker thread could not be started.
    #[error("Failed to start {worker} thread: {reason}")]
    Spawn { worker: &'static str, reason: String },
}

impl TransportError {
    /// Classify a failure to open `port`.
    pub fn open(port: &str, err: PortError) -> Self {
        match err {
            PortError::NotFound(name) => Self::PortNotFound(name),
            other => Self::OpenFailed {
                port: port.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Convenient Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_not_found_is_classified() {
        let err = TransportError::open("/dev/ttyUSB9", PortError::not_found("/dev/ttyUSB9"));
        assert_eq!(err, TransportError::PortNotFound("/dev/ttyUSB9".into()));
    }

    #[test]
    fn test_open_other_failure_keeps_reason() {
        let err = TransportError::open("/dev/ttyS0", PortError::config("bad baud"));
        assert_eq!(
            err.to_string(),
            "Failed to open /dev/ttyS0: Configuration error: bad baud"
        );
    }

    #[test]
    fn test_queue_timeout_display() {
        let err = TransportError::QueueTimeout(Duration::from_secs(5));
        assert_eq!(
            err.to_string(),
            "Outbound queue full: item not accepted within 5s"
        );
    }
}
