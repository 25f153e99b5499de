//! Port abstraction layer for serial communication.
//!
//! Provides the adapter trait the transport is written against, the real
//! `serialport`-backed implementation, and mocks for testing.

pub mod discovery;
pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use discovery::{list_ports, PortInfo};
pub use error::PortError;
pub use mock::{MockPortOpener, MockSerialPort};
pub use sync_port::*;
pub use traits::*;
