//! gdiags library
//!
//! Serial transport and operator console for a serial-connected motion
//! controller: tuning commands go out through a bounded queue and a writer
//! thread, device output comes back through a reader thread, and both sides
//! report to the owner through transport events.
//!
//! # Modules
//!
//! - `port`: Port abstraction layer for serial communication
//! - `transport`: Connection lifecycle, outbound queue, reader and writer loops
//! - `console`: Axis tuning, terminal log and console commands
//! - `config`: Configuration management with TOML support
//! - `logging`: Tracing subscriber setup
//! - `error`: Top-level error type

pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod port;
pub mod transport;

// Re-export commonly used types for convenience
pub use console::{AxisControl, AxisPanel, Console, ConsoleCommand, Flow, GainTerm, TerminalLog};
pub use error::{AppError, AppResult};
pub use port::{
    list_ports, DataBits, FlowControl, MockPortOpener, MockSerialPort, Parity, PortConfiguration,
    PortError, PortInfo, PortOpener, SerialPortAdapter, StopBits, SyncSerialPort,
    SystemPortOpener,
};
pub use transport::{
    Transport, TransportError, TransportEvent, TransportObserver, TransportOptions,
    TransportResult,
};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
