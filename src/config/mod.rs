//! Configuration for gdiags.
//!
//! TOML file with environment variable overrides. The file only seeds
//! defaults (port, baud, queue sizing, console layout, logging); nothing is
//! written back at runtime.
//!
//! # Resolution
//!
//! 1. `GDIAGS_CONFIG` environment variable (explicit path)
//! 2. `./gdiags.toml`
//! 3. `~/.config/gdiags/gdiags.toml` (XDG) or `%APPDATA%\gdiags\gdiags.toml`
//! 4. Built-in defaults
//!
//! # Environment Overrides
//!
//! Pattern `GDIAGS_<SECTION>_<KEY>`, for example:
//! - `GDIAGS_SERIAL_DEFAULT_PORT=/dev/ttyACM0`
//! - `GDIAGS_SERIAL_DEFAULT_BAUD=9600`
//! - `GDIAGS_TRANSPORT_SEND_TIMEOUT_MS=1000`
//! - `GDIAGS_CONSOLE_MAX_LINES=5000`
//! - `GDIAGS_LOGGING_LEVEL=debug`, `GDIAGS_LOGGING_FORMAT=json`

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{
    AxisConfig, Config, ConsoleConfig, LogFormat, LoggingConfig, SerialConfig, TransportConfig,
};
