//! Configuration schema definitions.
//!
//! Every section has defaults, so an empty file (or no file) is valid.

use super::error::{ConfigError, ConfigResult};
use crate::transport::TransportOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port selection
    pub serial: SerialConfig,
    /// Outbound queue behaviour
    pub transport: TransportConfig,
    /// Operator console
    pub console: ConsoleConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the transport or console cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.default_baud == 0 {
            return Err(ConfigError::validation(
                "serial.default_baud",
                "must be a positive integer",
            ));
        }
        if self.transport.queue_capacity == 0 {
            return Err(ConfigError::validation(
                "transport.queue_capacity",
                "must hold at least one item",
            ));
        }
        if self.console.max_lines == 0 {
            return Err(ConfigError::validation(
                "console.max_lines",
                "must retain at least one line",
            ));
        }
        if self.console.axes.is_empty() {
            return Err(ConfigError::validation(
                "console.axes",
                "at least one axis is required",
            ));
        }
        Ok(())
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port to connect to on startup, if any
    pub default_port: Option<String>,
    /// Default baud rate for new connections
    pub default_baud: u32,
    /// Port aliases for convenience
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            default_port: None,
            default_baud: 115_200,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Transport tuning section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Outbound queue capacity in items
    pub queue_capacity: usize,
    /// How long a send waits for queue space, in milliseconds
    pub send_timeout_ms: u64,
    /// Drop unsent commands on disconnect
    pub purge_on_disconnect: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        let options = TransportOptions::default();
        Self {
            queue_capacity: options.queue_capacity,
            send_timeout_ms: options.send_timeout.as_millis() as u64,
            purge_on_disconnect: options.purge_on_disconnect,
        }
    }
}

impl TransportConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn to_options(&self) -> TransportOptions {
        TransportOptions {
            queue_capacity: self.queue_capacity,
            send_timeout: self.send_timeout(),
            purge_on_disconnect: self.purge_on_disconnect,
        }
    }
}

/// Operator console section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Lines kept in the terminal log
    pub max_lines: usize,
    /// Prefix error lines with a wall-clock timestamp
    pub show_timestamps: bool,
    /// Axis panels, in display order
    pub axes: Vec<AxisConfig>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            max_lines: 1000,
            show_timestamps: false,
            axes: ["a", "b", "c", "d"]
                .iter()
                .enumerate()
                .map(|(i, letter)| AxisConfig {
                    label: format!("Axis {}", i + 1),
                    prefix: vec!["m".to_string(), letter.to_string()],
                })
                .collect(),
        }
    }
}

/// One axis panel: its label and the context-select writes sent before a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub label: String,
    pub prefix: Vec<String>,
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    Pretty,
    /// Compact format
    #[default]
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.serial.default_baud, 115_200);
        assert_eq!(config.transport.send_timeout(), Duration::from_secs(5));
        assert_eq!(config.console.max_lines, 1000);
        assert_eq!(config.console.axes.len(), 4);
        assert_eq!(config.console.axes[1].label, "Axis 2");
        assert_eq!(config.console.axes[1].prefix, vec!["m", "b"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_port_alias_resolution() {
        let mut config = SerialConfig::default();
        config
            .port_aliases
            .insert("controller".to_string(), "/dev/ttyACM0".to_string());

        assert_eq!(config.resolve_port("controller"), "/dev/ttyACM0");
        assert_eq!(config.resolve_port("COM5"), "COM5");
    }

    #[test]
    fn test_transport_options_mapping() {
        let config = TransportConfig {
            queue_capacity: 8,
            send_timeout_ms: 250,
            purge_on_disconnect: false,
        };
        let options = config.to_options();
        assert_eq!(options.queue_capacity, 8);
        assert_eq!(options.send_timeout, Duration::from_millis(250));
        assert!(!options.purge_on_disconnect);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[serial]"));
        assert!(toml_str.contains("[transport]"));
        assert!(toml_str.contains("[[console.axes]]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [serial]
            default_port = "/dev/ttyUSB0"
            default_baud = 9600

            [[console.axes]]
            label = "Pan"
            prefix = ["m", "a"]
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.default_port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.serial.default_baud, 9600);
        assert_eq!(config.console.axes.len(), 1);
        // Defaults should still work
        assert_eq!(config.console.max_lines, 1000);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = Config::default();
        config.serial.default_baud = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { key, .. }) if key == "serial.default_baud"
        ));

        let mut config = Config::default();
        config.console.max_lines = 0;
        assert!(config.validate().is_err());
    }
}
