//! Errors raised while locating, reading or validating `gdiags.toml`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file {0} does not exist")]
    NotFound(PathBuf),

    #[error("Cannot read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Cannot encode config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Cannot write config file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value parsed but is out of range.
    #[error("Invalid value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    /// An override variable held something unparseable.
    #[error("Cannot parse {var}: {message}")]
    EnvParseError { var: String, message: String },
}

impl ConfigError {
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn env_parse(var: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = ConfigError::validation("console.max_lines", "must retain at least one line");
        assert_eq!(
            err.to_string(),
            "Invalid value for 'console.max_lines': must retain at least one line"
        );
    }

    #[test]
    fn test_env_parse_message() {
        let err = ConfigError::env_parse("GDIAGS_SERIAL_DEFAULT_BAUD", "not a number");
        assert_eq!(
            err.to_string(),
            "Cannot parse GDIAGS_SERIAL_DEFAULT_BAUD: not a number"
        );
    }
}
