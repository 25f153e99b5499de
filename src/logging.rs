//! Tracing subscriber setup for the binary.
//!
//! Logs go to stderr so that device output on stdout stays clean.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` wins, then `override_level`, then the config.
pub fn build_filter(config: &LoggingConfig, override_level: Option<&str>) -> EnvFilter {
    let level = override_level.unwrap_or(&config.level);
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Returns an error if a subscriber is already installed.
pub fn init_logging(
    config: &LoggingConfig,
    override_level: Option<&str>,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = build_filter(config, override_level);
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_thread_names(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_names(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_override_level_beats_config() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig::default();
        let filter = build_filter(&config, Some("debug"));
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    #[serial]
    fn test_bad_level_falls_back_to_info() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig {
            level: "gdiags=loud".into(),
            ..LoggingConfig::default()
        };
        assert_eq!(build_filter(&config, None).to_string(), "info");
    }
}
