use crate::config::ConfigError;
use crate::console::CommandError;
use crate::port::PortError;
use crate::transport::TransportError;
use std::fmt;

/// A specialized `Result` type for the binary and the console.
pub type AppResult<T> = Result<T, AppError>;

/// Top-level error for the `gdiags` binary.
///
/// Each layer keeps its own error enum; this one only aggregates them so the
/// console and `main` can use `?` across layers.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Transport(TransportError),
    Port(PortError),
    Input(CommandError),
    NoPort,
    Io(std::io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Transport(e) => write!(f, "{e}"),
            Self::Port(e) => write!(f, "{e}"),
            Self::Input(e) => write!(f, "{e}"),
            Self::NoPort => write!(
                f,
                "No port given and no default port configured; try :ports"
            ),
            Self::Io(e) => write!(f, "An I/O error occurred: {e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Transport(e) => Some(e),
            Self::Port(e) => Some(e),
            Self::Input(e) => Some(e),
            Self::NoPort => None,
            Self::Io(e) => Some(e),
        }
    }
}

impl AppError {
    /// Failures the console reports and carries on from, as opposed to
    /// broken terminal output which ends the session.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

// Implement `From` conversions to allow the `?` operator to work seamlessly.
impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        AppError::Transport(err)
    }
}

impl From<PortError> for AppError {
    fn from(err: PortError) -> Self {
        AppError::Port(err)
    }
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        AppError::Input(err)
    }
}

impl From<crate::console::AxisError> for AppError {
    fn from(err: crate::console::AxisError) -> Self {
        AppError::Input(CommandError::Axis(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}
