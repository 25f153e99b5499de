//! Console input parsing.

use super::axis::{AxisError, GainTerm};
use std::str::FromStr;
use thiserror::Error;

/// Marks a line as a console command rather than device input.
pub const COMMAND_PREFIX: char = ':';

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Open a port; both fields fall back to configured defaults.
    Connect {
        port: Option<String>,
        baud: Option<u32>,
    },
    Disconnect,
    Ports,
    Status,
    /// Send a tuning value to an axis, optionally switching its term first.
    Axis {
        index: usize,
        term: Option<GainTerm>,
        value: String,
    },
    /// Select the gain term an axis uses for later values.
    Term { index: usize, term: GainTerm },
    Clear,
    Help,
    Quit,
    /// Text for the device, sent as typed followed by a carriage return.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command ':{0}'; type :help for a list")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid baud rate {0:?}")]
    InvalidBaud(String),

    #[error("Invalid axis number {0:?}")]
    InvalidAxis(String),

    #[error(transparent)]
    Axis(#[from] AxisError),
}

pub const HELP: &str = "\
:connect [port] [baud]      open a serial port (defaults from config)
:disconnect                 close the port
:ports                      list available serial ports
:status                     show connection state
:axis <n> [P|I|D] <value>   send a gain value to axis n
:term <n> <P|I|D>           select the gain term for axis n
:clear                      clear the terminal log
:help                       show this help
:quit                       disconnect and exit
anything else               sent to the device, followed by CR";

impl FromStr for ConsoleCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let Some(rest) = line.trim_start().strip_prefix(COMMAND_PREFIX) else {
            return Ok(ConsoleCommand::Raw(line.to_string()));
        };

        let mut words = rest.split_whitespace();
        let name = words.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = words.collect();

        match (name.as_str(), args.as_slice()) {
            ("connect" | "c", args) if args.len() <= 2 => Ok(ConsoleCommand::Connect {
                port: args.first().map(|p| p.to_string()),
                baud: args.get(1).map(|b| parse_baud(b)).transpose()?,
            }),
            ("connect" | "c", _) => Err(CommandError::Usage(":connect [port] [baud]")),
            ("disconnect" | "dc", []) => Ok(ConsoleCommand::Disconnect),
            ("ports" | "ls", []) => Ok(ConsoleCommand::Ports),
            ("status", []) => Ok(ConsoleCommand::Status),
            ("axis" | "a", [index, value]) => Ok(ConsoleCommand::Axis {
                index: parse_axis(index)?,
                term: None,
                value: value.to_string(),
            }),
            ("axis" | "a", [index, term, value]) => Ok(ConsoleCommand::Axis {
                index: parse_axis(index)?,
                term: Some(term.parse()?),
                value: value.to_string(),
            }),
            ("axis" | "a", _) => Err(CommandError::Usage(":axis <n> [P|I|D] <value>")),
            ("term" | "t", [index, term]) => Ok(ConsoleCommand::Term {
                index: parse_axis(index)?,
                term: term.parse()?,
            }),
            ("term" | "t", _) => Err(CommandError::Usage(":term <n> <P|I|D>")),
            ("clear", []) => Ok(ConsoleCommand::Clear),
            ("help" | "h" | "?", _) => Ok(ConsoleCommand::Help),
            ("quit" | "q" | "exit", []) => Ok(ConsoleCommand::Quit),
            (other, _) => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_baud(s: &str) -> Result<u32, CommandError> {
    s.parse::<u32>()
        .ok()
        .filter(|b| *b > 0)
        .ok_or_else(|| CommandError::InvalidBaud(s.to_string()))
}

fn parse_axis(s: &str) -> Result<usize, CommandError> {
    s.parse()
        .map_err(|_| CommandError::InvalidAxis(s.to_string()))
}
