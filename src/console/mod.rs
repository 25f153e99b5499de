//! Line-oriented operator console.
//!
//! The console turns operator input into transport sends and renders
//! transport events into a [`TerminalLog`]. Everything it shows is also
//! written to an output sink (stdout for the binary, a buffer in tests).
//!
//! ```text
//!  stdin line ──> ConsoleCommand ──> Transport::send / connect / ...
//!                                            │
//!  output <── TerminalLog <── TransportObserver hooks <── TransportEvent
//! ```

mod axis;
mod command;
mod terminal;

pub use axis::{AxisControl, AxisError, AxisPanel, GainTerm};
pub use command::{CommandError, ConsoleCommand, COMMAND_PREFIX, HELP};
pub use terminal::{keystroke_payload, TerminalLog, DEFAULT_MAX_LINES};

use crate::config::{Config, SerialConfig};
use crate::error::{AppError, AppResult};
use crate::port::list_ports;
use crate::transport::{Transport, TransportError, TransportEvent, TransportObserver};
use std::io::Write;
use tracing::{debug, warn};

/// Prefix on every error line shown to the operator.
pub const ERROR_PREFIX: &str = "Diags App Error:";

/// Whether the console should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console<W: Write> {
    transport: Transport,
    axes: AxisPanel,
    log: TerminalLog,
    serial: SerialConfig,
    show_timestamps: bool,
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(transport: Transport, config: &Config, out: W) -> Self {
        Self {
            transport,
            axes: AxisPanel::from_config(&config.console.axes),
            log: TerminalLog::new(config.console.max_lines),
            serial: config.serial.clone(),
            show_timestamps: config.console.show_timestamps,
            out,
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut Transport {
        &mut self.transport
    }

    pub fn log(&self) -> &TerminalLog {
        &self.log
    }

    pub fn axes(&self) -> &AxisPanel {
        &self.axes
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Parse and run one line of input.
    ///
    /// Bad input and transport failures are shown as error lines and the
    /// console carries on; only a failing output sink is returned.
    pub fn handle_line(&mut self, line: &str) -> AppResult<Flow> {
        let result = line
            .parse::<ConsoleCommand>()
            .map_err(AppError::from)
            .and_then(|command| self.execute(command));

        match result {
            Ok(flow) => Ok(flow),
            Err(e) if e.is_recoverable() => {
                self.report_error(&e)?;
                Ok(Flow::Continue)
            }
            Err(e) => Err(e),
        }
    }

    pub fn execute(&mut self, command: ConsoleCommand) -> AppResult<Flow> {
        match command {
            ConsoleCommand::Connect { port, baud } => {
                let port = port
                    .or_else(|| self.serial.default_port.clone())
                    .map(|p| self.serial.resolve_port(&p))
                    .ok_or(AppError::NoPort)?;
                let baud = baud.unwrap_or(self.serial.default_baud);
                // Failures arrive as an error event, so they are not reported twice.
                if let Err(e) = self.transport.connect(&port, baud) {
                    debug!(error = %e, "connect command failed");
                }
            }
            ConsoleCommand::Disconnect => self.transport.disconnect(),
            ConsoleCommand::Ports => self.show_ports()?,
            ConsoleCommand::Status => {
                let status = match self.transport.connected_port() {
                    Some((port, _)) if !self.transport.is_connected() => {
                        format!("Port {port} lost; :disconnect to reset")
                    }
                    Some((port, baud)) => format!(
                        "Connected to {port} at {baud} baud, {} queued",
                        self.transport.pending()
                    ),
                    None => "Not connected".to_string(),
                };
                self.show_line(&status)?;
            }
            ConsoleCommand::Axis { index, term, value } => {
                let axis = self.axes.get_mut(index)?;
                if let Some(term) = term {
                    axis.select_term(term);
                }
                for item in axis.compose(&value)? {
                    self.transport.send(item)?;
                }
            }
            ConsoleCommand::Term { index, term } => {
                let axis = self.axes.get_mut(index)?;
                axis.select_term(term);
                let line = format!("{} gain term set to {term}", axis.label());
                self.show_line(&line)?;
            }
            ConsoleCommand::Clear => self.log.clear(),
            ConsoleCommand::Help => {
                for line in HELP.lines() {
                    self.show_line(line)?;
                }
            }
            ConsoleCommand::Quit => return Ok(Flow::Quit),
            ConsoleCommand::Raw(text) => {
                let mut payload: String = text.chars().filter_map(keystroke_payload).collect();
                payload.push('\r');
                self.transport.send(payload)?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Render one event received from the transport.
    pub fn handle_event(&mut self, event: TransportEvent) {
        event.dispatch(self);
    }

    /// Render every event already waiting on the transport, without blocking.
    pub fn pump_events(&mut self) -> usize {
        let events = self.transport.events();
        let mut handled = 0;
        while let Ok(event) = events.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Close any session, lost or live, rendering the resulting events.
    pub fn shutdown(&mut self) {
        if self.transport.connected_port().is_some() {
            self.transport.disconnect();
            self.pump_events();
        }
    }

    /// Show an error line, timestamped when configured.
    pub fn report_error(&mut self, error: &dyn std::fmt::Display) -> std::io::Result<()> {
        let line = if self.show_timestamps {
            format!(
                "[{}] {ERROR_PREFIX} {error}",
                chrono::Local::now().format("%H:%M:%S")
            )
        } else {
            format!("{ERROR_PREFIX} {error}")
        };
        self.show_line(&line)
    }

    fn show_ports(&mut self) -> AppResult<()> {
        let ports = list_ports()?;
        if ports.is_empty() {
            self.show_line("No serial ports found")?;
        }
        for port in ports {
            self.show_line(&port.to_string())?;
        }
        Ok(())
    }

    fn show_line(&mut self, line: &str) -> std::io::Result<()> {
        let shown = self.log.push_line(line);
        self.write_out(&shown)
    }

    fn write_out(&mut self, text: &str) -> std::io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }

    /// Observer hooks cannot return errors; a broken sink is only logged.
    fn show_or_warn(&mut self, line: &str) {
        if let Err(e) = self.show_line(line) {
            warn!(error = %e, "failed to write console output");
        }
    }
}

impl<W: Write> TransportObserver for Console<W> {
    fn on_data(&mut self, text: &str) {
        let shown = self.log.append(text);
        if let Err(e) = self.write_out(&shown) {
            warn!(error = %e, "failed to write device output");
        }
    }

    fn on_error(&mut self, error: &TransportError) {
        if let Err(e) = self.report_error(error) {
            warn!(error = %e, "failed to write console output");
        }
    }

    fn on_connect(&mut self, port: &str, baud_rate: u32) {
        self.show_or_warn(&format!("Connected to {port} at {baud_rate} baud"));
    }

    fn on_disconnect(&mut self) {
        self.show_or_warn("Disconnected");
    }
}

impl<W: Write> std::fmt::Debug for Console<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("transport", &self.transport)
            .field("axes", &self.axes)
            .field("log_lines", &self.log.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockPortOpener;
    use crate::transport::TransportOptions;

    fn console() -> (Console<Vec<u8>>, MockPortOpener) {
        let opener = MockPortOpener::new();
        let transport = Transport::with_opener(opener.clone(), TransportOptions::default());
        (Console::new(transport, &Config::default(), Vec::new()), opener)
    }

    fn shown(console: &Console<Vec<u8>>) -> String {
        String::from_utf8_lossy(console.output()).into_owned()
    }

    #[test]
    fn test_invalid_axis_value_is_reported_not_sent() {
        let (mut console, _) = console();
        assert_eq!(console.handle_line(":axis 1 4.5").unwrap(), Flow::Continue);
        assert!(shown(&console)
            .contains("Diags App Error: Only integer values accepted, got \"4.5\""));
    }

    #[test]
    fn test_connect_without_default_port() {
        let (mut console, _) = console();
        console.handle_line(":connect").unwrap();
        assert!(shown(&console).contains("No port given"));
        assert!(!console.transport().is_connected());
    }

    #[test]
    fn test_term_selection_persists() {
        let (mut console, _) = console();
        console.handle_line(":term 2 i").unwrap();
        assert_eq!(console.axes().get(2).unwrap().term(), GainTerm::I);
        assert!(shown(&console).contains("Axis 2 gain term set to I"));
    }

    #[test]
    fn test_quit_and_status() {
        let (mut console, _) = console();
        console.handle_line(":status").unwrap();
        assert!(shown(&console).contains("Not connected"));
        assert_eq!(console.handle_line(":q").unwrap(), Flow::Quit);
    }

    #[test]
    fn test_status_reports_lost_port() {
        let (mut console, opener) = console();
        let device = opener.add_port("MOCK0");
        console.handle_line(":connect MOCK0 9600").unwrap();
        console.handle_line(":status").unwrap();
        assert!(shown(&console).contains("Connected to MOCK0 at 9600 baud"));

        device.unplug();
        console.handle_line(":status").unwrap();
        assert!(shown(&console).contains("Port MOCK0 lost; :disconnect to reset"));
        console.shutdown();
        assert_eq!(console.transport().connected_port(), None);
    }

    #[test]
    fn test_data_events_are_normalized() {
        let (mut console, _) = console();
        console.handle_event(TransportEvent::Data("Kp=50\r\nKi=2\r".into()));
        assert_eq!(shown(&console), "Kp=50\nKi=2\n");
        assert_eq!(console.log().len(), 3);
    }

    #[test]
    fn test_error_lines_can_carry_timestamps() {
        let opener = MockPortOpener::new();
        let transport = Transport::with_opener(opener, TransportOptions::default());
        let mut config = Config::default();
        config.console.show_timestamps = true;
        let mut console = Console::new(transport, &config, Vec::new());

        console.handle_event(TransportEvent::Error(TransportError::QueueClosed));
        let out = shown(&console);
        assert!(out.starts_with('['));
        assert!(out.contains("] Diags App Error: "));
    }

    #[test]
    fn test_connect_uses_alias_and_default_baud() {
        let opener = MockPortOpener::new();
        opener.add_port("/dev/ttyACM0");
        let transport = Transport::with_opener(opener.clone(), TransportOptions::default());
        let mut config = Config::default();
        config
            .serial
            .port_aliases
            .insert("ctl".into(), "/dev/ttyACM0".into());
        config.serial.default_baud = 57_600;
        let mut console = Console::new(transport, &config, Vec::new());

        console.handle_line(":connect ctl").unwrap();
        console.pump_events();
        assert_eq!(
            console.transport().connected_port(),
            Some(("/dev/ttyACM0", 57_600))
        );
        assert!(shown(&console).contains("Connected to /dev/ttyACM0 at 57600 baud"));
        console.shutdown();
        assert!(shown(&console).ends_with("Disconnected\n"));
    }
}
