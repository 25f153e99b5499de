//! Shared test utilities for gdiags integration tests.
//!
//! This module provides common test infrastructure including:
//! - Mock-backed transports and consoles
//! - Event collection with timeouts
//! - Polling helpers for asynchronous conditions

#![allow(dead_code)]

use crossbeam_channel::Receiver;
use gdiags::config::Config;
use gdiags::console::Console;
use gdiags::port::{MockPortOpener, MockSerialPort};
use gdiags::transport::{Transport, TransportEvent, TransportOptions};
use std::time::{Duration, Instant};

/// Port name every mock device is registered under.
pub const MOCK_PORT: &str = "/dev/ttyMOCK0";

/// Generous bound for anything that should happen "soon".
pub const EVENTUALLY: Duration = Duration::from_secs(3);

/// A transport wired to a single mock device.
pub struct MockRig {
    pub transport: Transport,
    pub device: MockSerialPort,
    pub opener: MockPortOpener,
    pub events: Receiver<TransportEvent>,
}

impl MockRig {
    pub fn new() -> Self {
        Self::with_options(TransportOptions::default())
    }

    pub fn with_options(options: TransportOptions) -> Self {
        let opener = MockPortOpener::new();
        let device = opener.add_port(MOCK_PORT);
        let transport = Transport::with_opener(opener.clone(), options);
        let events = transport.events();
        Self {
            transport,
            device,
            opener,
            events,
        }
    }

    /// Connect and swallow the `Connected` event.
    pub fn connected() -> Self {
        let mut rig = Self::new();
        rig.transport
            .connect(MOCK_PORT, 115_200)
            .expect("mock connect should succeed");
        let first = rig.events.recv_timeout(EVENTUALLY).expect("connected event");
        assert!(matches!(first, TransportEvent::Connected { .. }));
        rig
    }
}

/// A console writing into a buffer, wired to a single mock device.
pub fn mock_console(config: &Config) -> (Console<Vec<u8>>, MockSerialPort) {
    let opener = MockPortOpener::new();
    let device = opener.add_port(MOCK_PORT);
    let transport = Transport::with_opener(opener, config.transport.to_options());
    (Console::new(transport, config, Vec::new()), device)
}

/// Everything the console has printed so far.
pub fn console_output(console: &Console<Vec<u8>>) -> String {
    String::from_utf8_lossy(console.output()).into_owned()
}

/// Collect events until none arrives for `quiet`.
pub fn collect_events(events: &Receiver<TransportEvent>, quiet: Duration) -> Vec<TransportEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.recv_timeout(quiet) {
        out.push(event);
    }
    out
}

/// Wait for the first event matching `pred`, discarding the rest.
pub fn wait_for_event<F>(
    events: &Receiver<TransportEvent>,
    timeout: Duration,
    mut pred: F,
) -> Option<TransportEvent>
where
    F: FnMut(&TransportEvent) -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.checked_duration_since(Instant::now())?;
        match events.recv_timeout(remaining) {
            Ok(event) if pred(&event) => return Some(event),
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
}

/// Concatenate `Data` payloads until `needle` shows up or `timeout` elapses.
pub fn read_text_until(events: &Receiver<TransportEvent>, needle: &str, timeout: Duration) -> String {
    let deadline = Instant::now() + timeout;
    let mut text = String::new();
    while !text.contains(needle) {
        let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
            break;
        };
        match events.recv_timeout(remaining) {
            Ok(TransportEvent::Data(chunk)) => text.push_str(&chunk),
            Ok(_) => {}
            Err(_) => break,
        }
    }
    text
}

/// Poll `cond` every few milliseconds until it holds or `timeout` elapses.
pub fn wait_until<F: FnMut() -> bool>(timeout: Duration, mut cond: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}
