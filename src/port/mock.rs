//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that simulates a device without requiring
//! hardware, and a `MockPortOpener` that hands those ports to the transport.
//! Clones share state, so a test keeps one clone to script the device while
//! the transport's reader and writer drive the others.

use super::error::PortError;
use super::traits::{PortConfiguration, PortOpener, SerialPortAdapter};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Upper bound on how long an empty mock read blocks.
const MOCK_POLL: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct MockPortState {
    /// Queue of bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of all writes, one entry per successful write call.
    write_log: Vec<Vec<u8>>,
    /// Number of upcoming reads that fail with an I/O error.
    failing_reads: usize,
    /// Number of upcoming writes that fail with an I/O error.
    failing_writes: usize,
    /// Artificial latency applied to every write.
    write_delay: Duration,
    /// Configured timeout duration.
    timeout: Duration,
    /// Whether the device is still attached.
    open: bool,
}

impl Default for MockPortState {
    fn default() -> Self {
        Self {
            read_queue: VecDeque::new(),
            write_log: Vec::new(),
            failing_reads: 0,
            failing_writes: 0,
            write_delay: Duration::ZERO,
            timeout: Duration::from_secs(1),
            open: true,
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<MockPortState>,
    changed: Condvar,
}

/// Mock serial port implementation for testing.
///
/// # Example
/// ```
/// use gdiags::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"Hello, World!");
///
/// let mut buffer = [0u8; 13];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"Hello, World!");
///
/// port.write_bytes(b"Response").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"Response".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    shared: Arc<Shared>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shared: Arc::new(Shared::default()),
        }
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&self, data: &[u8]) {
        let mut state = self.shared.state.lock();
        state.read_queue.extend(data);
        self.shared.changed.notify_all();
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.shared.state.lock().write_log.clone()
    }

    /// Everything written so far, concatenated and decoded.
    pub fn written_text(&self) -> String {
        let state = self.shared.state.lock();
        let bytes: Vec<u8> = state.write_log.iter().flatten().copied().collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Block until at least `count` writes have been logged or `timeout` elapses.
    ///
    /// Returns whether the count was reached.
    pub fn wait_for_writes(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while state.write_log.len() < count {
            if self.shared.changed.wait_until(&mut state, deadline).timed_out() {
                return state.write_log.len() >= count;
            }
        }
        true
    }

    /// Make the next `count` reads fail with an I/O error.
    pub fn fail_reads(&self, count: usize) {
        self.shared.state.lock().failing_reads = count;
    }

    /// Make the next `count` writes fail with an I/O error.
    pub fn fail_writes(&self, count: usize) {
        self.shared.state.lock().failing_writes = count;
    }

    /// Delay every write by `delay`, simulating a slow device.
    pub fn set_write_delay(&self, delay: Duration) {
        self.shared.state.lock().write_delay = delay;
    }

    /// Simulate the device being unplugged.
    pub fn unplug(&self) {
        self.shared.state.lock().open = false;
        self.shared.changed.notify_all();
    }

    /// Currently configured timeout.
    pub fn timeout(&self) -> Duration {
        self.shared.state.lock().timeout
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.shared.state.lock().read_queue.len()
    }
}

fn broken_pipe(what: &str) -> PortError {
    PortError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, what.to_string()))
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let delay = self.shared.state.lock().write_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut state = self.shared.state.lock();
        if !state.open {
            return Err(PortError::NotOpen);
        }
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(broken_pipe("simulated write failure"));
        }

        state.write_log.push(data.to_vec());
        self.shared.changed.notify_all();

        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.shared.state.lock();
        if !state.open {
            return Err(PortError::NotOpen);
        }
        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(broken_pipe("simulated read failure"));
        }

        if state.read_queue.is_empty() {
            let wait = state.timeout.min(MOCK_POLL);
            let _ = self.shared.changed.wait_for(&mut state, wait);
        }

        let mut bytes_read = 0;
        for byte in buffer.iter_mut() {
            match state.read_queue.pop_front() {
                Some(queued) => {
                    *byte = queued;
                    bytes_read += 1;
                }
                None => break,
            }
        }

        if bytes_read == 0 {
            Err(PortError::timeout(state.timeout))
        } else {
            Ok(bytes_read)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.shared.state.lock().timeout = timeout;
        Ok(())
    }

    fn try_clone_adapter(&self) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        Ok(Box::new(self.clone()))
    }

    fn is_open(&self) -> bool {
        self.shared.state.lock().open
    }

    fn bytes_to_read(&self) -> Option<usize> {
        Some(self.available_bytes())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

/// Serves registered `MockSerialPort`s by name; anything else is "not found".
#[derive(Clone, Default)]
pub struct MockPortOpener {
    ports: Arc<Mutex<HashMap<String, MockSerialPort>>>,
    opened: Arc<Mutex<Vec<(String, PortConfiguration)>>>,
}

impl MockPortOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device and return a handle for scripting it.
    pub fn add_port(&self, name: &str) -> MockSerialPort {
        let port = MockSerialPort::new(name);
        self.ports.lock().insert(name.to_string(), port.clone());
        port
    }

    /// Every successful open so far, with the settings it was opened with.
    pub fn opened(&self) -> Vec<(String, PortConfiguration)> {
        self.opened.lock().clone()
    }
}

impl PortOpener for MockPortOpener {
    fn open(
        &self,
        port_name: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let mut port = self
            .ports
            .lock()
            .get(port_name)
            .cloned()
            .ok_or_else(|| PortError::not_found(port_name))?;
        if !port.is_open() {
            return Err(PortError::NotOpen);
        }
        port.set_timeout(config.timeout)?;
        self.opened
            .lock()
            .push((port_name.to_string(), config.clone()));
        Ok(Box::new(port))
    }
}
