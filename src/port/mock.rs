//! Mock transport for testing.
//!
//! [`MockTransport`] simulates the transport boundary without hardware:
//! reads are served from a scripted queue, writes and reconfigurations are
//! logged for inspection, and status lines can be driven from the test.
//! [`MockOpener`] hands out shared clones of one mock so a test can keep
//! inspecting the transport after the adapter has taken ownership.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::config::SerialConfig;
use super::error::SerialError;
use super::traits::{ControlLine, StatusLine, Transport, TransportOpener};

#[derive(Debug, Default)]
struct MockState {
    /// Bytes served to read operations.
    read_queue: VecDeque<u8>,
    /// Every buffer passed to write, in order.
    write_log: Vec<Vec<u8>>,
    /// Every full configuration pushed to the transport, in order.
    reconfigure_log: Vec<SerialConfig>,
    /// Last level driven on each output line, `None` until first set.
    rts: Option<bool>,
    dtr: Option<bool>,
    /// Levels reported for the input status lines.
    cts: bool,
    dsr: bool,
    ri: bool,
    flush_count: usize,
    input_discarded: bool,
    output_discarded: bool,
}

/// Mock transport implementation for tests.
///
/// Clones share state, so a handle kept by the test observes everything the
/// adapter does through its own handle.
///
/// # Example
/// ```
/// use ftdi_serial::{MockTransport, Transport};
///
/// let mut port = MockTransport::new("MOCK0");
/// port.enqueue_read(b"pong");
///
/// let mut buffer = [0u8; 8];
/// let n = port.read(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"pong");
///
/// port.write(b"ping").unwrap();
/// assert_eq!(port.write_log(), vec![b"ping".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockTransport {
    name: String,
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Enqueue bytes to be served by subsequent reads.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().unwrap().read_queue.extend(data);
    }

    /// Every buffer written so far.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().write_log.clone()
    }

    /// Number of full-configuration pushes received.
    pub fn reconfigure_count(&self) -> usize {
        self.state.lock().unwrap().reconfigure_log.len()
    }

    /// The most recent configuration pushed, if any.
    pub fn last_config(&self) -> Option<SerialConfig> {
        self.state.lock().unwrap().reconfigure_log.last().cloned()
    }

    /// Drive an input status line as seen by the adapter.
    pub fn set_status_line(&mut self, line: StatusLine, level: bool) {
        let mut state = self.state.lock().unwrap();
        match line {
            StatusLine::Cts => state.cts = level,
            StatusLine::Dsr => state.dsr = level,
            StatusLine::Ri => state.ri = level,
        }
    }

    /// Last level the adapter drove on an output line, `None` if untouched.
    pub fn control_line(&self, line: ControlLine) -> Option<bool> {
        let state = self.state.lock().unwrap();
        match line {
            ControlLine::Rts => state.rts,
            ControlLine::Dtr => state.dtr,
        }
    }

    /// How many times the adapter drained pending writes.
    pub fn flush_count(&self) -> usize {
        self.state.lock().unwrap().flush_count
    }

    /// Whether the receive buffer was discarded.
    pub fn input_discarded(&self) -> bool {
        self.state.lock().unwrap().input_discarded
    }

    /// Whether the transmit buffer was discarded.
    pub fn output_discarded(&self) -> bool {
        self.state.lock().unwrap().output_discarded
    }

    /// Bytes still queued for reads.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().unwrap().read_queue.len()
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn reconfigure(&mut self, config: &SerialConfig) -> Result<(), SerialError> {
        config.validate()?;
        self.state
            .lock()
            .unwrap()
            .reconfigure_log
            .push(config.clone());
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, SerialError> {
        let mut state = self.state.lock().unwrap();
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

        if bytes_read == 0 && !buffer.is_empty() {
            // An empty queue behaves like a transport with nothing pending.
            return Err(SerialError::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "no data available",
            )));
        }
        Ok(bytes_read)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, SerialError> {
        self.state.lock().unwrap().write_log.push(data.to_vec());
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        self.state.lock().unwrap().flush_count += 1;
        Ok(())
    }

    fn discard_input(&mut self) -> Result<(), SerialError> {
        let mut state = self.state.lock().unwrap();
        state.read_queue.clear();
        state.input_discarded = true;
        Ok(())
    }

    fn discard_output(&mut self) -> Result<(), SerialError> {
        self.state.lock().unwrap().output_discarded = true;
        Ok(())
    }

    fn set_control_line(&mut self, line: ControlLine, level: bool) -> Result<(), SerialError> {
        let mut state = self.state.lock().unwrap();
        match line {
            ControlLine::Rts => state.rts = Some(level),
            ControlLine::Dtr => state.dtr = Some(level),
        }
        Ok(())
    }

    fn read_status_line(&mut self, line: StatusLine) -> Result<bool, SerialError> {
        let state = self.state.lock().unwrap();
        Ok(match line {
            StatusLine::Cts => state.cts,
            StatusLine::Dsr => state.dsr,
            StatusLine::Ri => state.ri,
        })
    }

    fn bytes_to_read(&self) -> Option<usize> {
        Some(self.available_bytes())
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

#[derive(Debug, Default)]
struct OpenerState {
    /// When set, the next open fails with this message.
    fail_with: Option<String>,
    /// Port identifiers passed to open, in order.
    open_log: Vec<Option<String>>,
}

/// Opener that hands out shared clones of one [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockOpener {
    transport: MockTransport,
    state: Arc<Mutex<OpenerState>>,
}

impl MockOpener {
    /// Create an opener serving clones of `transport`.
    pub fn new(transport: MockTransport) -> Self {
        Self {
            transport,
            state: Arc::new(Mutex::new(OpenerState::default())),
        }
    }

    /// Make the next open attempt fail with a `PortOpen` error.
    pub fn fail_next_open(&self, message: impl Into<String>) {
        self.state.lock().unwrap().fail_with = Some(message.into());
    }

    /// Port identifiers passed to open so far.
    pub fn open_log(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().open_log.clone()
    }
}

impl TransportOpener for MockOpener {
    fn open(
        &self,
        port: Option<&str>,
        _config: &SerialConfig,
    ) -> Result<Box<dyn Transport>, SerialError> {
        let mut state = self.state.lock().unwrap();
        state.open_log.push(port.map(str::to_owned));
        if let Some(message) = state.fail_with.take() {
            return Err(SerialError::port_open(message));
        }
        Ok(Box::new(self.transport.clone()))
    }

    fn display_name(&self, port: Option<&str>) -> String {
        port.map(str::to_owned).unwrap_or_else(|| "<mock>".to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_and_read() {
        let mut port = MockTransport::new("MOCK0");
        port.enqueue_read(b"Hello");

        let mut buffer = [0u8; 10];
        let n = port.read(&mut buffer).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buffer[..n], b"Hello");
    }

    #[test]
    fn partial_read_leaves_remainder_queued() {
        let mut port = MockTransport::new("MOCK0");
        port.enqueue_read(b"Hello, World!");

        let mut buffer = [0u8; 5];
        let n = port.read(&mut buffer).unwrap();
        assert_eq!(n, 5);
        assert_eq!(port.available_bytes(), 8);
    }

    #[test]
    fn empty_read_would_block() {
        let mut port = MockTransport::new("MOCK0");
        let mut buffer = [0u8; 10];
        match port.read(&mut buffer) {
            Err(SerialError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::WouldBlock),
            other => panic!("expected WouldBlock, got {other:?}"),
        }
    }

    #[test]
    fn write_logging() {
        let mut port = MockTransport::new("MOCK0");
        port.write(b"Test1").unwrap();
        port.write(b"Test2").unwrap();

        let log = port.write_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], b"Test1");
        assert_eq!(log[1], b"Test2");
    }

    #[test]
    fn reconfigure_is_logged() {
        let mut port = MockTransport::new("MOCK0");
        let config = SerialConfig {
            baud_rate: 115200,
            ..Default::default()
        };
        port.reconfigure(&config).unwrap();
        assert_eq!(port.reconfigure_count(), 1);
        assert_eq!(port.last_config().unwrap().baud_rate, 115200);
    }

    #[test]
    fn clones_share_state() {
        let mut a = MockTransport::new("MOCK0");
        let mut b = a.clone();
        a.enqueue_read(b"shared");

        let mut buffer = [0u8; 6];
        let n = b.read(&mut buffer).unwrap();
        assert_eq!(&buffer[..n], b"shared");
    }

    #[test]
    fn control_and_status_lines() {
        let mut port = MockTransport::new("MOCK0");
        assert_eq!(port.control_line(ControlLine::Rts), None);

        port.set_control_line(ControlLine::Rts, true).unwrap();
        port.set_control_line(ControlLine::Dtr, false).unwrap();
        assert_eq!(port.control_line(ControlLine::Rts), Some(true));
        assert_eq!(port.control_line(ControlLine::Dtr), Some(false));

        assert!(!port.read_status_line(StatusLine::Cts).unwrap());
        port.set_status_line(StatusLine::Cts, true);
        assert!(port.read_status_line(StatusLine::Cts).unwrap());
    }

    #[test]
    fn discard_input_clears_queue() {
        let mut port = MockTransport::new("MOCK0");
        port.enqueue_read(b"stale");
        port.discard_input().unwrap();
        assert!(port.input_discarded());
        assert_eq!(port.available_bytes(), 0);
    }

    #[test]
    fn opener_logs_and_fails_on_demand() {
        let opener = MockOpener::new(MockTransport::new("MOCK0"));
        let config = SerialConfig::default();

        opener.open(Some("MOCK0"), &config).unwrap();
        opener.fail_next_open("device is claimed");
        assert!(matches!(
            opener.open(None, &config),
            Err(SerialError::PortOpen(_))
        ));
        // The failure is one-shot, the next open succeeds again.
        opener.open(None, &config).unwrap();

        assert_eq!(
            opener.open_log(),
            vec![Some("MOCK0".to_owned()), None, None]
        );
    }
}
