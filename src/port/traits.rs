//! Core traits for the transport boundary.
//!
//! [`Transport`] is the minimal capability set the adapter requires from an
//! underlying byte transport; [`TransportOpener`] covers acquisition so the
//! adapter can close and reopen when its port identifier changes. Real
//! hardware ([`UsbSerialTransport`](super::UsbSerialTransport)) and the test
//! double ([`MockTransport`](super::MockTransport)) implement both sides
//! interchangeably.

use std::fmt;

use super::config::SerialConfig;
use super::error::SerialError;

/// Output control lines the adapter can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlLine {
    /// Request To Send.
    Rts,
    /// Data Terminal Ready.
    Dtr,
}

/// Input status lines the adapter can sample.
///
/// Carrier Detect is deliberately absent: the wrapped FTDI transport has no
/// such line, and the adapter answers for it with a constant instead (see
/// [`FtdiSerial::cd`](crate::FtdiSerial::cd)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusLine {
    /// Clear To Send.
    Cts,
    /// Data Set Ready.
    Dsr,
    /// Ring Indicator.
    Ri,
}

/// An open byte transport under the adapter.
///
/// All calls block according to the transport's own semantics; the adapter
/// adds no timeout or retry logic on top.
pub trait Transport: Send + fmt::Debug {
    /// The display name of this transport.
    fn name(&self) -> &str;

    /// Apply the full configuration to the live transport.
    ///
    /// The adapter always pushes the entire configuration, never a single
    /// changed field, so the transport state matches the stored
    /// configuration after every successful call.
    fn reconfigure(&mut self, config: &SerialConfig) -> Result<(), SerialError>;

    /// Read available bytes into `buffer`, returning the count.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, SerialError>;

    /// Write bytes, returning the count actually accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, SerialError>;

    /// Block until all pending writes have drained.
    fn flush(&mut self) -> Result<(), SerialError>;

    /// Discard any unread data in the receive buffer. Best effort.
    fn discard_input(&mut self) -> Result<(), SerialError>;

    /// Discard any unsent data in the transmit buffer. Best effort.
    fn discard_output(&mut self) -> Result<(), SerialError>;

    /// Drive an output control line to the given logic level.
    fn set_control_line(&mut self, line: ControlLine, level: bool) -> Result<(), SerialError>;

    /// Sample an input status line.
    fn read_status_line(&mut self, line: StatusLine) -> Result<bool, SerialError>;

    /// Bytes currently available to read, when the transport can tell.
    fn bytes_to_read(&self) -> Option<usize> {
        None
    }
}

/// Acquires [`Transport`] handles from port identifiers.
pub trait TransportOpener: Send + fmt::Debug {
    /// Open the transport behind `port`, or the first available device when
    /// `port` is absent.
    ///
    /// Acquisition failures surface as [`SerialError::PortOpen`] and are
    /// never retried here.
    fn open(
        &self,
        port: Option<&str>,
        config: &SerialConfig,
    ) -> Result<Box<dyn Transport>, SerialError>;

    /// Compute the display string for a port identifier.
    fn display_name(&self, port: Option<&str>) -> String;
}
