//! Serial-port error types.
//!
//! Errors are raised at the point of failure and propagate unchanged to the
//! caller; nothing is caught, logged, or retried inside this crate.

use thiserror::Error;

/// Errors that can occur while configuring or using a serial port.
#[derive(Debug, Error)]
pub enum SerialError {
    /// A setting failed validation before reaching any hardware.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The underlying transport could not be acquired (device absent,
    /// already claimed, permission denied).
    #[error("could not open port: {0}")]
    PortOpen(String),

    /// Attempted to use a port that is not open.
    #[error("port is not open")]
    NotOpen,

    /// The operation has no backing on this transport.
    ///
    /// Break signaling is the main case: FTDI-style transports cannot
    /// express it, and the adapter fails loudly rather than silently
    /// dropping the request.
    #[error("operation not supported by this transport: {0}")]
    Unsupported(&'static str),

    /// An I/O error occurred during a read, write, or flush.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the serialport backend.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl SerialError {
    /// Create an `InvalidConfiguration` error from a message.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// Create a `PortOpen` error from a message.
    pub fn port_open(message: impl Into<String>) -> Self {
        Self::PortOpen(message.into())
    }
}

impl From<SerialError> for std::io::Error {
    fn from(err: SerialError) -> Self {
        use std::io::ErrorKind;
        match err {
            SerialError::Io(e) => e,
            SerialError::Serial(e) => e.into(),
            SerialError::NotOpen => std::io::Error::new(ErrorKind::NotConnected, SerialError::NotOpen),
            other => std::io::Error::other(other),
        }
    }
}
