//! FTDI USB-serial compatibility layer.
//!
//! Makes an FTDI-style USB device usable through a uniform, validated
//! serial-port interface, plus tooling to reprogram a device's EEPROM
//! identity.
//!
//! # Modules
//!
//! - `port`: configuration model, transport boundary, and the hardware and
//!   mock transports
//! - `serial`: the [`FtdiSerial`] compatibility adapter
//! - `identity`: EEPROM vendor/product ID reprogramming
//! - `error`: unified error type for the command-line tools
//!
//! # Quick start
//!
//! ```no_run
//! use ftdi_serial::{FtdiSerial, SerialConfig};
//!
//! let config = SerialConfig { baud_rate: 115200, ..Default::default() };
//! let mut serial = FtdiSerial::open(None, config)?;
//! let mut buffer = [0u8; 64];
//! let n = serial.read(&mut buffer)?;
//! # let _ = n;
//! # Ok::<(), ftdi_serial::SerialError>(())
//! ```

pub mod error;
pub mod identity;
pub mod port;
pub mod serial;

// Re-export commonly used types for convenience
pub use error::AppError;
pub use identity::{DeviceIdentity, IdentityEeprom, IdentityError, ReprogramReport, UsbEeprom};
pub use port::{
    ControlLine, DataBits, MockOpener, MockTransport, Parity, SerialConfig, SerialError,
    SerialSettings, StatusLine, StopBits, SystemOpener, Transport, TransportOpener,
    UsbSerialTransport,
};
pub use serial::FtdiSerial;
