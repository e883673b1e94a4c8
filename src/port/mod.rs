//! Port abstraction layer.
//!
//! Defines the validated configuration model, the transport boundary
//! traits, and the two transport implementations: real hardware over the
//! `serialport` crate and an in-memory mock for tests.

pub mod config;
pub mod error;
pub mod mock;
pub mod traits;
pub mod usb_port;

pub use config::{DataBits, Parity, SerialConfig, SerialSettings, StopBits};
pub use error::SerialError;
pub use mock::{MockOpener, MockTransport};
pub use traits::{ControlLine, StatusLine, Transport, TransportOpener};
pub use usb_port::{SystemOpener, UsbSerialTransport};
