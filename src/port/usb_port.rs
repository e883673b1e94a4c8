//! Hardware transport over the `serialport` crate.
//!
//! The FTDI device shows up to the operating system as an ordinary USB-UART
//! (`/dev/ttyUSB*`, `COM*`); the `serialport` crate and the kernel driver
//! own the USB transfers, electrical signaling, and timeout enforcement.
//! This module only translates between [`SerialConfig`] and the backend's
//! vocabulary.

use std::io::{Read, Write};
use std::time::Duration;

use tracing::debug;

use super::config::SerialConfig;
use super::error::SerialError;
use super::traits::{ControlLine, StatusLine, Transport, TransportOpener};

/// The serialport backend requires a finite timeout; this stands in for
/// "block forever" when no read timeout is configured.
const READ_FOREVER: Duration = Duration::from_millis(u32::MAX as u64);

/// A real USB-serial transport wrapping `serialport::SerialPort`.
pub struct UsbSerialTransport {
    port: Box<dyn serialport::SerialPort>,
    name: String,
}

impl UsbSerialTransport {
    /// Open a transport on the named device and apply `config` to it.
    pub fn open(port_name: &str, config: &SerialConfig) -> Result<Self, SerialError> {
        config.validate()?;
        let port = serialport::new(port_name, config.baud_rate)
            .data_bits(data_bits_to_backend(config.data_bits))
            .parity(parity_to_backend(config.parity)?)
            .stop_bits(stop_bits_to_backend(config.stop_bits)?)
            .flow_control(flow_control_of(config))
            .timeout(read_timeout_of(config))
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => {
                    SerialError::port_open(format!("device not found: {port_name}"))
                }
                serialport::ErrorKind::InvalidInput => SerialError::invalid_config(e.to_string()),
                _ => SerialError::port_open(e.to_string()),
            })?;

        debug!(port = port_name, baud = config.baud_rate, "opened USB serial transport");
        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }

    /// Open the first serial device the system reports.
    pub fn first_available(config: &SerialConfig) -> Result<Self, SerialError> {
        let ports =
            serialport::available_ports().map_err(|e| SerialError::port_open(e.to_string()))?;
        let info = ports
            .into_iter()
            .next()
            .ok_or_else(|| SerialError::port_open("no serial devices present"))?;
        Self::open(&info.port_name, config)
    }
}

/// The read timeout pushed to the backend. Write and inter-character
/// timeouts are stored by the adapter but have no counterpart here.
fn read_timeout_of(config: &SerialConfig) -> Duration {
    config.timeout.unwrap_or(READ_FOREVER)
}

/// The backend models flow control as a single mode, so hardware flow
/// control (RTS/CTS or DTR/DSR) takes precedence over XON/XOFF when both
/// flags are set.
fn flow_control_of(config: &SerialConfig) -> serialport::FlowControl {
    if config.rts_cts || config.dsr_dtr_enabled() {
        serialport::FlowControl::Hardware
    } else if config.xon_xoff {
        serialport::FlowControl::Software
    } else {
        serialport::FlowControl::None
    }
}

fn data_bits_to_backend(bits: super::config::DataBits) -> serialport::DataBits {
    use super::config::DataBits;
    match bits {
        DataBits::Five => serialport::DataBits::Five,
        DataBits::Six => serialport::DataBits::Six,
        DataBits::Seven => serialport::DataBits::Seven,
        DataBits::Eight => serialport::DataBits::Eight,
    }
}

fn parity_to_backend(parity: super::config::Parity) -> Result<serialport::Parity, SerialError> {
    use super::config::Parity;
    match parity {
        Parity::None => Ok(serialport::Parity::None),
        Parity::Even => Ok(serialport::Parity::Even),
        Parity::Odd => Ok(serialport::Parity::Odd),
        Parity::Mark => Err(SerialError::Unsupported("mark parity")),
        Parity::Space => Err(SerialError::Unsupported("space parity")),
    }
}

fn stop_bits_to_backend(bits: super::config::StopBits) -> Result<serialport::StopBits, SerialError> {
    use super::config::StopBits;
    match bits {
        StopBits::One => Ok(serialport::StopBits::One),
        StopBits::Two => Ok(serialport::StopBits::Two),
        StopBits::OnePointFive => Err(SerialError::Unsupported("1.5 stop bits")),
    }
}

impl Transport for UsbSerialTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn reconfigure(&mut self, config: &SerialConfig) -> Result<(), SerialError> {
        config.validate()?;
        self.port.set_baud_rate(config.baud_rate)?;
        self.port.set_data_bits(data_bits_to_backend(config.data_bits))?;
        self.port.set_parity(parity_to_backend(config.parity)?)?;
        self.port.set_stop_bits(stop_bits_to_backend(config.stop_bits)?)?;
        self.port.set_flow_control(flow_control_of(config))?;
        self.port.set_timeout(read_timeout_of(config))?;
        debug!(port = %self.name, baud = config.baud_rate, "reconfigured transport");
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, SerialError> {
        self.port.read(buffer).map_err(SerialError::Io)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, SerialError> {
        self.port.write(data).map_err(SerialError::Io)
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        self.port.flush().map_err(SerialError::Io)
    }

    fn discard_input(&mut self) -> Result<(), SerialError> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(SerialError::Serial)
    }

    fn discard_output(&mut self) -> Result<(), SerialError> {
        self.port
            .clear(serialport::ClearBuffer::Output)
            .map_err(SerialError::Serial)
    }

    fn set_control_line(&mut self, line: ControlLine, level: bool) -> Result<(), SerialError> {
        match line {
            ControlLine::Rts => self.port.write_request_to_send(level),
            ControlLine::Dtr => self.port.write_data_terminal_ready(level),
        }
        .map_err(SerialError::Serial)
    }

    fn read_status_line(&mut self, line: StatusLine) -> Result<bool, SerialError> {
        match line {
            StatusLine::Cts => self.port.read_clear_to_send(),
            StatusLine::Dsr => self.port.read_data_set_ready(),
            StatusLine::Ri => self.port.read_ring_indicator(),
        }
        .map_err(SerialError::Serial)
    }

    fn bytes_to_read(&self) -> Option<usize> {
        self.port.bytes_to_read().ok().map(|n| n as usize)
    }
}

impl std::fmt::Debug for UsbSerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsbSerialTransport")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate().ok())
            .finish()
    }
}

/// Opens [`UsbSerialTransport`] handles from system port names.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl TransportOpener for SystemOpener {
    fn open(
        &self,
        port: Option<&str>,
        config: &SerialConfig,
    ) -> Result<Box<dyn Transport>, SerialError> {
        let transport = match port {
            Some(name) => UsbSerialTransport::open(name, config)?,
            None => UsbSerialTransport::first_available(config)?,
        };
        Ok(Box::new(transport))
    }

    fn display_name(&self, port: Option<&str>) -> String {
        port.map(str::to_owned)
            .unwrap_or_else(|| "<first available>".to_owned())
    }
}
