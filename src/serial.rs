//! The serial-port compatibility adapter.
//!
//! [`FtdiSerial`] presents a uniform, validated serial-port interface over
//! an arbitrary byte transport, so code written against a conventional
//! serial-port API can drive an FTDI USB device unmodified. It owns one
//! [`SerialConfig`] and at most one open [`Transport`] handle; every setting
//! change re-validates, and while the port is open, re-applies the entire
//! configuration to the live transport.

use std::io;
use std::time::Duration;

use tracing::debug;

use crate::port::config::{timeout_from_secs, SerialSettings};
use crate::port::{
    ControlLine, DataBits, Parity, SerialConfig, SerialError, StatusLine, StopBits, SystemOpener,
    Transport, TransportOpener,
};

/// A serial port over an FTDI-style USB transport.
///
/// Single-threaded, synchronous, blocking throughout: reads and writes
/// block on the transport with no timeout enforced at this layer (the
/// timeout fields are stored and pushed to the transport, which enforces
/// what it can). There is no cancellation; a blocked read ends when the
/// transport returns or the port is closed out-of-band.
///
/// # Example
/// ```no_run
/// use ftdi_serial::{FtdiSerial, SerialConfig};
///
/// let config = SerialConfig { baud_rate: 115200, ..Default::default() };
/// let mut serial = FtdiSerial::open(Some("/dev/ttyUSB0"), config)?;
/// serial.write(b"AT\r\n")?;
/// # Ok::<(), ftdi_serial::SerialError>(())
/// ```
#[derive(Debug)]
pub struct FtdiSerial {
    opener: Box<dyn TransportOpener>,
    transport: Option<Box<dyn Transport>>,
    port: Option<String>,
    /// Display string for the current port identifier.
    portstr: String,
    config: SerialConfig,
}

impl FtdiSerial {
    /// Validate `config`, then open the device named by `port` (or the
    /// first available device) and apply the full configuration to it.
    ///
    /// A bad configuration fails with
    /// [`SerialError::InvalidConfiguration`] before any hardware is
    /// touched; acquisition failures surface as [`SerialError::PortOpen`].
    pub fn open(port: Option<&str>, config: SerialConfig) -> Result<Self, SerialError> {
        Self::open_with(Box::new(SystemOpener), port, config)
    }

    /// Like [`open`](Self::open), but with a caller-supplied opener.
    /// This is the injection seam the mock transport plugs into.
    pub fn open_with(
        opener: Box<dyn TransportOpener>,
        port: Option<&str>,
        config: SerialConfig,
    ) -> Result<Self, SerialError> {
        config.validate()?;
        let portstr = opener.display_name(port);
        let mut serial = Self {
            opener,
            transport: None,
            port: port.map(str::to_owned),
            portstr,
            config,
        };
        serial.open_transport()?;
        Ok(serial)
    }

    fn open_transport(&mut self) -> Result<(), SerialError> {
        let mut transport = self.opener.open(self.port.as_deref(), &self.config)?;
        transport.reconfigure(&self.config)?;
        debug!(port = %self.portstr, "port opened");
        self.transport = Some(transport);
        Ok(())
    }

    /// Whether the port is currently open.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// The display string of the current port identifier.
    pub fn name(&self) -> &str {
        &self.portstr
    }

    /// The configured port identifier, if one was given.
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// Release the transport handle. Closing an already-closed port is a
    /// no-op.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            debug!(port = %self.portstr, "port closed");
        }
    }

    fn transport_mut(&mut self) -> Result<&mut (dyn Transport + '_), SerialError> {
        match self.transport.as_deref_mut() {
            Some(transport) => Ok(transport),
            None => Err(SerialError::NotOpen),
        }
    }

    /// Push the entire current configuration to the transport when open.
    ///
    /// Always a full apply, never an incremental one: redundant writes are
    /// accepted in exchange for never leaving the transport in a
    /// half-updated state.
    fn reconfigure_if_open(&mut self) -> Result<(), SerialError> {
        let config = self.config.clone();
        match self.transport.as_deref_mut() {
            Some(transport) => transport.reconfigure(&config),
            None => Ok(()),
        }
    }
}

// ---- Validating setters and getters ----

impl FtdiSerial {
    /// Change the port identifier.
    ///
    /// When the port is open this is a full close/reopen cycle on the new
    /// identifier, not a live switch.
    pub fn set_port(&mut self, port: Option<&str>) -> Result<(), SerialError> {
        let was_open = self.is_open();
        if was_open {
            self.close();
        }
        self.port = port.map(str::to_owned);
        self.portstr = self.opener.display_name(port);
        if was_open {
            self.open_transport()?;
        }
        Ok(())
    }

    /// Change the baud rate. Zero is rejected and leaves the stored rate
    /// untouched.
    pub fn set_baudrate(&mut self, baud_rate: u32) -> Result<(), SerialError> {
        if baud_rate == 0 {
            return Err(SerialError::invalid_config("not a valid baud rate: 0"));
        }
        self.config.baud_rate = baud_rate;
        self.reconfigure_if_open()
    }

    pub fn baudrate(&self) -> u32 {
        self.config.baud_rate
    }

    /// Change the byte size. Out-of-set values cannot reach this method;
    /// convert raw counts with [`DataBits::try_from`] first.
    pub fn set_bytesize(&mut self, bytesize: DataBits) -> Result<(), SerialError> {
        self.config.data_bits = bytesize;
        self.reconfigure_if_open()
    }

    pub fn bytesize(&self) -> DataBits {
        self.config.data_bits
    }

    /// Change the parity mode.
    pub fn set_parity(&mut self, parity: Parity) -> Result<(), SerialError> {
        self.config.parity = parity;
        self.reconfigure_if_open()
    }

    pub fn parity(&self) -> Parity {
        self.config.parity
    }

    /// Change the stop-bit count.
    pub fn set_stopbits(&mut self, stopbits: StopBits) -> Result<(), SerialError> {
        self.config.stop_bits = stopbits;
        self.reconfigure_if_open()
    }

    pub fn stopbits(&self) -> StopBits {
        self.config.stop_bits
    }

    /// Change the read timeout. `None` blocks forever.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), SerialError> {
        self.config.timeout = timeout;
        self.reconfigure_if_open()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.config.timeout
    }

    /// Change the write timeout. Stored and pushed to the transport; not
    /// enforced at this layer.
    pub fn set_write_timeout(&mut self, timeout: Option<Duration>) -> Result<(), SerialError> {
        self.config.write_timeout = timeout;
        self.reconfigure_if_open()
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        self.config.write_timeout
    }

    /// Change the inter-character timeout. Stored and pushed to the
    /// transport; not enforced at this layer.
    pub fn set_inter_char_timeout(&mut self, timeout: Option<Duration>) -> Result<(), SerialError> {
        self.config.inter_char_timeout = timeout;
        self.reconfigure_if_open()
    }

    pub fn inter_char_timeout(&self) -> Option<Duration> {
        self.config.inter_char_timeout
    }

    /// Enable or disable software (XON/XOFF) flow control.
    pub fn set_xonxoff(&mut self, enabled: bool) -> Result<(), SerialError> {
        self.config.xon_xoff = enabled;
        self.reconfigure_if_open()
    }

    pub fn xonxoff(&self) -> bool {
        self.config.xon_xoff
    }

    /// Enable or disable hardware (RTS/CTS) flow control.
    pub fn set_rtscts(&mut self, enabled: bool) -> Result<(), SerialError> {
        self.config.rts_cts = enabled;
        self.reconfigure_if_open()
    }

    pub fn rtscts(&self) -> bool {
        self.config.rts_cts
    }

    /// Set DTR/DSR flow control. `None` resumes the default of following
    /// the RTS/CTS flag; `Some(_)` is an explicit override that stops
    /// following.
    pub fn set_dsrdtr(&mut self, enabled: Option<bool>) -> Result<(), SerialError> {
        self.config.dsr_dtr = enabled;
        self.reconfigure_if_open()
    }

    /// The effective DTR/DSR flow-control value.
    pub fn dsrdtr(&self) -> bool {
        self.config.dsr_dtr_enabled()
    }
}

// ---- Settings snapshot / restore ----

impl FtdiSerial {
    /// Snapshot every configuration field for later restoration with
    /// [`apply_settings`](Self::apply_settings).
    pub fn settings(&self) -> SerialSettings {
        SerialSettings::from_config(&self.config)
    }

    /// Restore a snapshot taken with [`settings`](Self::settings).
    ///
    /// Each field that differs from the current value goes through its
    /// normal validating setter, so reconfiguration semantics are the same
    /// as setting the field directly. Applying an unmodified snapshot
    /// changes nothing and pushes nothing to the transport.
    pub fn apply_settings(&mut self, settings: &SerialSettings) -> Result<(), SerialError> {
        if settings.baudrate != self.config.baud_rate {
            self.set_baudrate(settings.baudrate)?;
        }
        if settings.bytesize != self.config.data_bits {
            self.set_bytesize(settings.bytesize)?;
        }
        if settings.parity != self.config.parity {
            self.set_parity(settings.parity)?;
        }
        if settings.stopbits != self.config.stop_bits {
            self.set_stopbits(settings.stopbits)?;
        }
        if settings.xonxoff != self.config.xon_xoff {
            self.set_xonxoff(settings.xonxoff)?;
        }
        if settings.rtscts != self.config.rts_cts {
            self.set_rtscts(settings.rtscts)?;
        }
        // rtscts first: a follow-mode dsrdtr tracks it, and the comparison
        // below must see the restored value.
        if settings.dsrdtr != self.dsrdtr() {
            self.set_dsrdtr(Some(settings.dsrdtr))?;
        }
        let timeout = timeout_from_secs("timeout", settings.timeout)?;
        if timeout != self.config.timeout {
            self.set_timeout(timeout)?;
        }
        let write_timeout = timeout_from_secs("write timeout", settings.write_timeout)?;
        if write_timeout != self.config.write_timeout {
            self.set_write_timeout(write_timeout)?;
        }
        let inter_char = timeout_from_secs("inter-character timeout", settings.inter_char_timeout)?;
        if inter_char != self.config.inter_char_timeout {
            self.set_inter_char_timeout(inter_char)?;
        }
        Ok(())
    }
}

// ---- I/O forwarding ----

impl FtdiSerial {
    /// Read available bytes into `buffer`, blocking according to the
    /// transport's own semantics. Short reads are not an error; the call
    /// returns whatever the transport yields.
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<usize, SerialError> {
        self.transport_mut()?.read(buffer)
    }

    /// Write a buffer, returning the count the transport reports written.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, SerialError> {
        self.transport_mut()?.write(data)
    }

    /// Block until all pending writes have drained through the transport.
    pub fn flush(&mut self) -> Result<(), SerialError> {
        self.transport_mut()?.flush()
    }

    /// Discard the receive buffer. Best effort.
    pub fn flush_input(&mut self) -> Result<(), SerialError> {
        self.transport_mut()?.discard_input()
    }

    /// Discard the transmit buffer. Best effort.
    pub fn flush_output(&mut self) -> Result<(), SerialError> {
        self.transport_mut()?.discard_output()
    }

    /// Bytes currently available to read, when the transport can tell.
    pub fn in_waiting(&self) -> Option<usize> {
        self.transport.as_deref().and_then(Transport::bytes_to_read)
    }
}

// ---- Line state ----

impl FtdiSerial {
    /// Drive the RTS line to the given logic level.
    pub fn set_rts(&mut self, level: bool) -> Result<(), SerialError> {
        self.transport_mut()?.set_control_line(ControlLine::Rts, level)
    }

    /// Drive the DTR line to the given logic level.
    pub fn set_dtr(&mut self, level: bool) -> Result<(), SerialError> {
        self.transport_mut()?.set_control_line(ControlLine::Dtr, level)
    }

    /// The state of the CTS line.
    pub fn cts(&mut self) -> Result<bool, SerialError> {
        self.transport_mut()?.read_status_line(StatusLine::Cts)
    }

    /// The state of the DSR line.
    pub fn dsr(&mut self) -> Result<bool, SerialError> {
        self.transport_mut()?.read_status_line(StatusLine::Dsr)
    }

    /// The state of the RI line.
    pub fn ri(&mut self) -> Result<bool, SerialError> {
        self.transport_mut()?.read_status_line(StatusLine::Ri)
    }

    /// The state of the CD line.
    ///
    /// The transport has no carrier-detect line; this always reports "not
    /// asserted". A documented capability gap, not an error.
    pub fn cd(&self) -> bool {
        false
    }

    /// Send a timed break condition.
    ///
    /// The transport cannot signal a line break; this always fails with
    /// [`SerialError::Unsupported`].
    pub fn send_break(&mut self, _duration: Duration) -> Result<(), SerialError> {
        Err(SerialError::Unsupported("break signaling"))
    }

    /// Hold or release the break condition.
    ///
    /// The transport cannot signal a line break; this always fails with
    /// [`SerialError::Unsupported`].
    pub fn set_break(&mut self, _level: bool) -> Result<(), SerialError> {
        Err(SerialError::Unsupported("break signaling"))
    }
}

impl io::Read for FtdiSerial {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        FtdiSerial::read(self, buffer).map_err(io::Error::from)
    }
}

impl io::Write for FtdiSerial {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        FtdiSerial::write(self, data).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        FtdiSerial::flush(self).map_err(io::Error::from)
    }
}
