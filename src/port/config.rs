//! Validated serial line configuration.
//!
//! [`SerialConfig`] is the single entity of record for the adapter: baud
//! rate, framing, timeouts, and flow-control flags. The enumerated fields
//! make out-of-range values unrepresentable; the fallible `TryFrom`
//! conversions are where raw wire values (byte counts, parity characters,
//! stop-bit numbers) are checked against the fixed sets.
//!
//! [`SerialSettings`] is the flat snapshot form used by
//! [`FtdiSerial::settings`](crate::FtdiSerial::settings) and
//! [`FtdiSerial::apply_settings`](crate::FtdiSerial::apply_settings). Its
//! serde representation keeps the original field names and value encodings
//! (`parity: "N"`, `stopbits: 1.5`, timeouts in seconds) so snapshots stay
//! interchangeable with configuration files written for the original tool.

use std::fmt;
use std::time::Duration;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::SerialError;

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl DataBits {
    /// The number of bits as a plain integer.
    pub fn bits(self) -> u8 {
        match self {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

impl TryFrom<u8> for DataBits {
    type Error = SerialError;

    fn try_from(bits: u8) -> Result<Self, SerialError> {
        match bits {
            5 => Ok(DataBits::Five),
            6 => Ok(DataBits::Six),
            7 => Ok(DataBits::Seven),
            8 => Ok(DataBits::Eight),
            other => Err(SerialError::invalid_config(format!(
                "not a valid byte size: {other}"
            ))),
        }
    }
}

impl Serialize for DataBits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for DataBits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        DataBits::try_from(bits).map_err(D::Error::custom)
    }
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
    Mark,
    Space,
}

impl Parity {
    /// The single-character wire code (`'N'`, `'E'`, `'O'`, `'M'`, `'S'`).
    pub fn code(self) -> char {
        match self {
            Parity::None => 'N',
            Parity::Even => 'E',
            Parity::Odd => 'O',
            Parity::Mark => 'M',
            Parity::Space => 'S',
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Parity::None => "None",
            Parity::Even => "Even",
            Parity::Odd => "Odd",
            Parity::Mark => "Mark",
            Parity::Space => "Space",
        };
        f.write_str(name)
    }
}

impl TryFrom<char> for Parity {
    type Error = SerialError;

    fn try_from(code: char) -> Result<Self, SerialError> {
        match code {
            'N' => Ok(Parity::None),
            'E' => Ok(Parity::Even),
            'O' => Ok(Parity::Odd),
            'M' => Ok(Parity::Mark),
            'S' => Ok(Parity::Space),
            other => Err(SerialError::invalid_config(format!(
                "not a valid parity: {other:?}"
            ))),
        }
    }
}

impl Serialize for Parity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.code())
    }
}

impl<'de> Deserialize<'de> for Parity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = char::deserialize(deserializer)?;
        Parity::try_from(code).map_err(D::Error::custom)
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    OnePointFive,
    Two,
}

impl StopBits {
    /// The stop-bit count as a number (1, 1.5, or 2).
    pub fn value(self) -> f64 {
        match self {
            StopBits::One => 1.0,
            StopBits::OnePointFive => 1.5,
            StopBits::Two => 2.0,
        }
    }

    /// Convert from the numeric wire form.
    pub fn try_from_value(value: f64) -> Result<Self, SerialError> {
        if value == 1.0 {
            Ok(StopBits::One)
        } else if value == 1.5 {
            Ok(StopBits::OnePointFive)
        } else if value == 2.0 {
            Ok(StopBits::Two)
        } else {
            Err(SerialError::invalid_config(format!(
                "not a valid stop bit count: {value:?}"
            )))
        }
    }
}

impl Serialize for StopBits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StopBits::One => serializer.serialize_u8(1),
            StopBits::OnePointFive => serializer.serialize_f64(1.5),
            StopBits::Two => serializer.serialize_u8(2),
        }
    }
}

impl<'de> Deserialize<'de> for StopBits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        StopBits::try_from_value(value).map_err(D::Error::custom)
    }
}

/// Full serial line configuration.
///
/// Constructed with [`Default`] (9600 baud, 8N1, no timeouts, no flow
/// control) and then overridden field by field. The adapter re-validates on
/// every mutation; [`validate`](Self::validate) is also called before any
/// open or reconfigure so a bad configuration never touches hardware.
#[derive(Debug, Clone, PartialEq)]
pub struct SerialConfig {
    /// Baud rate in bits per second. Must be greater than zero.
    pub baud_rate: u32,

    /// Number of data bits per character.
    pub data_bits: DataBits,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bits: StopBits,

    /// Read timeout. `None` blocks forever.
    pub timeout: Option<Duration>,

    /// Write timeout. `None` blocks forever.
    pub write_timeout: Option<Duration>,

    /// Inter-character read timeout. Stored and pushed to the transport,
    /// never enforced at this layer.
    pub inter_char_timeout: Option<Duration>,

    /// Software (XON/XOFF) flow control.
    pub xon_xoff: bool,

    /// Hardware (RTS/CTS) flow control.
    pub rts_cts: bool,

    /// DTR/DSR flow control. `None` means "follow [`rts_cts`](Self::rts_cts)";
    /// `Some(_)` is an explicit override that stops following. Use
    /// [`dsr_dtr_enabled`](Self::dsr_dtr_enabled) for the effective value.
    pub dsr_dtr: Option<bool>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: None,
            write_timeout: None,
            inter_char_timeout: None,
            xon_xoff: false,
            rts_cts: false,
            dsr_dtr: None,
        }
    }
}

impl SerialConfig {
    /// The effective DTR/DSR flow-control value, resolving the
    /// follow-RTS/CTS default.
    pub fn dsr_dtr_enabled(&self) -> bool {
        self.dsr_dtr.unwrap_or(self.rts_cts)
    }

    /// Check the range invariants that the types cannot express.
    pub fn validate(&self) -> Result<(), SerialError> {
        if self.baud_rate == 0 {
            return Err(SerialError::invalid_config("not a valid baud rate: 0"));
        }
        Ok(())
    }
}

/// Flat snapshot of every [`SerialConfig`] field, for save and restore.
///
/// The snapshot is complete by construction: every field is present, and a
/// serialized snapshot missing a key fails to deserialize. Restoring goes
/// through the adapter's validating setters, never raw field writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerialSettings {
    pub baudrate: u32,
    pub bytesize: DataBits,
    pub parity: Parity,
    pub stopbits: StopBits,
    pub xonxoff: bool,
    /// Effective DTR/DSR flow-control value at snapshot time.
    pub dsrdtr: bool,
    pub rtscts: bool,
    /// Read timeout in seconds, `null` for none.
    pub timeout: Option<f64>,
    /// Write timeout in seconds, `null` for none.
    #[serde(rename = "writeTimeout")]
    pub write_timeout: Option<f64>,
    /// Inter-character timeout in seconds, `null` for none.
    #[serde(rename = "interCharTimeout")]
    pub inter_char_timeout: Option<f64>,
}

impl SerialSettings {
    pub(crate) fn from_config(config: &SerialConfig) -> Self {
        Self {
            baudrate: config.baud_rate,
            bytesize: config.data_bits,
            parity: config.parity,
            stopbits: config.stop_bits,
            xonxoff: config.xon_xoff,
            dsrdtr: config.dsr_dtr_enabled(),
            rtscts: config.rts_cts,
            timeout: timeout_to_secs(config.timeout),
            write_timeout: timeout_to_secs(config.write_timeout),
            inter_char_timeout: timeout_to_secs(config.inter_char_timeout),
        }
    }
}

/// Convert a timeout in seconds to a `Duration`, rejecting negative and
/// non-finite values.
pub(crate) fn timeout_from_secs(
    field: &str,
    secs: Option<f64>,
) -> Result<Option<Duration>, SerialError> {
    match secs {
        None => Ok(None),
        Some(s) => Duration::try_from_secs_f64(s).map(Some).map_err(|_| {
            SerialError::invalid_config(format!("not a valid {field}: {s:?}"))
        }),
    }
}

pub(crate) fn timeout_to_secs(timeout: Option<Duration>) -> Option<f64> {
    timeout.map(|t| t.as_secs_f64())
}
