//! EEPROM identity reprogramming.
//!
//! An FTDI device's USB identity (vendor and product ID) lives in its
//! configuration EEPROM. This module reprograms it with the original tool's
//! fixed linear sequence: read the old identity, write the new one, read it
//! back once, and report. There is no retry; the single read-back is the
//! only verification step.
//!
//! [`IdentityEeprom`] is the device-management boundary; [`UsbEeprom`] is
//! the hardware implementation.

pub mod usb;

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

pub use usb::UsbEeprom;

/// Errors from identity reprogramming.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No matching FTDI device was found on the bus.
    #[error("no matching FTDI device found")]
    DeviceNotFound,

    /// An error from the nusb USB layer.
    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),

    /// A USB transfer error.
    #[error("USB transfer error: {0}")]
    Transfer(#[from] nusb::transfer::TransferError),

    /// The EEPROM contents could not be read or rewritten.
    #[error("EEPROM error: {0}")]
    Eeprom(String),
}

/// A device's USB identity as stored in its EEPROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// Access to the identity fields of a device's EEPROM.
pub trait IdentityEeprom {
    /// Read the identity currently stored in the EEPROM.
    fn read_identity(&mut self) -> Result<DeviceIdentity, IdentityError>;

    /// Store a new identity in the EEPROM.
    fn write_identity(&mut self, identity: DeviceIdentity) -> Result<(), IdentityError>;
}

/// Before/after record of a reprogramming run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReprogramReport {
    /// Identity found in the EEPROM before writing.
    pub old: DeviceIdentity,
    /// Identity read back after writing.
    pub new: DeviceIdentity,
}

impl ReprogramReport {
    /// Whether the read-back matches the requested identity.
    pub fn verified(&self, wanted: DeviceIdentity) -> bool {
        self.new == wanted
    }
}

/// Write `target` to the device's EEPROM and read it back once.
///
/// Returns the before/after identities; the caller decides what a failed
/// verification means (the CLI exits non-zero). I/O failures at any step
/// propagate immediately.
pub fn reprogram(
    device: &mut dyn IdentityEeprom,
    target: DeviceIdentity,
) -> Result<ReprogramReport, IdentityError> {
    let old = device.read_identity()?;
    debug!(%old, %target, "reprogramming EEPROM identity");

    device.write_identity(target)?;

    let new = device.read_identity()?;
    info!(%old, %new, "EEPROM identity rewritten");
    Ok(ReprogramReport { old, new })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted EEPROM double. When `sticky` is set, writes are accepted
    /// but the stored identity never changes, like a write-protected part.
    struct ScriptedEeprom {
        identity: DeviceIdentity,
        sticky: bool,
        writes: Vec<DeviceIdentity>,
    }

    impl ScriptedEeprom {
        fn new(vendor_id: u16, product_id: u16) -> Self {
            Self {
                identity: DeviceIdentity {
                    vendor_id,
                    product_id,
                },
                sticky: false,
                writes: Vec::new(),
            }
        }
    }

    impl IdentityEeprom for ScriptedEeprom {
        fn read_identity(&mut self) -> Result<DeviceIdentity, IdentityError> {
            Ok(self.identity)
        }

        fn write_identity(&mut self, identity: DeviceIdentity) -> Result<(), IdentityError> {
            self.writes.push(identity);
            if !self.sticky {
                self.identity = identity;
            }
            Ok(())
        }
    }

    #[test]
    fn reprogram_reports_before_and_after() {
        let mut eeprom = ScriptedEeprom::new(0x0403, 0x6010);
        let target = DeviceIdentity {
            vendor_id: 0x0000,
            product_id: 0x6010,
        };

        let report = reprogram(&mut eeprom, target).unwrap();
        assert_eq!(report.old.vendor_id, 0x0403);
        assert_eq!(report.new, target);
        assert!(report.verified(target));
        assert_eq!(eeprom.writes, vec![target]);
    }

    #[test]
    fn failed_verification_is_reported_not_retried() {
        let mut eeprom = ScriptedEeprom::new(0x0403, 0x6001);
        eeprom.sticky = true;
        let target = DeviceIdentity {
            vendor_id: 0x1234,
            product_id: 0x5678,
        };

        let report = reprogram(&mut eeprom, target).unwrap();
        assert!(!report.verified(target));
        assert_eq!(report.new, report.old);
        // exactly one write attempt, no retry loop
        assert_eq!(eeprom.writes.len(), 1);
    }

    #[test]
    fn identity_display_is_vid_pid() {
        let identity = DeviceIdentity {
            vendor_id: 0x0403,
            product_id: 0x6010,
        };
        assert_eq!(identity.to_string(), "0403:6010");
    }
}
