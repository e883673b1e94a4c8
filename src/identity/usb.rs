//! Hardware EEPROM access over nusb.
//!
//! The FTDI configuration EEPROM is read and written one 16-bit word at a
//! time through vendor control transfers. This backend patches only the two
//! identity words (plus the image checksum word that protects them); the
//! rest of the EEPROM layout is the device vendor's business and passes
//! through untouched.

use std::time::Duration;

use nusb::transfer::{ControlIn, ControlOut, ControlType, Recipient};
use nusb::MaybeFuture;
use tracing::debug;

use super::{DeviceIdentity, IdentityEeprom, IdentityError};

/// Default FTDI vendor ID.
pub const FTDI_VID: u16 = 0x0403;

const SIO_READ_EEPROM_REQUEST: u8 = 0x90;
const SIO_WRITE_EEPROM_REQUEST: u8 = 0x91;

/// Largest EEPROM image across supported chips, in bytes.
const MAX_EEPROM_SIZE: usize = 256;

/// Byte offsets of the identity fields within the image.
const VENDOR_ID_OFFSET: usize = 0x02;
const PRODUCT_ID_OFFSET: usize = 0x04;

/// bcdDevice value reported by FT230X parts, whose EEPROM has a factory
/// section this backend must not touch.
const BCD_FT230X: u16 = 0x1000;

const TRANSFER_TIMEOUT: Duration = Duration::from_secs(5);

/// An FTDI device opened for EEPROM access.
pub struct UsbEeprom {
    #[allow(dead_code)] // Kept to ensure the USB device stays open
    device: nusb::Device,
    interface: nusb::Interface,
}

impl UsbEeprom {
    /// Open the first device carrying the FTDI vendor ID.
    pub fn open_first() -> Result<Self, IdentityError> {
        let info = nusb::list_devices()
            .wait()?
            .find(|d| d.vendor_id() == FTDI_VID)
            .ok_or(IdentityError::DeviceNotFound)?;
        Self::from_device_info(info)
    }

    /// Open the first device matching the given vendor and product IDs.
    ///
    /// Useful for devices whose identity was already rewritten away from
    /// the FTDI default.
    pub fn open_matching(vendor_id: u16, product_id: u16) -> Result<Self, IdentityError> {
        let info = nusb::list_devices()
            .wait()?
            .find(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
            .ok_or(IdentityError::DeviceNotFound)?;
        Self::from_device_info(info)
    }

    fn from_device_info(info: nusb::DeviceInfo) -> Result<Self, IdentityError> {
        let device = info.open().wait()?;
        let interface = device.detach_and_claim_interface(0).wait()?;

        if device.device_descriptor().device_version() == BCD_FT230X {
            return Err(IdentityError::Eeprom(
                "FT230X parts carry factory data this tool does not handle".into(),
            ));
        }

        Ok(Self { device, interface })
    }

    fn read_word(&self, addr: u16) -> Result<u16, IdentityError> {
        let data = self
            .interface
            .control_in(
                ControlIn {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request: SIO_READ_EEPROM_REQUEST,
                    value: 0,
                    index: addr,
                    length: 2,
                },
                TRANSFER_TIMEOUT,
            )
            .wait()?;
        if data.len() < 2 {
            return Err(IdentityError::Eeprom(format!(
                "short EEPROM read at word {addr:#x}"
            )));
        }
        Ok(u16::from_le_bytes([data[0], data[1]]))
    }

    fn write_word(&self, addr: u16, value: u16) -> Result<(), IdentityError> {
        self.interface
            .control_out(
                ControlOut {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request: SIO_WRITE_EEPROM_REQUEST,
                    value,
                    index: addr,
                    data: &[],
                },
                TRANSFER_TIMEOUT,
            )
            .wait()?;
        Ok(())
    }

    fn read_image(&self) -> Result<Vec<u8>, IdentityError> {
        let mut image = vec![0u8; MAX_EEPROM_SIZE];
        for word in 0..MAX_EEPROM_SIZE / 2 {
            let value = self.read_word(word as u16)?;
            image[word * 2..word * 2 + 2].copy_from_slice(&value.to_le_bytes());
        }
        Ok(image)
    }
}

/// Detect the EEPROM size from wraparound: smaller parts mirror their
/// contents across the 256-byte address window.
fn image_size(image: &[u8]) -> Result<usize, IdentityError> {
    if image.iter().all(|&b| b == 0xFF) {
        return Err(IdentityError::Eeprom(
            "EEPROM is blank; program it with vendor tooling first".into(),
        ));
    }
    if image[..0x40] == image[0x40..0x80] {
        Ok(0x40)
    } else if image[..0x80] == image[0x80..0x100] {
        Ok(0x80)
    } else {
        Ok(0x100)
    }
}

/// EEPROM image checksum: XOR each 16-bit word into an accumulator seeded
/// with 0xAAAA, rotating left by one after each word. The final word of the
/// image stores the result.
fn checksum(image: &[u8], size: usize) -> u16 {
    let mut csum: u16 = 0xAAAA;
    for word in 0..size / 2 - 1 {
        let value = u16::from_le_bytes([image[word * 2], image[word * 2 + 1]]);
        csum ^= value;
        csum = csum.rotate_left(1);
    }
    csum
}

impl IdentityEeprom for UsbEeprom {
    fn read_identity(&mut self) -> Result<DeviceIdentity, IdentityError> {
        let vendor_id = self.read_word((VENDOR_ID_OFFSET / 2) as u16)?;
        let product_id = self.read_word((PRODUCT_ID_OFFSET / 2) as u16)?;
        Ok(DeviceIdentity {
            vendor_id,
            product_id,
        })
    }

    fn write_identity(&mut self, identity: DeviceIdentity) -> Result<(), IdentityError> {
        let mut image = self.read_image()?;
        let size = image_size(&image)?;
        debug!(size, %identity, "patching EEPROM image");

        image[VENDOR_ID_OFFSET..VENDOR_ID_OFFSET + 2]
            .copy_from_slice(&identity.vendor_id.to_le_bytes());
        image[PRODUCT_ID_OFFSET..PRODUCT_ID_OFFSET + 2]
            .copy_from_slice(&identity.product_id.to_le_bytes());

        let csum = checksum(&image, size);
        image[size - 2..size].copy_from_slice(&csum.to_le_bytes());

        for word in 0..size / 2 {
            let value = u16::from_le_bytes([image[word * 2], image[word * 2 + 1]]);
            self.write_word(word as u16, value)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for UsbEeprom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsbEeprom").finish_non_exhaustive()
    }
}
