use std::fmt::Debug;

use embedded_hal::i2c::I2c;
use thiserror::Error;

use super::{
    event::{Contact, Size},
    registers::{self, ContactRegisters, Register, StatusFlags, MAX_CONTACTS},
    AxisConfig,
};

/// Times a single bus transaction is attempted before its failure is
/// propagated. Transient NAKs during panel scans are common enough that a
/// single attempt would make the daemon flaky.
const TRANSACTION_ATTEMPTS: u32 = 3;

/// Errors returned by the GT911 driver.
#[derive(Debug, Error)]
pub enum DriverError<E: Debug> {
    /// A bus transaction failed after exhausting its retry budget.
    #[error("i2c transaction failed: {0:?}")]
    Transport(E),
    /// A contact slot outside the controller's range was requested.
    #[error("contact slot {0} out of range 0..{max}", max = MAX_CONTACTS)]
    InvalidSlot(u8),
    /// A combined read was requested with no registers to read.
    #[error("zero-length register read")]
    EmptyRead,
}

/// Protocol driver for the GT911 over an I2C bus.
///
/// The driver owns the bus handle and the configured axis transform. Call
/// [`initialize`](Driver::initialize) once before polling; it verifies the
/// controller's identity and caches the reported boundary and resolution.
#[derive(Debug)]
pub struct Driver<I2C> {
    i2c: I2C,
    address: u8,
    axis: AxisConfig,
    /// Largest coordinates the controller will report, scaled and oriented.
    boundary: Size,
    /// Coordinate resolution, scaled and oriented. Sizes the virtual
    /// device's axis ranges.
    resolution: Size,
    /// Resolution in the controller's own axes, scaled but never swapped.
    /// Flips reflect against this.
    native_resolution: Size,
}

impl<I2C: I2c> Driver<I2C> {
    pub fn new(i2c: I2C, address: u8, axis: AxisConfig) -> Self {
        Self {
            i2c,
            address,
            axis,
            boundary: Size::default(),
            resolution: Size::default(),
            native_resolution: Size::default(),
        }
    }

    /// Verifies the controller's identity and runs the one-time metadata
    /// queries.
    pub fn initialize(&mut self) -> Result<(), DriverError<I2C::Error>> {
        let mut product_id = [0; 4];
        self.read_registers(registers::PRODUCT_ID, &mut product_id)?;
        let firmware = self.read_combined(&registers::FIRMWARE_VERSION)?;
        let product = String::from_utf8_lossy(&product_id);
        let product = product.trim_end_matches('\0');
        log::debug!("Product id: {product}, firmware version: 0x{firmware:04x}");
        if !product_id.starts_with(b"911") {
            log::warn!("Unexpected product id {product_id:?}; is this a GT911?");
        }

        let boundary = self.query_size(&registers::X_OUTPUT_MAX, &registers::Y_OUTPUT_MAX)?;
        self.boundary = self.axis.oriented(boundary);
        self.native_resolution =
            self.query_size(&registers::X_RESOLUTION, &registers::Y_RESOLUTION)?;
        self.resolution = self.axis.oriented(self.native_resolution);
        log::debug!(
            "Touch boundary: {:?}, coordinate resolution: {:?}",
            self.boundary,
            self.resolution
        );

        Ok(())
    }

    /// Largest coordinates the controller will report, scaled and oriented.
    pub fn boundary(&self) -> Size {
        self.boundary
    }

    /// Coordinate resolution, scaled and oriented.
    pub fn resolution(&self) -> Size {
        self.resolution
    }

    /// Reads one byte from the given register.
    pub fn read_register(&mut self, register: Register) -> Result<u8, DriverError<I2C::Error>> {
        let mut value = [0];
        self.read_registers(register, &mut value)?;
        Ok(value[0])
    }

    /// Reads `buf.len()` bytes starting at the given register: the address
    /// pair is written, then the payload is read back, in one transaction.
    pub fn read_registers(
        &mut self,
        register: Register,
        buf: &mut [u8],
    ) -> Result<(), DriverError<I2C::Error>> {
        if buf.is_empty() {
            return Err(DriverError::EmptyRead);
        }
        let address = self.address;
        let register = register.to_bytes();
        self.retry(|i2c| i2c.write_read(address, &register, buf))
    }

    /// Writes the payload to the given register: the address pair followed
    /// by the data, in one transaction.
    pub fn write_registers(
        &mut self,
        register: Register,
        data: &[u8],
    ) -> Result<(), DriverError<I2C::Error>> {
        let mut message = Vec::with_capacity(2 + data.len());
        message.extend_from_slice(&register.to_bytes());
        message.extend_from_slice(data);
        let address = self.address;
        self.retry(|i2c| i2c.write(address, &message))
    }

    /// Reads one byte from each register and combines them little-endian:
    /// the first register supplies the least significant byte. The register
    /// order must match the field's combine order in the register map.
    pub fn read_combined(
        &mut self,
        registers: &[Register],
    ) -> Result<u32, DriverError<I2C::Error>> {
        if registers.is_empty() {
            return Err(DriverError::EmptyRead);
        }
        let mut value: u32 = 0;
        for (i, &register) in registers.iter().enumerate() {
            value |= u32::from(self.read_register(register)?) << (8 * i);
        }
        Ok(value)
    }

    /// Reads and decodes the coordinate status register.
    pub fn read_status(&mut self) -> Result<StatusFlags, DriverError<I2C::Error>> {
        Ok(StatusFlags::from_byte(self.read_register(registers::STATUS)?))
    }

    /// Acknowledges the current frame so the controller will publish the
    /// next one. Must run after every consumed frame, even an empty one.
    pub fn clear_buffer(&mut self) -> Result<(), DriverError<I2C::Error>> {
        self.write_registers(registers::STATUS, &[0])
    }

    /// Reads one contact slot and applies the configured axis transform to
    /// its coordinates.
    pub fn query_contact(&mut self, slot: u8) -> Result<Contact, DriverError<I2C::Error>> {
        let regs = ContactRegisters::for_slot(slot).ok_or(DriverError::InvalidSlot(slot))?;
        let raw_x = self.read_combined(&regs.x)?;
        let raw_y = self.read_combined(&regs.y)?;
        let size = self.read_combined(&regs.size)?;
        let track_id = self.read_register(regs.track_id)?;
        let (x, y) = self.axis.transform(self.native_resolution, raw_x, raw_y);
        Ok(Contact {
            track_id,
            x,
            y,
            size,
        })
    }

    /// Reads a scaled width/height field pair. Swapping is left to the
    /// caller since flips need the unswapped value.
    fn query_size(
        &mut self,
        x: &[Register; 2],
        y: &[Register; 2],
    ) -> Result<Size, DriverError<I2C::Error>> {
        Ok(Size {
            width: self.read_combined(x)?.saturating_mul(self.axis.scaling),
            height: self.read_combined(y)?.saturating_mul(self.axis.scaling),
        })
    }

    /// Runs one bus transaction, retrying transient failures up to the
    /// attempt budget before giving up.
    fn retry<T>(
        &mut self,
        mut op: impl FnMut(&mut I2C) -> Result<T, I2C::Error>,
    ) -> Result<T, DriverError<I2C::Error>> {
        let mut attempt = 1;
        loop {
            match op(&mut self.i2c) {
                Ok(value) => return Ok(value),
                Err(e) if attempt < TRANSACTION_ATTEMPTS => {
                    log::debug!(
                        "I2C transaction failed (attempt {attempt}/{TRANSACTION_ATTEMPTS}): {e:?}"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(DriverError::Transport(e)),
            }
        }
    }
}
