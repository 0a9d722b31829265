//! 24xx-Series I2C EEPROM Driver
//!
//! Two-byte addressing (24LC32 and up). Writes are split on page
//! boundaries; after each page the device is acknowledge-polled until it
//! finishes its internal write cycle.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::config::{
    EEPROM_CAPACITY, EEPROM_I2C_ADDR, EEPROM_PAGE_SIZE, EEPROM_WRITE_POLL_ATTEMPTS,
    EEPROM_WRITE_POLL_US,
};
use crate::storage::{NvStore, StoreError, StoreResult};

/// Largest page the driver buffers
pub const MAX_PAGE_SIZE: usize = 64;

/// 24xx EEPROM
pub struct Eeprom24x<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    capacity: usize,
    page_size: usize,
}

impl<I2C: I2c, D: DelayNs> Eeprom24x<I2C, D> {
    /// Create a driver for a device of `capacity` bytes
    ///
    /// `page_size` is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn new(i2c: I2C, delay: D, address: u8, capacity: usize, page_size: usize) -> Self {
        Self {
            i2c,
            delay,
            address,
            capacity: capacity.min(usize::from(u16::MAX) + 1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// 24LC64 at the board address
    pub fn m24c64(i2c: I2C, delay: D) -> Self {
        Self::new(i2c, delay, EEPROM_I2C_ADDR, EEPROM_CAPACITY, EEPROM_PAGE_SIZE)
    }

    /// Write page size in bytes
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Release the bus and delay
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn write_page(&mut self, address: u16, data: &[u8]) -> StoreResult<()> {
        let mut buf = [0u8; MAX_PAGE_SIZE + 2];
        let [hi, lo] = address.to_be_bytes();
        buf[0] = hi;
        buf[1] = lo;
        buf[2..2 + data.len()].copy_from_slice(data);
        self.i2c
            .write(self.address, &buf[..2 + data.len()])
            .map_err(|_| StoreError::Bus)?;
        self.wait_ready(address)
    }

    /// Acknowledge-poll until the write cycle completes
    fn wait_ready(&mut self, address: u16) -> StoreResult<()> {
        let pointer = address.to_be_bytes();
        for _ in 0..EEPROM_WRITE_POLL_ATTEMPTS {
            self.delay.delay_us(EEPROM_WRITE_POLL_US);
            if self.i2c.write(self.address, &pointer).is_ok() {
                return Ok(());
            }
        }
        warn!("EEPROM write cycle did not complete at 0x{:04X}", address);
        Err(StoreError::Timeout)
    }
}

impl<I2C: I2c, D: DelayNs> NvStore for Eeprom24x<I2C, D> {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn read(&mut self, address: u16, buf: &mut [u8]) -> StoreResult<()> {
        self.check_range(address, buf.len())?;
        if buf.is_empty() {
            return Ok(());
        }
        self.i2c
            .write_read(self.address, &address.to_be_bytes(), buf)
            .map_err(|_| StoreError::Bus)
    }

    fn write(&mut self, address: u16, data: &[u8]) -> StoreResult<()> {
        self.check_range(address, data.len())?;
        let mut offset = 0;
        while offset < data.len() {
            let at = usize::from(address) + offset;
            let room = self.page_size - at % self.page_size;
            let chunk = room.min(data.len() - offset);
            let page_address = u16::try_from(at).map_err(|_| StoreError::OutOfRange {
                address,
                len: data.len(),
            })?;
            self.write_page(page_address, &data[offset..offset + chunk])?;
            offset += chunk;
        }
        Ok(())
    }
}
