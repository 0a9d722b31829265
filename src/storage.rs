//! Non-volatile Storage
//!
//! Byte-addressed persistent storage used for the calibration record.
//! The EEPROM driver in `drivers::eeprom` implements [`NvStore`] on the
//! board; [`RamStore`] backs host tests and boards without an EEPROM.

use core::fmt;

/// Storage operation result
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// Access beyond the device capacity
    OutOfRange {
        /// First byte of the access
        address: u16,
        /// Access length in bytes
        len: usize,
    },
    /// Bus transaction failed
    Bus,
    /// Device did not finish its write cycle in time
    Timeout,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { address, len } => {
                write!(f, "access of {len} bytes at 0x{address:04X} out of range")
            }
            Self::Bus => f.write_str("storage bus error"),
            Self::Timeout => f.write_str("storage write timed out"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StoreError {}

#[cfg(feature = "embedded")]
impl defmt::Format for StoreError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::OutOfRange { address, len } => {
                defmt::write!(f, "OutOfRange(0x{:04X}+{})", address, len);
            }
            Self::Bus => defmt::write!(f, "Bus"),
            Self::Timeout => defmt::write!(f, "Timeout"),
        }
    }
}

/// Byte-addressed non-volatile storage
pub trait NvStore {
    /// Size of the device in bytes
    fn capacity(&self) -> usize;

    /// Fill `buf` from `address`
    fn read(&mut self, address: u16, buf: &mut [u8]) -> StoreResult<()>;

    /// Persist `data` at `address`; returns once the data is durable
    fn write(&mut self, address: u16, data: &[u8]) -> StoreResult<()>;

    /// Check that an access fits in the device
    fn check_range(&self, address: u16, len: usize) -> StoreResult<()> {
        if usize::from(address) + len > self.capacity() {
            Err(StoreError::OutOfRange { address, len })
        } else {
            Ok(())
        }
    }
}

impl<T: NvStore + ?Sized> NvStore for &mut T {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn read(&mut self, address: u16, buf: &mut [u8]) -> StoreResult<()> {
        (**self).read(address, buf)
    }

    fn write(&mut self, address: u16, data: &[u8]) -> StoreResult<()> {
        (**self).write(address, data)
    }
}

/// RAM-backed store
///
/// Starts erased (all `0xFF`), like a blank EEPROM.
pub struct RamStore<const N: usize> {
    bytes: [u8; N],
    writes: u32,
}

impl<const N: usize> RamStore<N> {
    /// Create an erased store
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: [0xFF; N],
            writes: 0,
        }
    }

    /// Raw contents
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of completed write operations
    #[must_use]
    pub const fn write_count(&self) -> u32 {
        self.writes
    }
}

impl<const N: usize> Default for RamStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> NvStore for RamStore<N> {
    fn capacity(&self) -> usize {
        N
    }

    fn read(&mut self, address: u16, buf: &mut [u8]) -> StoreResult<()> {
        self.check_range(address, buf.len())?;
        let start = usize::from(address);
        buf.copy_from_slice(&self.bytes[start..start + buf.len()]);
        Ok(())
    }

    fn write(&mut self, address: u16, data: &[u8]) -> StoreResult<()> {
        self.check_range(address, data.len())?;
        let start = usize::from(address);
        self.bytes[start..start + data.len()].copy_from_slice(data);
        self.writes += 1;
        Ok(())
    }
}
