//! Persisted Calibration Record
//!
//! Little-endian layout, 14 bytes for version 1:
//!
//! ```text
//! offset  size  field
//!      0     2  magic (0xCA1B)
//!      2     1  version
//!      3     1  payload length
//!      4     4  offset sum (i32)
//!      8     4  scale factor (f32)
//!     12     2  CRC-16/CCITT-FALSE over bytes 0..12
//! ```
//!
//! Later versions may append fields after the checksum; readers only
//! require the prefix they know.

use crc::{Crc, CRC_16_IBM_3740};

use crate::storage::{NvStore, StoreResult};
use crate::types::ScaleFactor;

/// Sentinel marking a programmed record
pub const MAGIC: u16 = 0xCA1B;

/// Layout version written by this firmware
pub const VERSION: u8 = 1;

/// Header bytes before the payload
const HEADER_LEN: usize = 4;

/// Payload bytes defined by version 1
const V1_PAYLOAD_LEN: u8 = 8;

/// Bytes covered by the checksum
const CHECKED_LEN: usize = HEADER_LEN + V1_PAYLOAD_LEN as usize;

/// Encoded record length
pub const RECORD_LEN: usize = CHECKED_LEN + 2;

/// CRC-16/CCITT-FALSE
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Recompute the checksum trailer of an encoded record
pub fn seal(bytes: &mut [u8; RECORD_LEN]) {
    let crc = CRC16.checksum(&bytes[..CHECKED_LEN]);
    bytes[CHECKED_LEN..].copy_from_slice(&crc.to_le_bytes());
}

/// Why stored bytes were not accepted as a record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordError {
    /// Sentinel absent, the store was never programmed
    BadMagic,
    /// Checksum does not match, the record is torn or corrupt
    BadChecksum,
    /// Version field is not one this firmware understands
    UnsupportedVersion(u8),
    /// Payload shorter than the version requires
    Truncated,
    /// Stored scale factor fails validation
    InvalidScale,
}

#[cfg(feature = "embedded")]
impl defmt::Format for RecordError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::BadMagic => defmt::write!(f, "BadMagic"),
            Self::BadChecksum => defmt::write!(f, "BadChecksum"),
            Self::UnsupportedVersion(v) => defmt::write!(f, "UnsupportedVersion({})", v),
            Self::Truncated => defmt::write!(f, "Truncated"),
            Self::InvalidScale => defmt::write!(f, "InvalidScale"),
        }
    }
}

/// Calibration constants as persisted
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationRecord {
    /// Sum of one window of zero-input samples, negated
    pub offset_sum: i32,
    /// Multiplier from ADC volts to amperes
    pub scale_factor: ScaleFactor,
}

impl CalibrationRecord {
    /// Factory defaults written on first boot
    pub const DEFAULT: Self = Self {
        offset_sum: 0,
        scale_factor: ScaleFactor::UNITY,
    };

    /// Serialize to the version 1 layout
    #[must_use]
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut bytes = [0u8; RECORD_LEN];
        bytes[0..2].copy_from_slice(&MAGIC.to_le_bytes());
        bytes[2] = VERSION;
        bytes[3] = V1_PAYLOAD_LEN;
        bytes[4..8].copy_from_slice(&self.offset_sum.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.scale_factor.get().to_le_bytes());
        seal(&mut bytes);
        bytes
    }

    /// Parse stored bytes
    pub fn decode(bytes: &[u8; RECORD_LEN]) -> Result<Self, RecordError> {
        if u16::from_le_bytes([bytes[0], bytes[1]]) != MAGIC {
            return Err(RecordError::BadMagic);
        }
        let stored = u16::from_le_bytes([bytes[CHECKED_LEN], bytes[CHECKED_LEN + 1]]);
        if CRC16.checksum(&bytes[..CHECKED_LEN]) != stored {
            return Err(RecordError::BadChecksum);
        }
        let version = bytes[2];
        if version < VERSION || version == 0xFF {
            return Err(RecordError::UnsupportedVersion(version));
        }
        if bytes[3] < V1_PAYLOAD_LEN {
            return Err(RecordError::Truncated);
        }

        let offset_sum = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let scale = f32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let scale_factor = ScaleFactor::new(scale).ok_or(RecordError::InvalidScale)?;

        Ok(Self {
            offset_sum,
            scale_factor,
        })
    }

    /// Read the record at `address`
    ///
    /// `Ok(Err(_))` means the bytes were read but do not hold a valid record.
    pub fn load<S: NvStore>(
        store: &mut S,
        address: u16,
    ) -> StoreResult<Result<Self, RecordError>> {
        let mut bytes = [0u8; RECORD_LEN];
        store.read(address, &mut bytes)?;
        Ok(Self::decode(&bytes))
    }

    /// Write the record at `address`
    pub fn save<S: NvStore>(&self, store: &mut S, address: u16) -> StoreResult<()> {
        store.write(address, &self.encode())
    }
}

impl Default for CalibrationRecord {
    fn default() -> Self {
        Self::DEFAULT
    }
}
