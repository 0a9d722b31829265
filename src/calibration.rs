//! Calibration
//!
//! Offset and scale correction of raw ADC windows, and the persisted
//! record those constants live in.
//! - `engine`: owns the constants and converts windows into amperes
//! - `record`: versioned byte layout in the non-volatile store

pub mod engine;
pub mod record;

use core::fmt;

pub use engine::{CalibrationEngine, LoadOutcome, Reading};
pub use record::CalibrationRecord;

use crate::storage::StoreError;

/// Calibration update failure
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CalibrationError {
    /// The store rejected the write; memory is unchanged
    Store(StoreError),
    /// Input was not a number
    NotANumber,
    /// Input parsed but is zero, non-finite or too large
    OutOfBounds(f32),
}

impl From<StoreError> for CalibrationError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "storage failure: {err}"),
            Self::NotANumber => f.write_str("not a number"),
            Self::OutOfBounds(value) => write!(f, "value {value} out of range"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CalibrationError {}

#[cfg(feature = "embedded")]
impl defmt::Format for CalibrationError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Store(err) => defmt::write!(f, "Store({})", err),
            Self::NotANumber => defmt::write!(f, "NotANumber"),
            Self::OutOfBounds(value) => defmt::write!(f, "OutOfBounds({})", value),
        }
    }
}
