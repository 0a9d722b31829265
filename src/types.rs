//! Shared types used across the ammeter firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time and provide type safety throughout the codebase.

use core::fmt;
#[cfg(feature = "embedded")]
use micromath::F32Ext;

use crate::config::{
    ADC_FULL_SCALE_CODE, DEFAULT_DATA_RATE, DEFAULT_GAIN, SAMPLES_PER_WINDOW, SCALE_FACTOR_LIMIT,
};

/// Programmable gain amplifier setting of the ADS1115
///
/// Each setting fixes the input voltage that maps to the full-scale code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Gain {
    /// ±6.144 V full scale (gain 2/3)
    Fsr6V144,
    /// ±4.096 V full scale (gain 1)
    #[default]
    Fsr4V096,
    /// ±2.048 V full scale (gain 2)
    Fsr2V048,
    /// ±1.024 V full scale (gain 4)
    Fsr1V024,
    /// ±0.512 V full scale (gain 8)
    Fsr0V512,
    /// ±0.256 V full scale (gain 16)
    Fsr0V256,
}

impl Gain {
    /// PGA field value for the config register (bits 11:9)
    #[must_use]
    pub const fn as_reg(self) -> u16 {
        match self {
            Self::Fsr6V144 => 0b000,
            Self::Fsr4V096 => 0b001,
            Self::Fsr2V048 => 0b010,
            Self::Fsr1V024 => 0b011,
            Self::Fsr0V512 => 0b100,
            Self::Fsr0V256 => 0b101,
        }
    }

    /// Input voltage corresponding to the full-scale code
    #[must_use]
    pub const fn full_scale_volts(self) -> f32 {
        match self {
            Self::Fsr6V144 => 6.144,
            Self::Fsr4V096 => 4.096,
            Self::Fsr2V048 => 2.048,
            Self::Fsr1V024 => 1.024,
            Self::Fsr0V512 => 0.512,
            Self::Fsr0V256 => 0.256,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Gain {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "+/-{} V", self.full_scale_volts());
    }
}

/// Conversion rate of the ADS1115 in samples per second
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DataRate {
    /// 8 SPS
    Sps8,
    /// 16 SPS
    Sps16,
    /// 32 SPS
    Sps32,
    /// 64 SPS
    Sps64,
    /// 128 SPS
    Sps128,
    /// 250 SPS
    Sps250,
    /// 475 SPS
    Sps475,
    /// 860 SPS
    #[default]
    Sps860,
}

impl DataRate {
    /// DR field value for the config register (bits 7:5)
    #[must_use]
    pub const fn as_reg(self) -> u16 {
        match self {
            Self::Sps8 => 0b000,
            Self::Sps16 => 0b001,
            Self::Sps32 => 0b010,
            Self::Sps64 => 0b011,
            Self::Sps128 => 0b100,
            Self::Sps250 => 0b101,
            Self::Sps475 => 0b110,
            Self::Sps860 => 0b111,
        }
    }

    /// Conversions per second
    #[must_use]
    pub const fn samples_per_second(self) -> u32 {
        match self {
            Self::Sps8 => 8,
            Self::Sps16 => 16,
            Self::Sps32 => 32,
            Self::Sps64 => 64,
            Self::Sps128 => 128,
            Self::Sps250 => 250,
            Self::Sps475 => 475,
            Self::Sps860 => 860,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for DataRate {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} SPS", self.samples_per_second());
    }
}

/// Runtime acquisition parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcquisitionSettings {
    /// PGA setting
    pub gain: Gain,
    /// Conversion rate
    pub data_rate: DataRate,
    /// Number of raw samples averaged into one reading
    pub samples_per_window: u16,
}

impl AcquisitionSettings {
    /// Full-scale input voltage for the configured gain
    #[must_use]
    pub const fn full_scale_volts(&self) -> f32 {
        self.gain.full_scale_volts()
    }

    /// Code reported by the converter at positive full scale
    #[must_use]
    pub const fn full_scale_code(&self) -> u16 {
        ADC_FULL_SCALE_CODE
    }

    /// Completed windows per second
    #[must_use]
    pub fn readings_per_second(&self) -> f32 {
        if self.samples_per_window == 0 {
            return 0.0;
        }
        self.data_rate.samples_per_second() as f32 / f32::from(self.samples_per_window)
    }
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            gain: DEFAULT_GAIN,
            data_rate: DEFAULT_DATA_RATE,
            samples_per_window: SAMPLES_PER_WINDOW,
        }
    }
}

/// Calibrating multiplier from raw ADC volts to amperes
///
/// Only finite, non-zero values no larger than [`SCALE_FACTOR_LIMIT`] in
/// magnitude can be constructed.
#[derive(Clone, Copy, PartialEq, PartialOrd)]
pub struct ScaleFactor(f32);

impl ScaleFactor {
    /// Uncalibrated multiplier
    pub const UNITY: Self = Self(1.0);

    /// Validate a candidate multiplier
    #[must_use]
    pub fn new(value: f32) -> Option<Self> {
        if value.is_finite() && value != 0.0 && value.abs() <= SCALE_FACTOR_LIMIT {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Get the multiplier
    #[must_use]
    pub const fn get(self) -> f32 {
        self.0
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self::UNITY
    }
}

impl fmt::Debug for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScaleFactor({})", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ScaleFactor {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "x{}", self.0);
    }
}

/// Sign of a displayed reading
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Polarity {
    /// Zero or positive current
    #[default]
    Positive,
    /// Negative current
    Negative,
}

impl Polarity {
    /// Polarity of a calibrated value
    #[must_use]
    pub fn of(value: f32) -> Self {
        if value < 0.0 {
            Self::Negative
        } else {
            Self::Positive
        }
    }

    /// True for negative readings
    #[must_use]
    pub const fn is_negative(self) -> bool {
        matches!(self, Self::Negative)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Polarity {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Positive => defmt::write!(f, "+"),
            Self::Negative => defmt::write!(f, "-"),
        }
    }
}
