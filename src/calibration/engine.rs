//! Calibration Engine
//!
//! Owns the offset and scale constants and every mutation of them.
//! Mutations are write-through: the record is persisted first and memory
//! is only updated once the store reports success, so the in-memory
//! constants always equal the last record written.

use crate::calibration::record::CalibrationRecord;
use crate::calibration::CalibrationError;
use crate::config::CALIBRATION_BASE_ADDR;
use crate::sampling::Window;
use crate::storage::{NvStore, StoreError};
use crate::types::{AcquisitionSettings, Polarity, ScaleFactor};

/// Calibrated result of one completed window
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Offset-corrected mean code (integer mean of the corrected sum)
    pub mean_code: i32,
    /// Calibrated current
    pub amps: f32,
    /// Sign of `amps`
    pub polarity: Polarity,
    /// Calibrated value of the window maximum
    pub high_volts: f32,
    /// Calibrated value of the window minimum
    pub low_volts: f32,
}

impl Reading {
    /// Spread between the calibrated extrema
    #[must_use]
    pub fn delta_volts(&self) -> f32 {
        self.high_volts - self.low_volts
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Reading {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Reading({} A, hi={}, lo={})",
            self.amps,
            self.high_volts,
            self.low_volts
        );
    }
}

/// How the calibration constants were obtained at boot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A valid record was read
    Loaded,
    /// The store was unprogrammed; defaults were written through
    Initialized,
    /// The store could not be accessed; running on defaults
    Unavailable(StoreError),
}

#[cfg(feature = "embedded")]
impl defmt::Format for LoadOutcome {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Loaded => defmt::write!(f, "Loaded"),
            Self::Initialized => defmt::write!(f, "Initialized"),
            Self::Unavailable(err) => defmt::write!(f, "Unavailable({})", err),
        }
    }
}

/// Offset and scale correction state
pub struct CalibrationEngine<S: NvStore> {
    store: S,
    /// Record location in the store
    address: u16,
    settings: AcquisitionSettings,
    /// Persisted: negated sum of one zero-input window
    offset_sum: i32,
    /// Persisted: ADC volts to amperes multiplier
    scale_factor: ScaleFactor,
    /// Derived: `offset_sum / samples_per_window`
    offset_per_sample: f32,
    /// Derived: amperes per raw code
    voltage_scale: f32,
}

impl<S: NvStore> CalibrationEngine<S> {
    /// Load calibration from the store at the default address
    pub fn open(store: S, settings: AcquisitionSettings) -> (Self, LoadOutcome) {
        Self::open_at(store, CALIBRATION_BASE_ADDR, settings)
    }

    /// Load calibration from the store at `address`
    ///
    /// An unprogrammed or invalid record is replaced by the defaults before
    /// anything is read from it.
    pub fn open_at(mut store: S, address: u16, settings: AcquisitionSettings) -> (Self, LoadOutcome) {
        let (record, outcome) = match CalibrationRecord::load(&mut store, address) {
            Ok(Ok(record)) => (record, LoadOutcome::Loaded),
            Ok(Err(reason)) => {
                warn!("calibration record rejected: {}", reason);
                let record = CalibrationRecord::DEFAULT;
                match record.save(&mut store, address) {
                    Ok(()) => (record, LoadOutcome::Initialized),
                    Err(err) => (record, LoadOutcome::Unavailable(err)),
                }
            }
            Err(err) => (CalibrationRecord::DEFAULT, LoadOutcome::Unavailable(err)),
        };

        match outcome {
            LoadOutcome::Unavailable(err) => error!("calibration store unavailable: {}", err),
            _ => info!(
                "calibration {}: offset={} scale={}",
                outcome, record.offset_sum, record.scale_factor
            ),
        }

        let mut engine = Self {
            store,
            address,
            settings,
            offset_sum: record.offset_sum,
            scale_factor: record.scale_factor,
            offset_per_sample: 0.0,
            voltage_scale: 0.0,
        };
        engine.update_offset_per_sample();
        engine.update_voltage_scale();
        (engine, outcome)
    }

    /// Convert a completed window into a calibrated reading
    #[must_use]
    pub fn compute_reading(&self, window: &Window) -> Reading {
        let mean_code = self.corrected_mean(window);
        let amps = self.voltage_scale * mean_code as f32;
        Reading {
            mean_code,
            amps,
            polarity: Polarity::of(amps),
            high_volts: self.voltage_scale * (f32::from(window.max) + self.offset_per_sample),
            low_volts: self.voltage_scale * (f32::from(window.min) + self.offset_per_sample),
        }
    }

    /// Truncating integer mean of the window sum after folding in the offset
    ///
    /// Saturates at the `i32` range.
    fn corrected_mean(&self, window: &Window) -> i32 {
        if window.count == 0 {
            return 0;
        }
        let corrected = i64::from(window.sum) + i64::from(self.offset_sum);
        let mean = corrected / i64::from(window.count);
        i32::try_from(mean).unwrap_or(if mean < 0 { i32::MIN } else { i32::MAX })
    }

    /// Store the negated uncorrected sum of a zero-input window as the offset
    pub fn capture_offset(&mut self, last_raw_sum: i32) -> Result<(), CalibrationError> {
        self.commit(CalibrationRecord {
            offset_sum: last_raw_sum.saturating_neg(),
            scale_factor: self.scale_factor,
        })?;
        info!("offset captured: {}", self.offset_sum);
        Ok(())
    }

    /// Clear the offset
    pub fn zero_offset(&mut self) -> Result<(), CalibrationError> {
        self.commit(CalibrationRecord {
            offset_sum: 0,
            scale_factor: self.scale_factor,
        })?;
        info!("offset zeroed");
        Ok(())
    }

    /// Validate and persist a new scale factor
    pub fn set_scale_factor(&mut self, value: f32) -> Result<ScaleFactor, CalibrationError> {
        let Some(scale_factor) = ScaleFactor::new(value) else {
            warn!("scale factor {} rejected", value);
            return Err(CalibrationError::OutOfBounds(value));
        };
        self.commit(CalibrationRecord {
            offset_sum: self.offset_sum,
            scale_factor,
        })?;
        info!("scale factor set: {}", scale_factor);
        Ok(scale_factor)
    }

    /// Parse operator input and persist it as the scale factor
    pub fn set_scale_factor_from_str(&mut self, token: &str) -> Result<ScaleFactor, CalibrationError> {
        let value: f32 = token
            .trim()
            .parse()
            .map_err(|_| CalibrationError::NotANumber)?;
        self.set_scale_factor(value)
    }

    /// Restore the unity scale factor
    pub fn reset_scale_factor(&mut self) -> Result<ScaleFactor, CalibrationError> {
        self.set_scale_factor(ScaleFactor::UNITY.get())
    }

    /// Persist `record`, then adopt it
    fn commit(&mut self, record: CalibrationRecord) -> Result<(), CalibrationError> {
        if let Err(err) = record.save(&mut self.store, self.address) {
            error!("calibration write failed: {}", err);
            return Err(err.into());
        }
        let offset_changed = record.offset_sum != self.offset_sum;
        let scale_changed = record.scale_factor != self.scale_factor;
        self.offset_sum = record.offset_sum;
        self.scale_factor = record.scale_factor;
        if offset_changed {
            self.update_offset_per_sample();
        }
        if scale_changed {
            self.update_voltage_scale();
        }
        Ok(())
    }

    fn update_offset_per_sample(&mut self) {
        let n = self.settings.samples_per_window.max(1);
        self.offset_per_sample = self.offset_sum as f32 / f32::from(n);
    }

    fn update_voltage_scale(&mut self) {
        self.voltage_scale = self.scale_factor.get() * self.settings.full_scale_volts()
            / f32::from(self.settings.full_scale_code());
    }

    /// Persisted offset sum
    #[must_use]
    pub const fn offset_sum(&self) -> i32 {
        self.offset_sum
    }

    /// Offset folded into each sample
    #[must_use]
    pub const fn offset_per_sample(&self) -> f32 {
        self.offset_per_sample
    }

    /// Persisted scale factor
    #[must_use]
    pub const fn scale_factor(&self) -> ScaleFactor {
        self.scale_factor
    }

    /// Amperes per raw code
    #[must_use]
    pub const fn voltage_scale(&self) -> f32 {
        self.voltage_scale
    }

    /// Raw codes per milliampere
    #[must_use]
    pub fn counts_per_milliamp(&self) -> f32 {
        if self.voltage_scale == 0.0 {
            return 0.0;
        }
        1.0 / (self.voltage_scale * 1000.0)
    }

    /// Active acquisition settings
    #[must_use]
    pub const fn settings(&self) -> &AcquisitionSettings {
        &self.settings
    }

    /// Current constants as a record
    #[must_use]
    pub const fn record(&self) -> CalibrationRecord {
        CalibrationRecord {
            offset_sum: self.offset_sum,
            scale_factor: self.scale_factor,
        }
    }

    /// Borrow the backing store
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Release the backing store
    pub fn into_store(self) -> S {
        self.store
    }
}
