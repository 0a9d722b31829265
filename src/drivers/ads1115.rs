//! ADS1115 16-bit ADC Driver
//!
//! Differential AIN0-AIN1 measurement of the current-sense amplifier.
//! In continuous mode with the comparator thresholds set to the full
//! negative/positive range, ALERT/RDY pulses once per conversion and is
//! wired to an EXTI line.

use embedded_hal::i2c::I2c;

use crate::sampling::AcquisitionSource;
use crate::types::{AcquisitionSettings, DataRate, Gain};

/// ADS1115 register pointers
mod reg {
    pub const CONVERSION: u8 = 0x00;
    pub const CONFIG: u8 = 0x01;
    pub const LO_THRESH: u8 = 0x02;
    pub const HI_THRESH: u8 = 0x03;
}

/// Config register fields
mod cfg {
    /// Start a conversion (write) / conversion idle (read)
    pub const OS: u16 = 1 << 15;
    pub const MUX_SHIFT: u16 = 12;
    pub const MUX_MASK: u16 = 0b111 << MUX_SHIFT;
    /// AIN0 - AIN1 differential
    pub const MUX_DIFF_0_1: u16 = 0b000 << MUX_SHIFT;
    pub const PGA_SHIFT: u16 = 9;
    pub const PGA_MASK: u16 = 0b111 << PGA_SHIFT;
    /// Single-shot / power-down when set, continuous when clear
    pub const MODE_SINGLE: u16 = 1 << 8;
    pub const DR_SHIFT: u16 = 5;
    pub const DR_MASK: u16 = 0b111 << DR_SHIFT;
    pub const COMP_QUE_MASK: u16 = 0b11;
    /// Assert ALERT/RDY after one conversion
    pub const COMP_QUE_ONE: u16 = 0b00;
    /// Comparator disabled, ALERT/RDY high impedance
    pub const COMP_QUE_DISABLE: u16 = 0b11;
}

/// Hi_thresh value with MSB set, the full negative code
pub const READY_HI_THRESH: u16 = 0x8000;

/// Lo_thresh value with MSB clear, the full positive code
pub const READY_LO_THRESH: u16 = 0x7FFF;

/// ADS1115 error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// I2C transaction failed
    I2c(E),
}

/// Conversion mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConversionMode {
    /// Convert back to back
    #[default]
    Continuous,
    /// Convert once per request, then power down
    SingleShot,
}

/// ADS1115 driver
pub struct Ads1115<I2C> {
    i2c: I2C,
    address: u8,
    /// Shadow of the config register
    config: u16,
}

impl<I2C: I2c> Ads1115<I2C> {
    /// Create a driver; nothing is written until [`Self::begin`]
    pub fn new(i2c: I2C, address: u8) -> Self {
        let config = cfg::MUX_DIFF_0_1
            | (Gain::Fsr2V048.as_reg() << cfg::PGA_SHIFT)
            | cfg::MODE_SINGLE
            | (DataRate::Sps128.as_reg() << cfg::DR_SHIFT)
            | cfg::COMP_QUE_DISABLE;
        Self {
            i2c,
            address,
            config,
        }
    }

    /// Probe the device and load the shadow config
    pub fn begin(&mut self) -> Result<(), Error<I2C::Error>> {
        let current = self.read_reg(reg::CONFIG)?;
        debug!("ADS1115 config at boot: 0x{:04X}", current);
        self.write_reg(reg::CONFIG, self.config & !cfg::OS)
    }

    /// Apply gain, data rate, continuous mode and the ready pin, then start
    pub fn configure(&mut self, settings: &AcquisitionSettings) -> Result<(), Error<I2C::Error>> {
        self.set_gain(settings.gain)?;
        self.set_data_rate(settings.data_rate)?;
        self.set_mode(ConversionMode::Continuous)?;
        self.enable_ready_pin()?;
        self.request_differential_conversion()
    }

    /// Select continuous or single-shot conversion
    pub fn set_mode(&mut self, mode: ConversionMode) -> Result<(), Error<I2C::Error>> {
        match mode {
            ConversionMode::Continuous => self.config &= !cfg::MODE_SINGLE,
            ConversionMode::SingleShot => self.config |= cfg::MODE_SINGLE,
        }
        self.write_reg(reg::CONFIG, self.config)
    }

    /// Select the conversion rate
    pub fn set_data_rate(&mut self, rate: DataRate) -> Result<(), Error<I2C::Error>> {
        self.config = (self.config & !cfg::DR_MASK) | (rate.as_reg() << cfg::DR_SHIFT);
        self.write_reg(reg::CONFIG, self.config)
    }

    /// Select the PGA range
    pub fn set_gain(&mut self, gain: Gain) -> Result<(), Error<I2C::Error>> {
        self.config = (self.config & !cfg::PGA_MASK) | (gain.as_reg() << cfg::PGA_SHIFT);
        self.write_reg(reg::CONFIG, self.config)
    }

    /// Route conversion-ready to the ALERT/RDY pin
    pub fn enable_ready_pin(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_reg(reg::HI_THRESH, READY_HI_THRESH)?;
        self.write_reg(reg::LO_THRESH, READY_LO_THRESH)?;
        self.config = (self.config & !cfg::COMP_QUE_MASK) | cfg::COMP_QUE_ONE;
        self.write_reg(reg::CONFIG, self.config)
    }

    /// Start AIN0-AIN1 conversions
    pub fn request_differential_conversion(&mut self) -> Result<(), Error<I2C::Error>> {
        self.config = (self.config & !cfg::MUX_MASK) | cfg::MUX_DIFF_0_1;
        self.write_reg(reg::CONFIG, self.config | cfg::OS)
    }

    /// Latest conversion result
    pub fn value(&mut self) -> Result<i16, Error<I2C::Error>> {
        let raw = self.read_reg(reg::CONVERSION)?;
        Ok(raw as i16)
    }

    /// Shadow config register value
    #[must_use]
    pub const fn config(&self) -> u16 {
        self.config
    }

    /// Release the bus
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_reg(&mut self, reg: u8, value: u16) -> Result<(), Error<I2C::Error>> {
        let [msb, lsb] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[reg, msb, lsb])
            .map_err(Error::I2c)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u16, Error<I2C::Error>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(Error::I2c)?;
        Ok(u16::from_be_bytes(buf))
    }
}

impl<I2C: I2c> AcquisitionSource for Ads1115<I2C> {
    type Error = Error<I2C::Error>;

    fn read_latest_code(&mut self) -> Result<i16, Self::Error> {
        self.value()
    }

    fn request_conversion(&mut self) -> Result<(), Self::Error> {
        self.request_differential_conversion()
    }
}
