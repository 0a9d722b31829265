//! Peripheral Drivers
//!
//! Drivers for the external ICs on the I2C bus. They are generic over the
//! `embedded-hal` 1.0 blocking traits, so the same code runs on the board
//! and against bus mocks in host tests.

pub mod ads1115;
pub mod eeprom;
pub mod seven_segment;

use crate::types::Polarity;

/// Anything that can present a calibrated reading
pub trait DisplaySink {
    /// Device error
    type Error;

    /// Show `amps` with its sign indication
    fn show(&mut self, amps: f32, polarity: Polarity) -> Result<(), Self::Error>;
}
