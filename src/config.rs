//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the current monitor.
//! All pin mappings, bus addresses, timing and calibration limits are
//! centralized here.

use crate::types::{DataRate, Gain};

/// Firmware name printed in the serial banner
pub const FIRMWARE_NAME: &str = "Current Monitor";

/// Firmware version printed in the serial banner
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Raw samples averaged into one displayed reading
pub const SAMPLES_PER_WINDOW: u16 = 430;

/// Converter code at positive full scale (15-bit magnitude plus sign)
pub const ADC_FULL_SCALE_CODE: u16 = 32_767;

/// Default PGA setting (±4.096 V)
pub const DEFAULT_GAIN: Gain = Gain::Fsr4V096;

/// Default conversion rate, two readings per second with the default window
pub const DEFAULT_DATA_RATE: DataRate = DataRate::Sps860;

/// Largest accepted scale factor magnitude
pub const SCALE_FACTOR_LIMIT: f32 = 10_000.0;

/// Serial link baud rate
pub const SERIAL_BAUD: u32 = 115_200;

/// Serial receive buffer size
pub const SERIAL_RX_BUFFER_SIZE: usize = 64;

/// Serial transmit buffer size (one parameter dump fits)
pub const SERIAL_TX_BUFFER_SIZE: usize = 512;

/// Longest numeric token accepted by the scale-factor dialog
pub const SCALE_ENTRY_MAX_LEN: usize = 24;

/// Pause before the scale-factor dialog drains stray line-ending bytes
pub const SCALE_ENTRY_SETTLE_MS: u32 = 100;

/// Upper bound on how long the scale-factor dialog blocks the loop
pub const SCALE_ENTRY_TIMEOUT_MS: u32 = 30_000;

/// Poll interval of the scale-factor dialog
pub const SCALE_ENTRY_POLL_MS: u32 = 1;

/// I2C bus frequency for the ADC, display and EEPROM
pub const I2C_FREQUENCY_HZ: u32 = 400_000;

/// ADS1115 I2C address (ADDR pin tied to GND)
pub const ADS1115_I2C_ADDR: u8 = 0x48;

/// HT16K33 7-segment backpack I2C address
pub const DISPLAY_I2C_ADDR: u8 = 0x70;

/// 24LC-series EEPROM I2C address
pub const EEPROM_I2C_ADDR: u8 = 0x50;

/// EEPROM capacity in bytes (24LC64)
pub const EEPROM_CAPACITY: usize = 8192;

/// EEPROM write page size in bytes
pub const EEPROM_PAGE_SIZE: usize = 32;

/// Acknowledge-polling attempts while the EEPROM finishes a write cycle
pub const EEPROM_WRITE_POLL_ATTEMPTS: u32 = 20;

/// Delay between acknowledge-polling attempts in microseconds
pub const EEPROM_WRITE_POLL_US: u32 = 500;

/// Address of the calibration record in the non-volatile store
pub const CALIBRATION_BASE_ADDR: u16 = 0;

/// Decimal places shown on the 7-segment display
pub const DISPLAY_DECIMALS: u8 = 3;

/// Display brightness (0-15)
pub const DISPLAY_BRIGHTNESS: u8 = 15;

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the schematic

    /// Activity LED, toggled once per completed window
    pub const LED_ACTIVITY: &str = "PA5";

    /// Sign indicator output, high for negative current
    pub const SIGN_INDICATOR: &str = "PB0";

    /// ADS1115 ALERT/RDY input (falling edge per conversion)
    pub const ADC_READY: &str = "PA0";

    /// I2C1 SCL (ADC, display, EEPROM)
    pub const I2C1_SCL: &str = "PB8";

    /// I2C1 SDA (ADC, display, EEPROM)
    pub const I2C1_SDA: &str = "PB9";

    /// LPUART1 TX (ST-LINK virtual COM port)
    pub const SERIAL_TX: &str = "PA2";

    /// LPUART1 RX (ST-LINK virtual COM port)
    pub const SERIAL_RX: &str = "PA3";
}
