//! Current Monitor Firmware Library
//!
//! Core of an STM32G474-based current monitor. An ADS1115 converts the
//! differential voltage across a current-sense amplifier; every completed
//! window of samples becomes one calibrated reading, which is shown on a
//! 4-digit display and optionally logged over the serial link. Offset and
//! scale calibration are entered from the serial console and persisted
//! in an I2C EEPROM.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Control Loop  │  Console  │  Data Log                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   MEASUREMENT LAYER                          │
//! │  Window Aggregation  │  Calibration  │  Calibration Record   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / DRIVER LAYER                         │
//! │  ADS1115  │  HT16K33  │  24xx EEPROM  │  UART  │  EXTI       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Single owner**: the main loop owns all measurement state; the
//!   interrupt side only raises a ready flag
//! - **Generic drivers**: everything above the HAL is written against
//!   `embedded-hal`/`embedded-io` traits and tested on the host
//! - **Write-through calibration**: constants change only after they are
//!   stored
//! - **No unsafe in application code**

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[macro_use]
mod fmt;

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// Board glue over STM32G474 peripherals.
#[cfg(feature = "embedded")]
pub mod hal;

/// Peripheral Drivers
///
/// ADS1115 ADC, HT16K33 display and 24xx EEPROM.
pub mod drivers;

/// Sample Acquisition
///
/// Ready flag and window aggregation.
pub mod sampling;

/// Calibration
///
/// Offset/scale constants, reading computation and the persisted record.
pub mod calibration;

/// Non-volatile storage abstraction
pub mod storage;

/// Serial Console
///
/// Single-character command interpreter.
pub mod console;

/// Data Log
///
/// Column header and per-window records.
pub mod datalog;

/// Serial line helpers
pub mod serial;

/// Control loop
pub mod monitor;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::calibration::{CalibrationEngine, LoadOutcome};
    pub use crate::drivers::ads1115::Ads1115;
    pub use crate::drivers::eeprom::Eeprom24x;
    pub use crate::drivers::seven_segment::{ReadingDisplay, SevenSegment};
    pub use crate::monitor::{ControlLoop, Monitor};
    pub use crate::sampling::ReadySignal;

    // Common traits
    pub use embedded_hal::digital::OutputPin;
    pub use embedded_hal::i2c::I2c;

    // Embassy
    pub use embassy_time::{Duration, Instant, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
