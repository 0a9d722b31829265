//! Sample Acquisition
//!
//! Everything between the converter's ready line and a completed
//! averaging window:
//! - `ready`: the single flag shared with interrupt context
//! - `aggregator`: windowed sum and extrema of raw codes

pub mod aggregator;
pub mod ready;

pub use aggregator::{SampleAggregator, Window};
pub use ready::ReadySignal;

/// A converter that produces signed raw codes
///
/// Implemented by the ADS1115 driver and by host-side test doubles.
pub trait AcquisitionSource {
    /// Bus or device error
    type Error;

    /// Fetch the most recent conversion result
    fn read_latest_code(&mut self) -> Result<i16, Self::Error>;

    /// Restart conversions, used to recover a stalled converter
    fn request_conversion(&mut self) -> Result<(), Self::Error>;
}
