//! Data Log Records
//!
//! One comma-separated line per completed window for spreadsheet import:
//!
//! ```text
//! Counts,    Amps,    High,     Low,   Delta
//!   1000,  0.1250,  0.1252,  0.1248,  0.0004
//! ```
//!
//! Header and records share the same column widths.

use core::fmt;

use embedded_io::Write;

use crate::calibration::Reading;

/// Width of the mean-code column
pub const MEAN_WIDTH: usize = 6;

/// Width of each calibrated value column
pub const VALUE_WIDTH: usize = 8;

/// Decimal places of each calibrated value column
pub const VALUE_PRECISION: usize = 4;

/// Column titles in output order
pub const COLUMNS: [&str; 5] = ["Counts", "Amps", "High", "Low", "Delta"];

/// Log header line
#[derive(Clone, Copy, Debug, Default)]
pub struct LogHeader;

impl fmt::Display for LogHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>mw$},{:>vw$},{:>vw$},{:>vw$},{:>vw$}",
            COLUMNS[0],
            COLUMNS[1],
            COLUMNS[2],
            COLUMNS[3],
            COLUMNS[4],
            mw = MEAN_WIDTH,
            vw = VALUE_WIDTH,
        )
    }
}

/// One log line
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogRecord {
    /// Offset-corrected mean code
    pub mean_code: i32,
    /// Calibrated current
    pub amps: f32,
    /// Calibrated window maximum
    pub high: f32,
    /// Calibrated window minimum
    pub low: f32,
}

impl LogRecord {
    /// Build the record for a completed window's reading
    #[must_use]
    pub fn new(reading: &Reading) -> Self {
        Self {
            mean_code: reading.mean_code,
            amps: reading.amps,
            high: reading.high_volts,
            low: reading.low_volts,
        }
    }

    /// High minus low
    #[must_use]
    pub fn delta(&self) -> f32 {
        self.high - self.low
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>mw$},{:>vw$.p$},{:>vw$.p$},{:>vw$.p$},{:>vw$.p$}",
            self.mean_code,
            self.amps,
            self.high,
            self.low,
            self.delta(),
            mw = MEAN_WIDTH,
            vw = VALUE_WIDTH,
            p = VALUE_PRECISION,
        )
    }
}

/// Emit the header line
pub fn write_header<W: Write>(out: &mut W) -> Result<(), embedded_io::WriteFmtError<W::Error>> {
    write!(out, "{LogHeader}\r\n")
}

/// Emit one record line
pub fn write_record<W: Write>(
    out: &mut W,
    record: &LogRecord,
) -> Result<(), embedded_io::WriteFmtError<W::Error>> {
    write!(out, "{record}\r\n")
}
