//! 4-Digit 7-Segment Display Driver
//!
//! HT16K33-based backpack. Display RAM row 0, 1, 3 and 4 drive the
//! digits left to right; row 2 drives the colon. The sign of a reading is
//! shown on a separate indicator output, so the digits carry the magnitude.

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;

use crate::config::DISPLAY_BRIGHTNESS;
use crate::drivers::DisplaySink;
use crate::types::Polarity;

/// HT16K33 commands
mod cmd {
    pub const DISPLAY_RAM: u8 = 0x00;
    pub const OSCILLATOR_ON: u8 = 0x21;
    pub const DISPLAY_ON: u8 = 0x81;
    pub const BRIGHTNESS: u8 = 0xE0;
}

/// Segment patterns for 0-9 (bit 0 = segment a)
const DIGITS: [u8; 10] = [0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F];

/// Segment g alone
pub const MINUS: u8 = 0x40;

/// Decimal point
pub const DOT: u8 = 0x80;

/// Unlit digit
pub const BLANK: u8 = 0x00;

/// Display RAM rows used by the four digits
const DIGIT_ROWS: [usize; 4] = [0, 1, 3, 4];

/// Largest number of decimals that can be shown
const MAX_DECIMALS: u8 = 3;

/// Scale for each decimal count
const POW10: [f32; MAX_DECIMALS as usize + 1] = [1.0, 10.0, 100.0, 1000.0];

/// Display error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// I2C transaction failed
    I2c(E),
    /// Sign indicator pin failed
    SignPin,
}

/// Render a value into four digit patterns, left to right
///
/// Decimals are reduced until the number fits; `----` marks overflow.
#[must_use]
pub fn render(value: f32, decimals: u8) -> [u8; 4] {
    let negative = value < 0.0;
    let magnitude = if negative { -value } else { value };
    let width: usize = if negative { 3 } else { 4 };
    let limit = 10u32.pow(width as u32);

    if !magnitude.is_finite() {
        return [MINUS; 4];
    }

    let mut decimals = decimals.min(MAX_DECIMALS);
    let scaled = loop {
        let scaled = (magnitude * POW10[usize::from(decimals)] + 0.5) as u32;
        // Keep at least one integer digit
        if scaled < limit && usize::from(decimals) < width {
            break scaled;
        }
        if decimals == 0 {
            return [MINUS; 4];
        }
        decimals -= 1;
    };

    let mut cells = [BLANK; 4];
    let mut remaining = scaled;
    let mut used = 0;
    for i in 0..width {
        if remaining == 0 && i > usize::from(decimals) {
            break;
        }
        let cell = &mut cells[3 - i];
        *cell = DIGITS[(remaining % 10) as usize];
        if decimals > 0 && i == usize::from(decimals) {
            *cell |= DOT;
        }
        remaining /= 10;
        used = i + 1;
    }
    if negative {
        cells[3 - used] = MINUS;
    }
    cells
}

/// HT16K33 7-segment backpack
pub struct SevenSegment<I2C> {
    i2c: I2C,
    address: u8,
    /// Display RAM shadow, one 16-bit row per common
    rows: [u16; 8],
}

impl<I2C: I2c> SevenSegment<I2C> {
    /// Create a driver; nothing is written until [`Self::begin`]
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            rows: [0; 8],
        }
    }

    /// Start the oscillator and enable the display
    pub fn begin(&mut self) -> Result<(), Error<I2C::Error>> {
        self.command(cmd::OSCILLATOR_ON)?;
        self.command(cmd::DISPLAY_ON)?;
        self.set_brightness(DISPLAY_BRIGHTNESS)?;
        self.clear();
        self.write_display()
    }

    /// Set brightness (0-15)
    pub fn set_brightness(&mut self, level: u8) -> Result<(), Error<I2C::Error>> {
        self.command(cmd::BRIGHTNESS | level.min(15))
    }

    /// Render `value` into the shadow RAM
    pub fn print(&mut self, value: f32, decimals: u8) {
        let cells = render(value, decimals);
        self.rows[2] = 0;
        for (row, cell) in DIGIT_ROWS.iter().zip(cells) {
            self.rows[*row] = u16::from(cell);
        }
    }

    /// Blank the shadow RAM
    pub fn clear(&mut self) {
        self.rows = [0; 8];
    }

    /// Digit patterns currently in the shadow RAM, left to right
    #[must_use]
    pub fn digits(&self) -> [u8; 4] {
        DIGIT_ROWS.map(|row| self.rows[row] as u8)
    }

    /// Push the shadow RAM to the display
    pub fn write_display(&mut self) -> Result<(), Error<I2C::Error>> {
        let mut buf = [0u8; 17];
        buf[0] = cmd::DISPLAY_RAM;
        for (i, row) in self.rows.iter().enumerate() {
            let [lo, hi] = row.to_le_bytes();
            buf[1 + i * 2] = lo;
            buf[2 + i * 2] = hi;
        }
        self.i2c.write(self.address, &buf).map_err(Error::I2c)
    }

    /// Release the bus
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn command(&mut self, command: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c.write(self.address, &[command]).map_err(Error::I2c)
    }
}

/// Backpack plus discrete sign indicator
pub struct ReadingDisplay<I2C, P> {
    digits: SevenSegment<I2C>,
    sign: P,
    decimals: u8,
}

impl<I2C: I2c, P: OutputPin> ReadingDisplay<I2C, P> {
    /// Pair a backpack with a sign indicator
    pub fn new(digits: SevenSegment<I2C>, sign: P, decimals: u8) -> Self {
        Self {
            digits,
            sign,
            decimals,
        }
    }

    /// Initialise the backpack and clear the sign indicator
    pub fn begin(&mut self) -> Result<(), Error<I2C::Error>> {
        self.sign.set_low().map_err(|_| Error::SignPin)?;
        self.digits.begin()
    }

    /// The backpack
    #[must_use]
    pub const fn digits(&self) -> &SevenSegment<I2C> {
        &self.digits
    }

    /// The sign indicator
    #[must_use]
    pub const fn sign(&self) -> &P {
        &self.sign
    }
}

impl<I2C: I2c, P: OutputPin> DisplaySink for ReadingDisplay<I2C, P> {
    type Error = Error<I2C::Error>;

    fn show(&mut self, amps: f32, polarity: Polarity) -> Result<(), Self::Error> {
        let magnitude = if amps < 0.0 { -amps } else { amps };
        self.digits.print(magnitude, self.decimals);
        let pin = if polarity.is_negative() {
            self.sign.set_high()
        } else {
            self.sign.set_low()
        };
        pin.map_err(|_| Error::SignPin)?;
        self.digits.write_display()
    }
}
