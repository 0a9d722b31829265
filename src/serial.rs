//! Serial Line Discipline
//!
//! Byte-level helpers over an `embedded-io` serial port. Reads never block
//! except in [`read_line_blocking`], whose latency is bounded by a timeout.
//! No call takes more than [`SERIAL_RX_BUFFER_SIZE`] bytes in one pass, so a
//! port that never goes quiet cannot hold the caller.

use embedded_hal::delay::DelayNs;
use embedded_io::{Read, ReadReady};
use heapless::String;

use crate::config::{SERIAL_BAUD, SERIAL_RX_BUFFER_SIZE};

/// True for CR and LF
#[must_use]
pub const fn is_line_end(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}

/// Read one byte if one is buffered
pub fn read_byte<P: Read + ReadReady>(port: &mut P) -> Result<Option<u8>, P::Error> {
    if !port.read_ready()? {
        return Ok(None);
    }
    let mut buf = [0u8; 1];
    match port.read(&mut buf)? {
        0 => Ok(None),
        _ => Ok(Some(buf[0])),
    }
}

/// Discard what is currently buffered, up to one receive buffer
///
/// Returns the number of bytes dropped.
pub fn drain<P: Read + ReadReady>(port: &mut P) -> Result<usize, P::Error> {
    let mut dropped = 0;
    while dropped < SERIAL_RX_BUFFER_SIZE && read_byte(port)?.is_some() {
        dropped += 1;
    }
    Ok(dropped)
}

/// Discard buffered input through the next line boundary
///
/// Returns the line-ending byte that ended the discard, or `None` when the
/// buffer ran dry or one receive buffer was dropped first. A CR terminator
/// may still be followed by an LF; callers skip that byte when it arrives.
pub fn discard_line<P: Read + ReadReady>(port: &mut P) -> Result<Option<u8>, P::Error> {
    for _ in 0..SERIAL_RX_BUFFER_SIZE {
        match read_byte(port)? {
            Some(byte) if is_line_end(byte) => return Ok(Some(byte)),
            Some(_) => {}
            None => break,
        }
    }
    Ok(None)
}

/// Outcome of a blocking line read
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineEntry<const N: usize> {
    /// A complete line
    Line {
        /// Line text without its terminator
        text: String<N>,
        /// CR or LF that ended the line
        terminator: u8,
    },
    /// The line did not fit in `N` bytes
    TooLong {
        /// CR or LF that ended the line
        terminator: u8,
    },
    /// No terminator arrived before the timeout
    TimedOut,
}

impl<const N: usize> LineEntry<N> {
    /// Line-ending byte that completed the entry
    #[must_use]
    pub const fn terminator(&self) -> Option<u8> {
        match self {
            Self::Line { terminator, .. } | Self::TooLong { terminator } => Some(*terminator),
            Self::TimedOut => None,
        }
    }
}

/// Block until a full line arrives or `timeout_ms` passes
///
/// Takes at most one receive buffer of bytes, then waits `poll_ms`. Every
/// wait counts against the timeout whether or not bytes arrived, so input
/// that never ends a line still times out. Non-ASCII bytes are ignored.
pub fn read_line_blocking<P, D, const N: usize>(
    port: &mut P,
    delay: &mut D,
    timeout_ms: u32,
    poll_ms: u32,
) -> Result<LineEntry<N>, P::Error>
where
    P: Read + ReadReady,
    D: DelayNs,
{
    let mut line: String<N> = String::new();
    let mut overflow = false;
    let mut waited_ms = 0u32;
    let poll_ms = poll_ms.max(1);

    loop {
        for _ in 0..SERIAL_RX_BUFFER_SIZE {
            match read_byte(port)? {
                Some(terminator) if is_line_end(terminator) => {
                    return Ok(if overflow {
                        LineEntry::TooLong { terminator }
                    } else {
                        LineEntry::Line {
                            text: line,
                            terminator,
                        }
                    });
                }
                Some(byte) => {
                    if byte.is_ascii() && line.push(char::from(byte)).is_err() {
                        overflow = true;
                    }
                }
                None => break,
            }
        }
        if waited_ms >= timeout_ms {
            return Ok(LineEntry::TimedOut);
        }
        delay.delay_ms(poll_ms);
        waited_ms = waited_ms.saturating_add(poll_ms);
    }
}

/// Line coding (baud rate, etc.)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineCoding {
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits (5, 6, 7, 8)
    pub data_bits: u8,
    /// Stop bits
    pub stop_bits: StopBits,
    /// Parity
    pub parity: Parity,
}

impl Default for LineCoding {
    fn default() -> Self {
        Self {
            baud_rate: SERIAL_BAUD,
            data_bits: 8,
            stop_bits: StopBits::One,
            parity: Parity::None,
        }
    }
}

/// Stop bits configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StopBits {
    /// One stop bit
    #[default]
    One,
    /// Two stop bits
    Two,
}

/// Parity configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parity {
    /// No parity
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}
