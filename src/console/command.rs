//! Console commands
//!
//! Only the first byte of a line is a command. Letters are
//! case-insensitive.

/// Command decoded from one input byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// CR or LF: reprint the version banner
    Banner,
    /// `?`, `/`, `H`: print the help menu
    Help,
    /// `G`: enter a new scale factor
    EnterScaleFactor,
    /// `!`: reset the scale factor to 1.0
    ResetScaleFactor,
    /// `O`: capture the offset from the last window
    CaptureOffset,
    /// `)`: zero the offset
    ZeroOffset,
    /// `P`: print parameters
    PrintParameters,
    /// `K`: re-issue a conversion request
    Kick,
    /// `S`: toggle logging
    ToggleLogging,
    /// Anything else, echoed back
    Unrecognized(u8),
}

impl Command {
    /// Decode a command byte
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte.to_ascii_uppercase() {
            b'\r' | b'\n' => Self::Banner,
            b'?' | b'/' | b'H' => Self::Help,
            b'G' => Self::EnterScaleFactor,
            b'!' => Self::ResetScaleFactor,
            b'O' => Self::CaptureOffset,
            b')' => Self::ZeroOffset,
            b'P' => Self::PrintParameters,
            b'K' => Self::Kick,
            b'S' => Self::ToggleLogging,
            _ => Self::Unrecognized(byte),
        }
    }

    /// Whether the reply ends with the interactive prompt
    ///
    /// The logging toggle ends with the log header instead.
    #[must_use]
    pub const fn ends_with_prompt(self) -> bool {
        !matches!(self, Self::ToggleLogging)
    }

    /// Whether the command mutates persisted calibration
    #[must_use]
    pub const fn writes_calibration(self) -> bool {
        matches!(
            self,
            Self::EnterScaleFactor | Self::ResetScaleFactor | Self::CaptureOffset | Self::ZeroOffset
        )
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Command {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Banner => defmt::write!(f, "Banner"),
            Self::Help => defmt::write!(f, "Help"),
            Self::EnterScaleFactor => defmt::write!(f, "EnterScaleFactor"),
            Self::ResetScaleFactor => defmt::write!(f, "ResetScaleFactor"),
            Self::CaptureOffset => defmt::write!(f, "CaptureOffset"),
            Self::ZeroOffset => defmt::write!(f, "ZeroOffset"),
            Self::PrintParameters => defmt::write!(f, "PrintParameters"),
            Self::Kick => defmt::write!(f, "Kick"),
            Self::ToggleLogging => defmt::write!(f, "ToggleLogging"),
            Self::Unrecognized(b) => defmt::write!(f, "Unrecognized(0x{:02X})", b),
        }
    }
}
