//! GPIO Abstractions
//!
//! Indicator outputs with a tracked state, usable anywhere the control
//! loop expects an `embedded-hal` output pin.

use core::convert::Infallible;

use embassy_stm32::gpio::{Level, Output};
use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};

/// Indicator state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// Dark
    #[default]
    Off,
    /// Lit
    On,
}

impl LedState {
    /// The opposite state
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }

    const fn level(self) -> Level {
        match self {
            Self::Off => Level::Low,
            Self::On => Level::High,
        }
    }
}

impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}

/// Active-high indicator LED
///
/// Used for the window activity LED and the negative-sign indicator.
pub struct Indicator<'d> {
    pin: Output<'d>,
    state: LedState,
}

impl<'d> Indicator<'d> {
    /// Wrap an output, driving it to `initial`
    #[must_use]
    pub fn new(mut pin: Output<'d>, initial: LedState) -> Self {
        pin.set_level(initial.level());
        Self {
            pin,
            state: initial,
        }
    }

    /// Drive to `state`
    pub fn set(&mut self, state: LedState) {
        self.pin.set_level(state.level());
        self.state = state;
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> LedState {
        self.state
    }
}

impl ErrorType for Indicator<'_> {
    type Error = Infallible;
}

impl OutputPin for Indicator<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(LedState::Off);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(LedState::On);
        Ok(())
    }
}

impl StatefulOutputPin for Indicator<'_> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.state == LedState::On)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.state == LedState::Off)
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.set(self.state.toggle());
        Ok(())
    }
}
