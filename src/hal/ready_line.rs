//! ADC Ready Line
//!
//! The ADS1115 ALERT/RDY output pulses low once per conversion. The
//! watcher only latches the event into a [`ReadySignal`]; reading the
//! conversion happens in the main loop.

use embassy_stm32::exti::ExtiInput;

use crate::sampling::ReadySignal;

/// EXTI-backed conversion-ready input
pub struct ReadyLine<'d> {
    pin: ExtiInput<'d>,
}

impl<'d> ReadyLine<'d> {
    /// Wrap the EXTI input wired to ALERT/RDY
    #[must_use]
    pub fn new(pin: ExtiInput<'d>) -> Self {
        Self { pin }
    }

    /// Wait for the next falling edge
    pub async fn wait(&mut self) {
        self.pin.wait_for_falling_edge().await;
    }

    /// Raise `signal` on every conversion, forever
    pub async fn watch(&mut self, signal: &ReadySignal) -> ! {
        loop {
            self.wait().await;
            signal.raise();
        }
    }
}
