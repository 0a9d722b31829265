//! Serial Link
//!
//! Maps the console's [`LineCoding`] onto the STM32 USART configuration.

use embassy_stm32::usart;

use crate::serial::{LineCoding, Parity, StopBits};

/// USART configuration for `coding`
///
/// Only 7, 8 and 9 data bits exist on this part; anything else is
/// treated as 8.
#[must_use]
pub fn config(coding: &LineCoding) -> usart::Config {
    let mut config = usart::Config::default();
    config.baudrate = coding.baud_rate;
    config.data_bits = match coding.data_bits {
        7 => usart::DataBits::DataBits7,
        9 => usart::DataBits::DataBits9,
        _ => usart::DataBits::DataBits8,
    };
    config.stop_bits = match coding.stop_bits {
        StopBits::One => usart::StopBits::STOP1,
        StopBits::Two => usart::StopBits::STOP2,
    };
    config.parity = match coding.parity {
        Parity::None => usart::Parity::ParityNone,
        Parity::Odd => usart::Parity::ParityOdd,
        Parity::Even => usart::Parity::ParityEven,
    };
    config
}
