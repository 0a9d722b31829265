//! Hardware Abstraction Layer
//!
//! Thin wrappers over STM32G474 peripherals used by the board binary.
//! Everything here is board glue; the measurement logic stays generic
//! over `embedded-hal` traits and is tested on the host.

pub mod gpio;
pub mod ready_line;
pub mod uart;
