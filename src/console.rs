//! Operator Console
//!
//! Single-character command protocol over the serial link.
//! - `command`: byte to command mapping
//! - `interpreter`: dispatch, replies and the scale-factor dialog

pub mod command;
pub mod interpreter;

pub use command::Command;
pub use interpreter::Console;

/// Interactive prompt
pub const PROMPT: &str = "> ";

/// Help text, one command per line
pub const HELP: &str = "\
Commands:\r
  ?  /  H   show this help\r
  G         enter scale factor\r
  !         reset scale factor to 1.0\r
  O         capture offset (apply zero input first)\r
  )         zero the offset\r
  P         print parameters\r
  K         kick the ADC (restart conversions)\r
  S         toggle logging\r
  Enter     show version\r
";
