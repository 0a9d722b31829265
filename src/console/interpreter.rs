//! Console Interpreter
//!
//! Reads at most one command per poll, dispatches it, then discards the
//! rest of the input line so only the first character of a line counts.
//!
//! The scale-factor dialog is the one blocking step: it waits
//! `SCALE_ENTRY_SETTLE_MS`, drains stray bytes, then blocks for a line of
//! input for at most `SCALE_ENTRY_TIMEOUT_MS`. Ready events raised in the
//! meantime stay latched and are serviced when the dialog returns.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_io::{Read, ReadReady, Write};

use crate::calibration::CalibrationError;
use crate::config::{
    FIRMWARE_NAME, FIRMWARE_VERSION, SCALE_ENTRY_MAX_LEN, SCALE_ENTRY_POLL_MS,
    SCALE_ENTRY_SETTLE_MS, SCALE_ENTRY_TIMEOUT_MS, SCALE_FACTOR_LIMIT,
};
use crate::console::command::Command;
use crate::console::{HELP, PROMPT};
use crate::datalog;
use crate::monitor::Monitor;
use crate::sampling::AcquisitionSource;
use crate::serial::{self, LineEntry};
use crate::storage::NvStore;

/// Write and ignore transport errors; the link is the only place to report them
fn emit<P: Write>(port: &mut P, args: fmt::Arguments<'_>) {
    let _ = port.write_fmt(args);
}

/// Command interpreter state
#[derive(Debug, Default)]
pub struct Console {
    /// Drop an LF that completes a CR LF pair already consumed
    skip_lf: bool,
}

impl Console {
    /// Create an interpreter awaiting a command
    #[must_use]
    pub const fn new() -> Self {
        Self { skip_lf: false }
    }

    /// Print the version banner followed by the prompt
    pub fn greet<P: Write>(&self, port: &mut P) {
        Self::banner(port);
        Self::prompt(port);
    }

    /// Handle at most one pending command
    ///
    /// Returns the command that was dispatched, if any.
    pub fn poll<P, D, A, S>(
        &mut self,
        port: &mut P,
        delay: &mut D,
        monitor: &mut Monitor<S>,
        adc: &mut A,
    ) -> Result<Option<Command>, P::Error>
    where
        P: Read + ReadReady + Write,
        D: DelayNs,
        A: AcquisitionSource,
        S: NvStore,
    {
        let mut byte = match serial::read_byte(port)? {
            Some(byte) => byte,
            None => return Ok(None),
        };
        if core::mem::take(&mut self.skip_lf) && byte == b'\n' {
            byte = match serial::read_byte(port)? {
                Some(byte) => byte,
                None => return Ok(None),
            };
        }

        let command = Command::from_byte(byte);
        debug!("console command: {}", command);
        self.dispatch(command, port, delay, monitor, adc)?;

        match command {
            // The dialog reads its own line, terminator included
            Command::EnterScaleFactor => {}
            _ if serial::is_line_end(byte) => self.skip_lf = byte == b'\r',
            _ => {
                if let Some(end) = serial::discard_line(port)? {
                    self.skip_lf = end == b'\r';
                }
            }
        }

        if command.ends_with_prompt() {
            Self::prompt(port);
        }
        Ok(Some(command))
    }

    fn dispatch<P, D, A, S>(
        &mut self,
        command: Command,
        port: &mut P,
        delay: &mut D,
        monitor: &mut Monitor<S>,
        adc: &mut A,
    ) -> Result<(), P::Error>
    where
        P: Read + ReadReady + Write,
        D: DelayNs,
        A: AcquisitionSource,
        S: NvStore,
    {
        match command {
            Command::Banner => Self::banner(port),
            Command::Help => emit(port, format_args!("{HELP}")),
            Command::EnterScaleFactor => self.scale_factor_dialog(port, delay, monitor)?,
            Command::ResetScaleFactor => match monitor.calibration_mut().reset_scale_factor() {
                Ok(scale) => emit(port, format_args!("Scale factor reset to {:.4}\r\n", scale.get())),
                Err(err) => Self::report(port, &err),
            },
            Command::CaptureOffset => match monitor.last_window() {
                Some(window) => match monitor.calibration_mut().capture_offset(window.sum) {
                    Ok(()) => emit(
                        port,
                        format_args!(
                            "Offset captured: {}\r\n",
                            monitor.calibration().offset_sum()
                        ),
                    ),
                    Err(err) => Self::report(port, &err),
                },
                None => emit(port, format_args!("No reading yet, offset unchanged\r\n")),
            },
            Command::ZeroOffset => match monitor.calibration_mut().zero_offset() {
                Ok(()) => emit(port, format_args!("Offset zeroed\r\n")),
                Err(err) => Self::report(port, &err),
            },
            Command::PrintParameters => Self::parameters(port, monitor),
            Command::Kick => match adc.request_conversion() {
                Ok(()) => {
                    info!("ADC conversion re-requested");
                    emit(port, format_args!("ADC conversion restarted\r\n"));
                }
                Err(_) => {
                    warn!("ADC kick failed");
                    emit(port, format_args!("ADC request failed\r\n"));
                }
            },
            Command::ToggleLogging => {
                let on = monitor.toggle_logging();
                info!("logging {}", on);
                emit(port, format_args!("Logging {}\r\n", if on { "on" } else { "off" }));
                if datalog::write_header(port).is_err() {
                    warn!("log header write failed");
                }
            }
            Command::Unrecognized(byte) => {
                if byte.is_ascii_graphic() {
                    emit(port, format_args!("Unrecognized command: '{}'\r\n", char::from(byte)));
                } else {
                    emit(port, format_args!("Unrecognized command: 0x{byte:02X}\r\n"));
                }
            }
        }
        Ok(())
    }

    /// Blocking scale-factor entry
    fn scale_factor_dialog<P, D, S>(
        &mut self,
        port: &mut P,
        delay: &mut D,
        monitor: &mut Monitor<S>,
    ) -> Result<(), P::Error>
    where
        P: Read + ReadReady + Write,
        D: DelayNs,
        S: NvStore,
    {
        emit(
            port,
            format_args!(
                "Current scale factor {:.4}. Enter new value: ",
                monitor.calibration().scale_factor().get()
            ),
        );
        let _ = port.flush();

        delay.delay_ms(SCALE_ENTRY_SETTLE_MS);
        serial::drain(port)?;

        let entry: LineEntry<SCALE_ENTRY_MAX_LEN> = serial::read_line_blocking(
            port,
            delay,
            SCALE_ENTRY_TIMEOUT_MS,
            SCALE_ENTRY_POLL_MS,
        )?;
        emit(port, format_args!("\r\n"));
        self.skip_lf = entry.terminator() == Some(b'\r');

        match entry {
            LineEntry::Line { text, .. } => {
                match monitor.calibration_mut().set_scale_factor_from_str(&text) {
                    Ok(scale) => emit(port, format_args!("Scale factor set to {:.4}\r\n", scale.get())),
                    Err(err) => Self::report(port, &err),
                }
            }
            LineEntry::TooLong { .. } => {
                emit(port, format_args!("Input too long, scale factor unchanged\r\n"));
            }
            LineEntry::TimedOut => {
                emit(port, format_args!("No value entered, scale factor unchanged\r\n"));
            }
        }
        Ok(())
    }

    fn report<P: Write>(port: &mut P, err: &CalibrationError) {
        match err {
            CalibrationError::NotANumber => {
                emit(port, format_args!("Not a number, scale factor unchanged\r\n"));
            }
            CalibrationError::OutOfBounds(value) => emit(
                port,
                format_args!(
                    "Scale factor {value} rejected, must be non-zero and within +/-{SCALE_FACTOR_LIMIT}\r\n"
                ),
            ),
            CalibrationError::Store(store) => {
                emit(port, format_args!("Storage write failed ({store}), nothing changed\r\n"));
            }
        }
    }

    fn parameters<P: Write, S: NvStore>(port: &mut P, monitor: &Monitor<S>) {
        let cal = monitor.calibration();
        let settings = cal.settings();
        emit(
            port,
            format_args!(
                "ADC data rate:    {} SPS\r\n\
                 ADC gain:         +/-{:.3} V\r\n\
                 Readings/second:  {:.2}\r\n\
                 Samples/window:   {}\r\n\
                 Counts/mA:        {:.3}\r\n\
                 Offset sum:       {}\r\n\
                 Offset/sample:    {:.3}\r\n\
                 Scale factor:     {:.4}\r\n\
                 Logging:          {}\r\n",
                settings.data_rate.samples_per_second(),
                settings.full_scale_volts(),
                settings.readings_per_second(),
                settings.samples_per_window,
                cal.counts_per_milliamp(),
                cal.offset_sum(),
                cal.offset_per_sample(),
                cal.scale_factor().get(),
                if monitor.logging() { "on" } else { "off" },
            ),
        );
    }

    fn banner<P: Write>(port: &mut P) {
        emit(
            port,
            format_args!("\r\n{FIRMWARE_NAME} v{FIRMWARE_VERSION}\r\nType ? for help\r\n"),
        );
    }

    fn prompt<P: Write>(port: &mut P) {
        emit(port, format_args!("{PROMPT}"));
    }
}
