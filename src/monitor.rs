//! Current Monitor Control Loop
//!
//! [`Monitor`] is the single state struct owned by the main loop: the open
//! window, the calibration engine and the logging switch. [`ControlLoop`]
//! pairs it with the peripherals and runs one cooperative iteration per
//! [`ControlLoop::step`]. Nothing here runs in interrupt context; the
//! interrupt side only raises the [`ReadySignal`].

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::StatefulOutputPin;
use embedded_io::{Read, ReadReady, Write};

use crate::calibration::{CalibrationEngine, Reading};
use crate::console::{Command, Console};
use crate::datalog::{self, LogRecord};
use crate::drivers::DisplaySink;
use crate::sampling::{AcquisitionSource, ReadySignal, SampleAggregator, Window};
use crate::storage::NvStore;

/// A completed window and its calibrated reading
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowReport {
    /// Raw aggregate
    pub window: Window,
    /// Calibrated result
    pub reading: Reading,
}

/// Measurement and calibration state
pub struct Monitor<S: NvStore> {
    aggregator: SampleAggregator,
    calibration: CalibrationEngine<S>,
    logging: bool,
    last_window: Option<Window>,
    last_reading: Option<Reading>,
}

impl<S: NvStore> Monitor<S> {
    /// Create a monitor with windows sized by the engine's settings
    #[must_use]
    pub fn new(calibration: CalibrationEngine<S>) -> Self {
        Self {
            aggregator: SampleAggregator::new(calibration.settings().samples_per_window),
            calibration,
            logging: false,
            last_window: None,
            last_reading: None,
        }
    }

    /// Aggregate one raw code
    ///
    /// Returns the report when the code completes a window.
    pub fn ingest(&mut self, code: i16) -> Option<WindowReport> {
        let window = self.aggregator.push(code)?;
        let reading = self.calibration.compute_reading(&window);
        self.last_window = Some(window);
        self.last_reading = Some(reading);
        trace!("window complete: {}", window);
        Some(WindowReport { window, reading })
    }

    /// Flip the logging switch, returning the new state
    pub fn toggle_logging(&mut self) -> bool {
        self.logging = !self.logging;
        self.logging
    }

    /// Whether log records are emitted
    #[must_use]
    pub const fn logging(&self) -> bool {
        self.logging
    }

    /// Most recent completed window
    #[must_use]
    pub const fn last_window(&self) -> Option<Window> {
        self.last_window
    }

    /// Most recent reading
    #[must_use]
    pub const fn last_reading(&self) -> Option<Reading> {
        self.last_reading
    }

    /// Open window state
    #[must_use]
    pub const fn aggregator(&self) -> &SampleAggregator {
        &self.aggregator
    }

    /// Calibration constants
    #[must_use]
    pub const fn calibration(&self) -> &CalibrationEngine<S> {
        &self.calibration
    }

    /// Mutable access for the console
    pub fn calibration_mut(&mut self) -> &mut CalibrationEngine<S> {
        &mut self.calibration
    }
}

/// What one loop iteration did
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepOutcome {
    /// A ready event was consumed and a code read
    pub sampled: bool,
    /// The sample completed a window
    pub report: Option<WindowReport>,
    /// A console command was handled
    pub command: Option<Command>,
}

/// Peripherals plus monitor state
pub struct ControlLoop<A, Ds, L, P, D, S>
where
    S: NvStore,
{
    adc: A,
    display: Ds,
    activity: L,
    port: P,
    delay: D,
    monitor: Monitor<S>,
    console: Console,
}

impl<A, Ds, L, P, D, S> ControlLoop<A, Ds, L, P, D, S>
where
    A: AcquisitionSource,
    Ds: DisplaySink,
    L: StatefulOutputPin,
    P: Read + ReadReady + Write,
    D: DelayNs,
    S: NvStore,
{
    /// Assemble the loop
    pub fn new(adc: A, display: Ds, activity: L, port: P, delay: D, monitor: Monitor<S>) -> Self {
        Self {
            adc,
            display,
            activity,
            port,
            delay,
            monitor,
            console: Console::new(),
        }
    }

    /// Print the banner and prompt
    pub fn greet(&mut self) {
        self.console.greet(&mut self.port);
    }

    /// Run one iteration: service a pending ready event, then the console
    pub fn step(&mut self, ready: &ReadySignal) -> StepOutcome {
        let mut outcome = StepOutcome::default();

        if ready.take() {
            match self.adc.read_latest_code() {
                Ok(code) => {
                    outcome.sampled = true;
                    outcome.report = self.monitor.ingest(code);
                }
                Err(_) => warn!("ADC read failed, sample dropped"),
            }
        }

        if let Some(report) = outcome.report {
            self.publish(&report);
        }

        match self
            .console
            .poll(&mut self.port, &mut self.delay, &mut self.monitor, &mut self.adc)
        {
            Ok(command) => outcome.command = command,
            Err(_) => warn!("serial read failed"),
        }

        outcome
    }

    /// Update display, log and activity indicator for a completed window
    fn publish(&mut self, report: &WindowReport) {
        let reading = &report.reading;
        if self.display.show(reading.amps, reading.polarity).is_err() {
            warn!("display update failed");
        }
        if self.monitor.logging()
            && datalog::write_record(&mut self.port, &LogRecord::new(reading)).is_err()
        {
            warn!("log record write failed");
        }
        if self.activity.toggle().is_err() {
            warn!("activity LED toggle failed");
        }
    }

    /// Measurement state
    #[must_use]
    pub const fn monitor(&self) -> &Monitor<S> {
        &self.monitor
    }

    /// Mutable measurement state
    pub fn monitor_mut(&mut self) -> &mut Monitor<S> {
        &mut self.monitor
    }

    /// Serial port
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Display sink
    #[must_use]
    pub const fn display(&self) -> &Ds {
        &self.display
    }

    /// Activity indicator
    #[must_use]
    pub const fn activity(&self) -> &L {
        &self.activity
    }

    /// Acquisition source
    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }
}
