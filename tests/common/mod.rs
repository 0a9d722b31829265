//! Host-side test doubles
//!
//! Serial port, delay, ADC, I2C buses, pins and display sink that stand in
//! for the board peripherals. Shared by all integration test binaries.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::rc::Rc;

use ammeter_firmware::calibration::CalibrationEngine;
use ammeter_firmware::drivers::DisplaySink;
use ammeter_firmware::monitor::Monitor;
use ammeter_firmware::sampling::AcquisitionSource;
use ammeter_firmware::storage::{NvStore, RamStore, StoreError, StoreResult};
use ammeter_firmware::types::{AcquisitionSettings, Polarity};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, StatefulOutputPin};
use embedded_hal::i2c::{self, ErrorKind, I2c, NoAcknowledgeSource, Operation};

/// Store size used by the tests
pub const STORE_SIZE: usize = 64;

/// Store type used by the tests
pub type TestStore = RamStore<STORE_SIZE>;

// =============================================================================
// Virtual Clock
// =============================================================================

/// Shared virtual time in nanoseconds
#[derive(Clone, Default)]
pub struct Clock(Rc<Cell<u64>>);

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.0.get() / 1_000_000
    }

    pub fn advance_ns(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }
}

/// Delay that advances the virtual clock instead of sleeping
#[derive(Clone, Default)]
pub struct MockDelay {
    clock: Clock,
}

impl MockDelay {
    pub fn new(clock: Clock) -> Self {
        Self { clock }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_ns(u64::from(ns));
    }
}

// =============================================================================
// Serial Port
// =============================================================================

/// Serial port fed by timed input bursts
///
/// Each burst becomes readable once the virtual clock reaches its arrival
/// time. Everything written is captured.
pub struct ScriptedSerial {
    clock: Clock,
    pending: VecDeque<(u64, Vec<u8>)>,
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    /// Byte repeated once the script runs dry
    chatter: Option<u8>,
    /// Bytes read so far
    pub bytes_read: usize,
}

impl ScriptedSerial {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            pending: VecDeque::new(),
            rx: VecDeque::new(),
            tx: Vec::new(),
            chatter: None,
            bytes_read: 0,
        }
    }

    /// Bytes readable immediately
    pub fn push(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Bytes readable once the clock reaches `at_ms`
    pub fn push_at(&mut self, at_ms: u64, bytes: &[u8]) {
        self.pending.push_back((at_ms, bytes.to_vec()));
    }

    /// Repeat `byte` forever once the scripted input is used up
    pub fn chatter(&mut self, byte: u8) {
        self.chatter = Some(byte);
    }

    /// Output captured so far, as text
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.tx).into_owned()
    }

    /// Take and clear the captured output
    pub fn take_output(&mut self) -> String {
        let out = self.output();
        self.tx.clear();
        out
    }

    /// Bytes still waiting to be read
    pub fn unread(&mut self) -> usize {
        self.arrive();
        self.rx.len()
    }

    fn arrive(&mut self) {
        let now = self.clock.now_ms();
        while let Some((at, _)) = self.pending.front() {
            if *at > now {
                break;
            }
            if let Some((_, bytes)) = self.pending.pop_front() {
                self.rx.extend(bytes);
            }
        }
    }
}

impl embedded_io::ErrorType for ScriptedSerial {
    type Error = Infallible;
}

impl embedded_io::ReadReady for ScriptedSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        self.arrive();
        Ok(!self.rx.is_empty() || self.chatter.is_some())
    }
}

impl embedded_io::Read for ScriptedSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.arrive();
        let mut n = 0;
        while n < buf.len() {
            match self.rx.pop_front().or(self.chatter) {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        self.bytes_read += n;
        Ok(n)
    }
}

impl embedded_io::Write for ScriptedSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Serial port with nothing to read whose writes always fail
#[derive(Default)]
pub struct DeadSerial {
    pub write_attempts: u32,
}

impl embedded_io::ErrorType for DeadSerial {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::ReadReady for DeadSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

impl embedded_io::Read for DeadSerial {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(0)
    }
}

impl embedded_io::Write for DeadSerial {
    fn write(&mut self, _buf: &[u8]) -> Result<usize, Self::Error> {
        self.write_attempts += 1;
        Err(embedded_io::ErrorKind::Other)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Err(embedded_io::ErrorKind::Other)
    }
}

// =============================================================================
// ADC
// =============================================================================

/// Acquisition source returning scripted codes
#[derive(Default)]
pub struct MockAdc {
    codes: VecDeque<i16>,
    /// Code returned once the script runs out
    pub idle_code: i16,
    /// Number of conversion requests
    pub requests: u32,
    /// Fail every operation
    pub fail: bool,
}

impl MockAdc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codes(codes: &[i16]) -> Self {
        Self {
            codes: codes.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.codes.len()
    }
}

impl AcquisitionSource for MockAdc {
    type Error = ();

    fn read_latest_code(&mut self) -> Result<i16, Self::Error> {
        if self.fail {
            return Err(());
        }
        Ok(self.codes.pop_front().unwrap_or(self.idle_code))
    }

    fn request_conversion(&mut self) -> Result<(), Self::Error> {
        if self.fail {
            return Err(());
        }
        self.requests += 1;
        Ok(())
    }
}

// =============================================================================
// Storage
// =============================================================================

/// RAM store with switchable failures
pub struct FailingStore {
    pub inner: TestStore,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self {
            inner: TestStore::new(),
            fail_reads: false,
            fail_writes: false,
        }
    }
}

impl NvStore for FailingStore {
    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn read(&mut self, address: u16, buf: &mut [u8]) -> StoreResult<()> {
        if self.fail_reads {
            return Err(StoreError::Bus);
        }
        self.inner.read(address, buf)
    }

    fn write(&mut self, address: u16, data: &[u8]) -> StoreResult<()> {
        if self.fail_writes {
            return Err(StoreError::Bus);
        }
        self.inner.write(address, data)
    }
}

// =============================================================================
// I2C
// =============================================================================

/// Register-file I2C device
///
/// A 3-byte write stores a big-endian 16-bit register; a read returns the
/// register selected by the last written pointer. All writes are recorded.
#[derive(Default)]
pub struct MockI2c {
    pub writes: Vec<(u8, Vec<u8>)>,
    registers: HashMap<u8, u16>,
    pointer: u8,
    pub fail: bool,
}

impl MockI2c {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_register(&mut self, reg: u8, value: u16) {
        self.registers.insert(reg, value);
    }

    pub fn register(&self, reg: u8) -> Option<u16> {
        self.registers.get(&reg).copied()
    }

    /// `(register, value)` for every register write, in order
    pub fn register_writes(&self) -> Vec<(u8, u16)> {
        self.writes
            .iter()
            .filter(|(_, bytes)| bytes.len() == 3)
            .map(|(_, b)| (b[0], u16::from_be_bytes([b[1], b[2]])))
            .collect()
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(ErrorKind::Bus);
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    self.writes.push((address, bytes.to_vec()));
                    if let Some(reg) = bytes.first() {
                        self.pointer = *reg;
                    }
                    if bytes.len() == 3 {
                        self.registers
                            .insert(bytes[0], u16::from_be_bytes([bytes[1], bytes[2]]));
                    }
                }
                Operation::Read(buf) => {
                    let value = self.registers.get(&self.pointer).copied().unwrap_or(0);
                    for (dst, src) in buf.iter_mut().zip(value.to_be_bytes()) {
                        *dst = src;
                    }
                }
            }
        }
        Ok(())
    }
}

/// 24xx EEPROM simulation with a write cycle
///
/// After a data write the device NACKs `busy_polls` attempts before it
/// acknowledges again.
pub struct SimEeprom {
    pub memory: Vec<u8>,
    pub page_size: usize,
    pub busy_polls: u32,
    busy: u32,
    pointer: usize,
    /// `(address, len)` of every data write
    pub page_writes: Vec<(usize, usize)>,
    /// Attempts rejected while busy
    pub nacks: u32,
    pub fail: bool,
}

impl SimEeprom {
    pub fn new(capacity: usize, page_size: usize) -> Self {
        Self {
            memory: vec![0xFF; capacity],
            page_size,
            busy_polls: 0,
            busy: 0,
            pointer: 0,
            page_writes: Vec::new(),
            nacks: 0,
            fail: false,
        }
    }
}

impl i2c::ErrorType for SimEeprom {
    type Error = ErrorKind;
}

impl I2c for SimEeprom {
    fn transaction(&mut self, _address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(ErrorKind::Bus);
        }
        if self.busy > 0 {
            self.busy -= 1;
            self.nacks += 1;
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if bytes.len() < 2 {
                        return Err(ErrorKind::Other);
                    }
                    self.pointer = usize::from(u16::from_be_bytes([bytes[0], bytes[1]]));
                    let data = &bytes[2..];
                    if !data.is_empty() {
                        let page = self.pointer / self.page_size;
                        for (i, byte) in data.iter().enumerate() {
                            // Writes wrap inside the page like the real part
                            let at = page * self.page_size + (self.pointer + i) % self.page_size;
                            self.memory[at] = *byte;
                        }
                        self.page_writes.push((self.pointer, data.len()));
                        self.busy = self.busy_polls;
                    }
                }
                Operation::Read(buf) => {
                    for byte in buf.iter_mut() {
                        *byte = self.memory[self.pointer % self.memory.len()];
                        self.pointer += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Pins and Display
// =============================================================================

/// Output pin that remembers its level
#[derive(Default)]
pub struct MockPin {
    pub high: bool,
    pub toggles: u32,
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

impl StatefulOutputPin for MockPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high)
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.high = !self.high;
        self.toggles += 1;
        Ok(())
    }
}

/// Display sink that records every reading shown
#[derive(Default)]
pub struct RecordingDisplay {
    pub shown: Vec<(f32, Polarity)>,
}

impl DisplaySink for RecordingDisplay {
    type Error = Infallible;

    fn show(&mut self, amps: f32, polarity: Polarity) -> Result<(), Self::Error> {
        self.shown.push((amps, polarity));
        Ok(())
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Monitor over a blank RAM store with default settings
pub fn monitor() -> Monitor<TestStore> {
    monitor_with(AcquisitionSettings::default())
}

/// Monitor over a blank RAM store
pub fn monitor_with(settings: AcquisitionSettings) -> Monitor<TestStore> {
    let (engine, _) = CalibrationEngine::open(TestStore::new(), settings);
    Monitor::new(engine)
}

/// Settings with a small window for quick tests
pub fn small_window(samples: u16) -> AcquisitionSettings {
    AcquisitionSettings {
        samples_per_window: samples,
        ..AcquisitionSettings::default()
    }
}

/// Feed `count` copies of `code`, returning the last report
pub fn feed<S: NvStore>(
    monitor: &mut Monitor<S>,
    code: i16,
    count: usize,
) -> Option<ammeter_firmware::monitor::WindowReport> {
    let mut last = None;
    for _ in 0..count {
        if let Some(report) = monitor.ingest(code) {
            last = Some(report);
        }
    }
    last
}
