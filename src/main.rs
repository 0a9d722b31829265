//! Current Monitor Main Application
//!
//! Entry point for the STM32G474 current monitor. Brings up the shared
//! I2C bus, the ADS1115, display and EEPROM, loads calibration, then runs
//! the control loop. The only spawned task watches the ADC ready line.

#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, Pull, Speed};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::mode::Blocking;
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{self, BufferedUart};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_time::Delay;
use embedded_hal_bus::i2c::RefCellDevice;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ammeter_firmware::hal::gpio::{Indicator, LedState};
use ammeter_firmware::hal::ready_line::ReadyLine;
use ammeter_firmware::hal::uart;
use ammeter_firmware::prelude::*;
use ammeter_firmware::serial::LineCoding;

// Bind interrupt handlers
bind_interrupts!(struct Irqs {
    LPUART1 => usart::BufferedInterruptHandler<peripherals::LPUART1>;
});

/// Conversion-ready flag shared with the EXTI task
static READY: ReadySignal = ReadySignal::new();

static I2C_BUS: StaticCell<RefCell<I2c<'static, Blocking>>> = StaticCell::new();
static TX_BUF: StaticCell<[u8; SERIAL_TX_BUFFER_SIZE]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; SERIAL_RX_BUFFER_SIZE]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("{} v{}", FIRMWARE_NAME, FIRMWARE_VERSION);

    let p = embassy_stm32::init(embassy_stm32::Config::default());

    // PB8 = SCL, PB9 = SDA, shared by ADC, display and EEPROM
    let mut i2c_config = i2c::Config::default();
    i2c_config.scl_pullup = true;
    i2c_config.sda_pullup = true;
    let bus = I2C_BUS.init(RefCell::new(I2c::new_blocking(
        p.I2C1,
        p.PB8,
        p.PB9,
        Hertz(I2C_FREQUENCY_HZ),
        i2c_config,
    )));
    info!("I2C1 initialized at {} Hz", I2C_FREQUENCY_HZ);

    let settings = AcquisitionSettings::default();

    let mut adc = Ads1115::new(RefCellDevice::new(bus), ADS1115_I2C_ADDR);
    if adc.begin().and_then(|()| adc.configure(&settings)).is_err() {
        error!("ADS1115 not responding, use K to restart conversions");
    }

    let sign = Indicator::new(Output::new(p.PB0, Level::Low, Speed::Low), LedState::Off);
    let mut display = ReadingDisplay::new(
        SevenSegment::new(RefCellDevice::new(bus), DISPLAY_I2C_ADDR),
        sign,
        DISPLAY_DECIMALS,
    );
    if display.begin().is_err() {
        warn!("display not responding");
    }

    let eeprom = Eeprom24x::m24c64(RefCellDevice::new(bus), Delay);
    let (engine, outcome) = CalibrationEngine::open(eeprom, settings);
    match outcome {
        LoadOutcome::Loaded => info!("calibration loaded"),
        LoadOutcome::Initialized => info!("calibration store initialized with defaults"),
        LoadOutcome::Unavailable(err) => warn!("calibration store unavailable: {}", err),
    }

    let port = match BufferedUart::new(
        p.LPUART1,
        Irqs,
        p.PA3,
        p.PA2,
        TX_BUF.init([0; SERIAL_TX_BUFFER_SIZE]),
        RX_BUF.init([0; SERIAL_RX_BUFFER_SIZE]),
        uart::config(&LineCoding::default()),
    ) {
        Ok(port) => port,
        Err(_) => {
            error!("LPUART1 configuration rejected");
            loop {
                yield_now().await;
            }
        }
    };

    let activity = Indicator::new(Output::new(p.PA5, Level::Low, Speed::Low), LedState::Off);
    let ready = ReadyLine::new(ExtiInput::new(p.PA0, p.EXTI0, Pull::Up));
    if spawner.spawn(ready_task(ready)).is_err() {
        error!("ready task could not be spawned");
    }

    let mut control = ControlLoop::new(adc, display, activity, port, Delay, Monitor::new(engine));
    control.greet();
    info!("entering control loop");

    loop {
        control.step(&READY);
        yield_now().await;
    }
}

/// Latch ADS1115 conversion-ready pulses
#[embassy_executor::task]
async fn ready_task(mut line: ReadyLine<'static>) {
    line.watch(&READY).await;
}
