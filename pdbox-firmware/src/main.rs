//! PDBox - Portable USB-PD Bench Supply Firmware
//!
//! Main firmware binary for the RP2040 board: negotiates with a USB-PD
//! source through an AP33772S, measures the output with an INA226 and is
//! operated with one rotary encoder and a 128x64 OLED.

#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_time::{Delay, Timer};
use embedded_hal_bus::i2c::RefCellDevice;
use heapless::Vec;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use pdbox_core::control::Controller;
use pdbox_core::pdo::{Pdo, PDO_SLOTS};
use pdbox_display::render::{draw_fault, draw_loading};
use pdbox_display::{ssd1306, DisplayBackend, FrameBuffer, LoadingStatus, Ssd1306};
use pdbox_drivers::input::RotaryEncoder;
use pdbox_drivers::pd::Ap33772s;
use pdbox_drivers::sensor::{ina226, Ina226, Ina226Config, Ina226Error};

use crate::board::{Board, I2cBus, Oled, PdController, Sensor};
use crate::clock::EmbassyClock;
use crate::config::DEVICE_CONFIG;

mod board;
mod clock;
mod config;
mod tasks;

/// I2C0 clock
const I2C_FREQUENCY_HZ: u32 = 400_000;

/// Loading screen: status polls while the source handshake completes
const LOADING_POLLS: u32 = 10;
const LOADING_POLL_INTERVAL_MS: u64 = 300;

/// How long the "N PDOs found" screen stays up
const FOUND_SCREEN_MS: u64 = 1_000;

static I2C_BUS: StaticCell<I2cBus> = StaticCell::new();
static FRAME: StaticCell<FrameBuffer> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("PDBox firmware starting...");

    let p = embassy_rp::init(Default::default());

    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = I2C_FREQUENCY_HZ;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_29, p.PIN_28, i2c_config);
    let bus: &'static I2cBus = I2C_BUS.init(RefCell::new(i2c));
    info!("I2C0 initialized at {} Hz", I2C_FREQUENCY_HZ);

    let frame = FRAME.init(FrameBuffer::new());

    let mut oled = Ssd1306::new(RefCellDevice::new(bus), ssd1306::DEFAULT_ADDRESS);
    if let Err(e) = oled.init() {
        warn!("Display init failed: {:?}", e);
    }

    let mut sensor = Ina226::new(RefCellDevice::new(bus), ina226::DEFAULT_ADDRESS);
    if let Err(e) = start_sensor(&mut sensor) {
        error!("INA226 setup failed: {:?}", e);
        let _ = draw_fault(&mut *frame, "Sensor calibration");
        if let Err(e) = oled.flush(frame) {
            warn!("Display flush failed: {:?}", e);
        }
        // Never enter the control loop with an uncalibrated sensor
        return;
    }
    info!("INA226 calibrated");

    let mut pd = Ap33772s::new(RefCellDevice::new(bus), Delay);
    let profiles = negotiate(&mut pd, &mut oled, frame).await;
    info!("{} PDO profiles available", profiles.len());

    let encoder = RotaryEncoder::new(
        Input::new(p.PIN_10, Pull::Up),
        Input::new(p.PIN_9, Pull::Up),
        Input::new(p.PIN_11, Pull::Up),
        &DEVICE_CONFIG.ui,
    );

    let controller = Controller::new(&profiles, DEVICE_CONFIG.ui, &EmbassyClock);

    let board = Board {
        pd,
        sensor,
        oled,
        encoder,
        frame,
    };

    spawner.spawn(tasks::control_task(board, controller)).unwrap();
    info!("All tasks spawned");
}

/// Configure averaging and program the shunt calibration
fn start_sensor(sensor: &mut Sensor) -> Result<(), Ina226Error> {
    sensor.configure(&Ina226Config::default())?;
    sensor.calibrate(&DEVICE_CONFIG.sensor)
}

/// Wait for the source, configure the PD controller and read the profiles
///
/// Animates the loading screen while polling the new-capabilities flag.
/// A source that never reports capabilities yields an empty list; the
/// controller then starts on the fallback profile.
async fn negotiate(
    pd: &mut PdController,
    oled: &mut Oled,
    frame: &mut FrameBuffer,
) -> Vec<Pdo, PDO_SLOTS> {
    let mut ready = false;
    for progress in 0..LOADING_POLLS {
        if pd.new_capabilities_available() {
            ready = true;
            break;
        }
        let status = LoadingStatus::Waiting {
            progress: (progress % 4) as u8,
        };
        show_loading(oled, frame, status);
        Timer::after_millis(LOADING_POLL_INTERVAL_MS).await;
    }
    if !ready {
        warn!("No capabilities reported by the source");
    }

    if let Err(e) = pd.configure(&DEVICE_CONFIG) {
        warn!("PD controller configuration failed: {:?}", e);
    }

    let profiles = pd.read_profiles(DEVICE_CONFIG.probe_min_voltage);
    for pdo in profiles.iter() {
        debug!("PDO {}: {:?}", pdo.index, pdo);
    }

    show_loading(oled, frame, LoadingStatus::Found(profiles.len()));
    Timer::after_millis(FOUND_SCREEN_MS).await;

    profiles
}

fn show_loading(oled: &mut Oled, frame: &mut FrameBuffer, status: LoadingStatus) {
    let _ = draw_loading(frame, status);
    if let Err(e) = oled.flush(frame) {
        warn!("Display flush failed: {:?}", e);
    }
}
