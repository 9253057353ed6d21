//! Board wiring
//!
//! All three I2C peripherals share I2C0 (SDA GPIO28, SCL GPIO29) through
//! `RefCellDevice`s; the encoder sits on GPIO10 (A), GPIO9 (B) and
//! GPIO11 (button).

use core::cell::RefCell;

use embassy_rp::gpio::Input;
use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_time::Delay;
use embedded_hal_bus::i2c::RefCellDevice;

use pdbox_display::{FrameBuffer, Ssd1306};
use pdbox_drivers::input::RotaryEncoder;
use pdbox_drivers::pd::Ap33772s;
use pdbox_drivers::sensor::Ina226;

pub type I2cBus = RefCell<I2c<'static, I2C0, Blocking>>;
pub type BusDevice = RefCellDevice<'static, I2c<'static, I2C0, Blocking>>;

pub type PdController = Ap33772s<BusDevice, Delay>;
pub type Sensor = Ina226<BusDevice>;
pub type Oled = Ssd1306<BusDevice>;
pub type Encoder = RotaryEncoder<Input<'static>, Input<'static>, Input<'static>>;

/// Peripherals owned by the control task
pub struct Board {
    pub pd: PdController,
    pub sensor: Sensor,
    pub oled: Oled,
    pub encoder: Encoder,
    pub frame: &'static mut FrameBuffer,
}
