//! INA226 bidirectional current/power monitor (I2C)
//!
//! Measures the supply output through a low-side or high-side shunt.
//! All registers are 16-bit big-endian.
//!
//! # Scaling
//!
//! - Bus voltage: 1.25 mV/LSB
//! - Shunt voltage: 2.5 µV/LSB, signed
//! - Current: `current_lsb`, signed, valid only after calibration
//! - Power: 25 × `current_lsb`

use embedded_hal::i2c::I2c;

use pdbox_core::config::SensorCalibration;
use pdbox_core::traits::PowerMonitor;

/// Address with A0 and A1 tied to GND
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// INA226 register addresses
pub mod reg {
    pub const CONFIG: u8 = 0x00;
    pub const SHUNT_VOLTAGE: u8 = 0x01;
    pub const BUS_VOLTAGE: u8 = 0x02;
    pub const POWER: u8 = 0x03;
    pub const CURRENT: u8 = 0x04;
    pub const CALIBRATION: u8 = 0x05;
    pub const MASK_ENABLE: u8 = 0x06;
    pub const ALERT_LIMIT: u8 = 0x07;
    pub const MANUFACTURER_ID: u8 = 0xFE;
    pub const DIE_ID: u8 = 0xFF;

    /// Software reset bit in CONFIG
    pub const CONFIG_RESET: u16 = 1 << 15;
    /// CONFIG bit 14 always reads back as 1
    pub const CONFIG_FIXED: u16 = 1 << 14;
    pub const AVG_SHIFT: u16 = 9;
    pub const AVG_MASK: u16 = 0b111 << AVG_SHIFT;
    pub const VBUSCT_SHIFT: u16 = 6;
    pub const VSHCT_SHIFT: u16 = 3;
}

/// "TI" in ASCII
pub const MANUFACTURER_ID: u16 = 0x5449;
pub const DIE_ID: u16 = 0x2260;

/// Smallest shunt the calibration accepts (1 mΩ)
const MIN_SHUNT_MICRO_OHM: u32 = 1_000;

/// 0.00512 scaled for µA × µΩ
const CALIBRATION_CONSTANT: u64 = 5_120_000_000;

/// Largest value the 15-bit calibration register holds
const MAX_CALIBRATION: u64 = 0x7FFF;

/// INA226 errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ina226Error {
    /// Bus transfer failed
    Transport,
    /// Shunt or current LSB out of range, or current read before calibration
    Calibration,
}

/// Samples averaged per conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AveragingMode {
    Samples1 = 0,
    Samples4 = 1,
    Samples16 = 2,
    Samples64 = 3,
    Samples128 = 4,
    Samples256 = 5,
    Samples512 = 6,
    Samples1024 = 7,
}

/// Conversion time for one bus or shunt sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConversionTime {
    Us140 = 0,
    Us204 = 1,
    Us332 = 2,
    Us588 = 3,
    Us1100 = 4,
    Us2116 = 5,
    Us4156 = 6,
    Us8244 = 7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    PowerDown = 0,
    ShuntTriggered = 1,
    BusTriggered = 2,
    ShuntAndBusTriggered = 3,
    ShuntContinuous = 5,
    BusContinuous = 6,
    ShuntAndBusContinuous = 7,
}

/// CONFIG register contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ina226Config {
    pub averaging: AveragingMode,
    pub bus_conversion: ConversionTime,
    pub shunt_conversion: ConversionTime,
    pub mode: OperatingMode,
}

impl Default for Ina226Config {
    /// 128-sample averaging, 1.1 ms conversions, continuous
    fn default() -> Self {
        Self {
            averaging: AveragingMode::Samples128,
            bus_conversion: ConversionTime::Us1100,
            shunt_conversion: ConversionTime::Us1100,
            mode: OperatingMode::ShuntAndBusContinuous,
        }
    }
}

impl Ina226Config {
    pub fn to_register(&self) -> u16 {
        reg::CONFIG_FIXED
            | ((self.averaging as u16) << reg::AVG_SHIFT)
            | ((self.bus_conversion as u16) << reg::VBUSCT_SHIFT)
            | ((self.shunt_conversion as u16) << reg::VSHCT_SHIFT)
            | self.mode as u16
    }
}

/// Compute the calibration register value
pub fn calibration_value(cal: &SensorCalibration) -> Result<u16, Ina226Error> {
    if cal.shunt_micro_ohm < MIN_SHUNT_MICRO_OHM || cal.current_lsb_ua == 0 {
        return Err(Ina226Error::Calibration);
    }
    let value = CALIBRATION_CONSTANT / (cal.current_lsb_ua as u64 * cal.shunt_micro_ohm as u64);
    if value == 0 || value > MAX_CALIBRATION {
        return Err(Ina226Error::Calibration);
    }
    Ok(value as u16)
}

/// INA226 driver
pub struct Ina226<I2C> {
    i2c: I2C,
    address: u8,
    /// Current LSB in µA; 0 until calibrated
    current_lsb_ua: u32,
}

impl<I2C: I2c> Ina226<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            current_lsb_ua: 0,
        }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_register(&mut self, register: u8) -> Result<u16, Ina226Error> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(|_| Ina226Error::Transport)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn write_register(&mut self, register: u8, value: u16) -> Result<(), Ina226Error> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[register, hi, lo])
            .map_err(|_| Ina226Error::Transport)
    }

    /// Software reset; clears calibration
    pub fn reset(&mut self) -> Result<(), Ina226Error> {
        self.write_register(reg::CONFIG, reg::CONFIG_RESET)?;
        self.current_lsb_ua = 0;
        Ok(())
    }

    pub fn configure(&mut self, config: &Ina226Config) -> Result<(), Ina226Error> {
        self.write_register(reg::CONFIG, config.to_register())
    }

    /// Change only the averaging field of CONFIG
    pub fn set_averaging_mode(&mut self, mode: AveragingMode) -> Result<(), Ina226Error> {
        let config = self.read_register(reg::CONFIG)?;
        let config = (config & !reg::AVG_MASK) | ((mode as u16) << reg::AVG_SHIFT);
        self.write_register(reg::CONFIG, config)
    }

    /// Program the calibration register
    ///
    /// Rejects shunts below 1 mΩ and any combination whose calibration
    /// value does not fit the register. Nothing is written on rejection.
    pub fn calibrate(&mut self, cal: &SensorCalibration) -> Result<(), Ina226Error> {
        let value = calibration_value(cal)?;
        self.write_register(reg::CALIBRATION, value)?;
        self.current_lsb_ua = cal.current_lsb_ua;
        Ok(())
    }

    pub fn is_calibrated(&self) -> bool {
        self.current_lsb_ua != 0
    }

    pub fn bus_voltage_mv(&mut self) -> Result<u32, Ina226Error> {
        let raw = self.read_register(reg::BUS_VOLTAGE)? as u32;
        Ok(raw * 5 / 4)
    }

    pub fn shunt_voltage_uv(&mut self) -> Result<i32, Ina226Error> {
        let raw = self.read_register(reg::SHUNT_VOLTAGE)? as i16 as i32;
        Ok(raw * 5 / 2)
    }

    pub fn current_ma(&mut self) -> Result<i32, Ina226Error> {
        if !self.is_calibrated() {
            return Err(Ina226Error::Calibration);
        }
        let raw = self.read_register(reg::CURRENT)? as i16 as i64;
        Ok((raw * self.current_lsb_ua as i64 / 1000) as i32)
    }

    pub fn power_mw(&mut self) -> Result<u32, Ina226Error> {
        if !self.is_calibrated() {
            return Err(Ina226Error::Calibration);
        }
        let raw = self.read_register(reg::POWER)? as u64;
        Ok((raw * 25 * self.current_lsb_ua as u64 / 1000) as u32)
    }

    pub fn manufacturer_id(&mut self) -> Result<u16, Ina226Error> {
        self.read_register(reg::MANUFACTURER_ID)
    }

    pub fn die_id(&mut self) -> Result<u16, Ina226Error> {
        self.read_register(reg::DIE_ID)
    }
}

impl<I2C: I2c> PowerMonitor for Ina226<I2C> {
    type Error = Ina226Error;

    fn bus_voltage_mv(&mut self) -> Result<u32, Ina226Error> {
        Ina226::bus_voltage_mv(self)
    }

    fn current_ma(&mut self) -> Result<i32, Ina226Error> {
        Ina226::current_ma(self)
    }
}
