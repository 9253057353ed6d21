//! Configuration type definitions

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// User interface timing windows (all in milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UiTiming {
    /// Button must read pressed this long before it counts
    pub debounce_ms: u32,
    /// Hold time that turns a press into a long press
    pub long_press_ms: u32,
    /// Maximum gap between the two clicks of a double click (inclusive)
    pub double_click_ms: u32,
    /// Rotations closer together than this use the large step (inclusive)
    pub fast_rotation_ms: u32,
    /// Large step = normal step × this
    pub large_step_multiplier: u16,
    /// Half period of the edit cursor blink
    pub blink_ms: u32,
    /// Sensor and temperature refresh period
    pub measure_ms: u32,
}

impl UiTiming {
    pub const DEFAULT: Self = Self {
        debounce_ms: 50,
        long_press_ms: 1000,
        double_click_ms: 1000,
        fast_rotation_ms: 75,
        large_step_multiplier: 10,
        blink_ms: 500,
        measure_ms: 200,
    };
}

impl Default for UiTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Thermistor resistance table written to the PD controller (Ω)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NtcCalibration {
    pub r25: u16,
    pub r50: u16,
    pub r75: u16,
    pub r100: u16,
}

impl NtcCalibration {
    /// 10 kΩ NTC, B = 3435
    pub const DEFAULT: Self = Self {
        r25: 10000,
        r50: 4161,
        r75: 1928,
        r100: 974,
    };
}

impl Default for NtcCalibration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Current sense calibration for the power monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SensorCalibration {
    /// Shunt resistance in µΩ
    pub shunt_micro_ohm: u32,
    /// Current register resolution in µA per bit
    pub current_lsb_ua: u32,
}

impl SensorCalibration {
    pub const DEFAULT: Self = Self {
        shunt_micro_ohm: 10_000,
        current_lsb_ua: 250,
    };
}

impl Default for SensorCalibration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Complete device configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceConfig {
    pub ui: UiTiming,
    pub ntc: NtcCalibration,
    pub sensor: SensorCalibration,
    /// Minimum selectable voltage programmed into the PD controller (mV)
    pub min_selectable_mv: u16,
    /// Discover undeclared PPS/AVS minimum voltages by trial negotiation
    pub probe_min_voltage: bool,
}

impl DeviceConfig {
    pub const DEFAULT: Self = Self {
        ui: UiTiming::DEFAULT,
        ntc: NtcCalibration::DEFAULT,
        sensor: SensorCalibration::DEFAULT,
        min_selectable_mv: 5000,
        probe_min_voltage: true,
    };
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
