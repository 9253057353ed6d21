//! Build-time device configuration
//!
//! `build.rs` validates `device.toml` and generates `DEVICE_CONFIG`.
//! Edit device.toml and rebuild to customize.

use pdbox_core::config::{DeviceConfig, NtcCalibration, SensorCalibration, UiTiming};

include!(concat!(env!("OUT_DIR"), "/device_config.rs"));
