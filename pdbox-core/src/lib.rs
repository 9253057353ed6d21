//! Board-agnostic core logic for the USB-PD bench supply firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Millisecond clock capability shared by every timing window
//! - Power Data Object model and capability table decoding
//! - Rotary encoder decoding (quadrature, debounce, press classification)
//! - Menu/Main device control state machine
//! - Hardware abstraction traits (PD source, power monitor)
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod control;
pub mod input;
pub mod pdo;
pub mod traits;
