//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in pdbox-core for the supply's peripherals:
//!
//! - USB-PD sink controller (AP33772S)
//! - Current/voltage monitor (INA226)
//! - Rotary encoder GPIO front-end

#![no_std]
#![deny(unsafe_code)]

pub mod input;
pub mod pd;
pub mod sensor;
