//! Display stack for the PDBox OLED
//!
//! This crate provides:
//! - `FrameBuffer`: a 128x64 monochrome page buffer that tracks which
//!   pages changed, usable as an `embedded-graphics` draw target
//! - `DisplayBackend` trait for panels that can take a frame
//! - `Ssd1306`: the I2C transport for the SSD1306 controller
//! - `render`: the loading, menu, main and fault screens
//!
//! # Architecture
//!
//! The control loop hands the renderer value snapshots (`View`,
//! `Readings`) from pdbox-core. The renderer draws into the frame buffer
//! and the backend pushes only the dirty pages to the panel.

#![no_std]
#![deny(unsafe_code)]

pub mod backend;
pub mod frame;
pub mod render;
pub mod ssd1306;

pub use backend::{DisplayBackend, DisplayError};
pub use frame::{FrameBuffer, HEIGHT, PAGES, WIDTH};
pub use render::{render, LoadingStatus};
pub use ssd1306::Ssd1306;
