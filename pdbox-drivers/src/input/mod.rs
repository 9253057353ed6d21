//! Input device front-ends

pub mod encoder;

pub use encoder::RotaryEncoder;
