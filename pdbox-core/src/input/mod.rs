//! Rotary encoder input decoding
//!
//! Two quadrature lines and a push button are sampled once per tick and
//! turned into a stream of [`EncoderEvent`]s. One event is pending at a
//! time; the consumer acknowledges it before the next is recognized.

pub mod button;
pub mod decoder;
pub mod quadrature;

pub use button::{Button, Press};
pub use decoder::{EncoderDecoder, EncoderEvent, PinSample};
pub use quadrature::{Quadrature, Rotation};
