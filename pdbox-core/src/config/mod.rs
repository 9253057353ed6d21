//! Configuration types
//!
//! Board-agnostic tunables. The firmware fills these from a build-time
//! validated `device.toml`; anything left out keeps the defaults here.

pub mod types;

pub use types::*;
