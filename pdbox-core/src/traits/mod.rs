//! Hardware abstraction traits
//!
//! These traits define the interface between the control logic and the
//! peripheral drivers.

pub mod power;

pub use power::{PowerMonitor, PowerSource};
