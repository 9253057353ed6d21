//! USB-PD sink controllers

pub mod ap33772s;

pub use ap33772s::{Ap33772s, PdError, Status};
