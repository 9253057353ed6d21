//! Output power monitoring

pub mod ina226;

pub use ina226::{
    AveragingMode, ConversionTime, Ina226, Ina226Config, Ina226Error, OperatingMode,
};
