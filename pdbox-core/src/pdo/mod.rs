//! Power Data Object model
//!
//! The PD controller exposes the source's advertised capabilities as a
//! table of 13 little-endian 16-bit words. Slots 0-6 belong to the
//! Standard Power Range (SPR) and slots 7-12 to the Extended Power Range
//! (EPR); the same bit layout is interpreted differently depending on the
//! type bit and the region, so decoding produces a tagged
//! [`SourceCapability`] rather than a reinterpretation of the raw word.

pub mod capability;
pub mod profile;
pub mod request;

pub use capability::{
    CapabilityTable, FixedSupply, MinVoltage, PowerRange, ProgrammableSupply, SourceCapability,
    PDO_SLOTS, TABLE_BYTES,
};
pub use profile::{Pdo, PdoKind};
pub use request::{InvalidRequest, NegotiationRequest};

/// Lowest voltage the negotiation layer will ever request (mV)
pub const MIN_REQUEST_VOLTAGE_MV: u16 = 3300;

/// Current floor shared by every profile (mA)
pub const MIN_CURRENT_MA: u16 = 1000;

/// Current resolution of both the capability table and requests (mA)
pub const CURRENT_STEP_MA: u16 = 250;
