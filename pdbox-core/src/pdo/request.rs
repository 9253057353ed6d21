//! Negotiation request word
//!
//! ```text
//! 15..12           11..8             7..0
//! pdo_index + 1    current_selector  voltage_selector
//! ```

use super::capability::{PowerRange, PDO_SLOTS};
use super::{CURRENT_STEP_MA, MIN_CURRENT_MA, MIN_REQUEST_VOLTAGE_MV};

/// Reasons a request is refused before reaching the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InvalidRequest {
    IndexOutOfRange,
    VoltageBelowFloor,
    CurrentBelowFloor,
}

/// A packed request, built per negotiation and then discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NegotiationRequest {
    /// 1-based slot position
    pub position: u8,
    pub voltage_selector: u8,
    pub current_selector: u8,
}

impl NegotiationRequest {
    /// Validate and pack a request for slot `index`
    pub fn new(index: usize, voltage_mv: u16, current_ma: u16) -> Result<Self, InvalidRequest> {
        let range = PowerRange::for_index(index).ok_or(InvalidRequest::IndexOutOfRange)?;
        if voltage_mv < MIN_REQUEST_VOLTAGE_MV {
            return Err(InvalidRequest::VoltageBelowFloor);
        }
        if current_ma < MIN_CURRENT_MA {
            return Err(InvalidRequest::CurrentBelowFloor);
        }

        let voltage_selector = (voltage_mv / range.voltage_unit_mv()).min(u8::MAX as u16) as u8;
        let current_selector = (current_ma / CURRENT_STEP_MA).saturating_sub(4).min(0x0F) as u8;

        debug_assert!(index < PDO_SLOTS);
        Ok(Self {
            position: index as u8 + 1,
            voltage_selector,
            current_selector,
        })
    }

    /// Register value
    pub fn to_word(self) -> u16 {
        ((self.position as u16 & 0x0F) << 12)
            | ((self.current_selector as u16 & 0x0F) << 8)
            | self.voltage_selector as u16
    }

    /// Little-endian register bytes
    pub fn to_le_bytes(self) -> [u8; 2] {
        self.to_word().to_le_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_spr_request() {
        let req = NegotiationRequest::new(3, 9000, 2000).unwrap();
        assert_eq!(req.position, 4);
        assert_eq!(req.voltage_selector, 90);
        assert_eq!(req.current_selector, 4);
        assert_eq!(req.to_word(), 0x4000 | 0x0400 | 90);
    }

    #[test]
    fn test_pack_epr_request_uses_200mv_unit() {
        let req = NegotiationRequest::new(8, 28000, 5000).unwrap();
        assert_eq!(req.voltage_selector, 140);
        assert_eq!(req.current_selector, 15);
        assert_eq!(req.to_word() >> 12, 9);
    }

    #[test]
    fn test_current_selector_saturates() {
        let req = NegotiationRequest::new(0, 5000, 1000).unwrap();
        assert_eq!(req.current_selector, 0);
        let req = NegotiationRequest::new(0, 5000, 9000).unwrap();
        assert_eq!(req.current_selector, 15);
    }

    #[test]
    fn test_rejects_invalid_arguments() {
        assert_eq!(
            NegotiationRequest::new(0, 3000, 1000),
            Err(InvalidRequest::VoltageBelowFloor)
        );
        assert_eq!(
            NegotiationRequest::new(0, 5000, 999),
            Err(InvalidRequest::CurrentBelowFloor)
        );
        assert_eq!(
            NegotiationRequest::new(PDO_SLOTS, 5000, 1000),
            Err(InvalidRequest::IndexOutOfRange)
        );
    }

    #[test]
    fn test_le_bytes() {
        let req = NegotiationRequest::new(0, 5000, 1000).unwrap();
        assert_eq!(req.to_le_bytes(), [50, 0x10]);
    }
}
