//! Raw capability table and tagged decoding
//!
//! # Word layout
//!
//! ```text
//!  15     14     13..10        9..8           7..0
//! detect  type  current_max  voltage_min   voltage_max
//! ```
//!
//! `type` selects Fixed (0) or Programmable (1). The region, and with it
//! the voltage unit and the programmable flavour (PPS in SPR, AVS in EPR),
//! comes from the slot index only.

use super::{CURRENT_STEP_MA, MIN_CURRENT_MA};

/// Number of capability slots
pub const PDO_SLOTS: usize = 13;

/// Size of the capability table on the wire
pub const TABLE_BYTES: usize = PDO_SLOTS * 2;

/// First slot of the Extended Power Range
const EPR_FIRST_SLOT: usize = 7;

const TYPE_BIT: u16 = 1 << 14;

/// Extract `width` bits of `word` starting at `shift`
const fn field(word: u16, shift: u8, width: u8) -> u16 {
    (word >> shift) & ((1 << width) - 1)
}

/// USB-PD power range a slot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerRange {
    /// Slots 0-6
    Standard,
    /// Slots 7-12
    Extended,
}

impl PowerRange {
    /// Region of a slot, or `None` past the end of the table
    pub fn for_index(index: usize) -> Option<Self> {
        match index {
            0..EPR_FIRST_SLOT => Some(Self::Standard),
            EPR_FIRST_SLOT..PDO_SLOTS => Some(Self::Extended),
            _ => None,
        }
    }

    /// Scale of the voltage fields, also the programmable voltage step (mV)
    pub const fn voltage_unit_mv(self) -> u16 {
        match self {
            Self::Standard => 100,
            Self::Extended => 200,
        }
    }

    /// Architectural minimum voltage for programmable supplies (mV)
    pub const fn floor_mv(self) -> u16 {
        match self {
            Self::Standard => 3300,
            Self::Extended => 15000,
        }
    }

    /// Upper bound of the minimum-voltage probe (mV)
    pub const fn probe_ceiling_mv(self) -> u16 {
        match self {
            Self::Standard => 5000,
            Self::Extended => 20000,
        }
    }

    /// Candidate minimum voltages tried by the probe, lowest first
    pub fn probe_candidates(self) -> impl Iterator<Item = u16> {
        (self.floor_mv()..=self.probe_ceiling_mv()).step_by(self.voltage_unit_mv() as usize)
    }
}

/// How a programmable supply advertises its lower voltage bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MinVoltage {
    /// Code 1: the region floor
    Floor,
    /// Code 2: not encoded, must be discovered by trial negotiation
    Probe,
    /// Codes 0 and 3: reserved
    Unspecified,
}

impl MinVoltage {
    fn from_code(code: u16) -> Self {
        match code {
            1 => Self::Floor,
            2 => Self::Probe,
            _ => Self::Unspecified,
        }
    }

    /// Resolve to a voltage in millivolts
    ///
    /// `probed` is the first voltage the source accepted during probing.
    /// Reserved codes and a probe with no accepted candidate fall back to
    /// the probe ceiling.
    pub fn resolve(self, range: PowerRange, probed: Option<u16>) -> u16 {
        match (self, probed) {
            (Self::Floor, _) => range.floor_mv(),
            (Self::Probe, Some(mv)) => mv,
            (Self::Probe, None) | (Self::Unspecified, _) => range.probe_ceiling_mv(),
        }
    }
}

/// Fixed-voltage supply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixedSupply {
    pub voltage_mv: u16,
    pub current_max_ma: u16,
}

/// Programmable supply (PPS or AVS)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProgrammableSupply {
    pub range: PowerRange,
    pub voltage_min: MinVoltage,
    pub voltage_max_mv: u16,
    pub current_max_ma: u16,
}

/// One decoded capability slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SourceCapability {
    Fixed(FixedSupply),
    /// Programmable Power Supply, SPR slots only
    Pps(ProgrammableSupply),
    /// Adjustable Voltage Supply, EPR slots only
    Avs(ProgrammableSupply),
}

impl SourceCapability {
    /// Decode slot `index` of `table`
    ///
    /// Returns `None` if the index is out of range or the slot is empty.
    pub fn decode(index: usize, table: &CapabilityTable) -> Option<Self> {
        let range = PowerRange::for_index(index)?;
        let word = table.word(index)?;
        if word == 0 {
            return None;
        }

        let unit = range.voltage_unit_mv();
        let voltage_max_mv = field(word, 0, 8) * unit;
        let current_max_ma = MIN_CURRENT_MA + field(word, 10, 4) * CURRENT_STEP_MA;

        if word & TYPE_BIT == 0 {
            return Some(Self::Fixed(FixedSupply {
                voltage_mv: voltage_max_mv,
                current_max_ma,
            }));
        }

        let supply = ProgrammableSupply {
            range,
            voltage_min: MinVoltage::from_code(field(word, 8, 2)),
            voltage_max_mv,
            current_max_ma,
        };
        Some(match range {
            PowerRange::Standard => Self::Pps(supply),
            PowerRange::Extended => Self::Avs(supply),
        })
    }

    /// Programmable parameters, if this is not a fixed supply
    pub fn programmable(&self) -> Option<&ProgrammableSupply> {
        match self {
            Self::Fixed(_) => None,
            Self::Pps(p) | Self::Avs(p) => Some(p),
        }
    }

    /// Check if decoding this slot needs a trial-negotiation probe
    pub fn needs_probe(&self) -> bool {
        self.programmable()
            .is_some_and(|p| p.voltage_min == MinVoltage::Probe)
    }
}

/// The 13 raw capability words as read from the controller
///
/// Immutable after the read; descriptors are always recomputed from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CapabilityTable {
    words: [u16; PDO_SLOTS],
}

impl CapabilityTable {
    pub const fn from_words(words: [u16; PDO_SLOTS]) -> Self {
        Self { words }
    }

    /// Build from the little-endian register dump
    pub fn from_le_bytes(bytes: &[u8; TABLE_BYTES]) -> Self {
        let mut words = [0u16; PDO_SLOTS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(2)) {
            *word = u16::from_le_bytes([chunk[0], chunk[1]]);
        }
        Self { words }
    }

    /// Raw word of a slot
    pub fn word(&self, index: usize) -> Option<u16> {
        self.words.get(index).copied()
    }

    /// Number of offered (non-zero) slots
    pub fn count(&self) -> usize {
        self.words.iter().filter(|&&w| w != 0).count()
    }

    /// Indices of offered slots, in table order
    pub fn offered(&self) -> impl Iterator<Item = usize> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter(|(_, &w)| w != 0)
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn word(programmable: bool, current_field: u16, min_code: u16, voltage_field: u16) -> u16 {
        (1 << 15)
            | (u16::from(programmable) << 14)
            | (current_field << 10)
            | (min_code << 8)
            | voltage_field
    }

    fn table_with(index: usize, w: u16) -> CapabilityTable {
        let mut words = [0u16; PDO_SLOTS];
        words[index] = w;
        CapabilityTable::from_words(words)
    }

    #[test]
    fn test_decode_fixed_spr() {
        let table = table_with(2, word(false, 4, 0, 100));
        let cap = SourceCapability::decode(2, &table);
        assert_eq!(
            cap,
            Some(SourceCapability::Fixed(FixedSupply {
                voltage_mv: 10000,
                current_max_ma: 2000,
            }))
        );
    }

    #[test]
    fn test_decode_avs_epr_with_floor() {
        let table = table_with(8, word(true, 4, 1, 180));
        let cap = SourceCapability::decode(8, &table).unwrap();
        let SourceCapability::Avs(avs) = cap else {
            panic!("expected AVS, got {:?}", cap);
        };
        assert_eq!(avs.range, PowerRange::Extended);
        assert_eq!(avs.voltage_max_mv, 36000);
        assert_eq!(avs.current_max_ma, 2000);
        assert_eq!(avs.voltage_min.resolve(avs.range, None), 15000);
    }

    #[test]
    fn test_programmable_spr_is_pps() {
        let table = table_with(3, word(true, 8, 2, 210));
        let cap = SourceCapability::decode(3, &table).unwrap();
        assert!(matches!(cap, SourceCapability::Pps(_)));
        assert!(cap.needs_probe());
    }

    #[test]
    fn test_region_comes_from_index_not_word() {
        // Same word, different slots
        let w = word(false, 0, 0, 50);
        let spr = SourceCapability::decode(6, &table_with(6, w)).unwrap();
        let epr = SourceCapability::decode(7, &table_with(7, w)).unwrap();
        assert!(matches!(spr, SourceCapability::Fixed(FixedSupply { voltage_mv: 5000, .. })));
        assert!(matches!(epr, SourceCapability::Fixed(FixedSupply { voltage_mv: 10000, .. })));
    }

    #[test]
    fn test_empty_slot_and_out_of_range() {
        let table = table_with(0, word(false, 0, 0, 50));
        assert!(SourceCapability::decode(1, &table).is_none());
        assert!(SourceCapability::decode(PDO_SLOTS, &table).is_none());
    }

    #[test]
    fn test_min_voltage_reserved_codes_resolve_to_ceiling() {
        for code in [0, 3] {
            let table = table_with(1, word(true, 0, code, 59));
            let cap = SourceCapability::decode(1, &table).unwrap();
            let p = cap.programmable().unwrap();
            assert_eq!(p.voltage_min, MinVoltage::Unspecified);
            assert_eq!(p.voltage_min.resolve(p.range, Some(3300)), 5000);
        }
    }

    #[test]
    fn test_failed_probe_resolves_to_ceiling() {
        assert_eq!(MinVoltage::Probe.resolve(PowerRange::Standard, None), 5000);
        assert_eq!(MinVoltage::Probe.resolve(PowerRange::Extended, None), 20000);
        assert_eq!(MinVoltage::Probe.resolve(PowerRange::Standard, Some(3600)), 3600);
    }

    #[test]
    fn test_probe_candidates_are_bounded() {
        let spr: heapless::Vec<u16, 32> = PowerRange::Standard.probe_candidates().collect();
        assert_eq!(spr.first(), Some(&3300));
        assert_eq!(spr.last(), Some(&5000));
        assert_eq!(spr.len(), 18);

        let epr: heapless::Vec<u16, 32> = PowerRange::Extended.probe_candidates().collect();
        assert_eq!(epr.first(), Some(&15000));
        assert_eq!(epr.last(), Some(&20000));
        assert!(epr.windows(2).all(|w| w[1] - w[0] == 200));
    }

    #[test]
    fn test_table_from_le_bytes_and_count() {
        let mut bytes = [0u8; TABLE_BYTES];
        bytes[0] = 0x32;
        bytes[1] = 0x90;
        bytes[16] = 0xB4;
        bytes[17] = 0xD1;
        let table = CapabilityTable::from_le_bytes(&bytes);
        assert_eq!(table.word(0), Some(0x9032));
        assert_eq!(table.word(8), Some(0xD1B4));
        assert_eq!(table.count(), 2);
        let offered: heapless::Vec<usize, PDO_SLOTS> = table.offered().collect();
        assert_eq!(offered.as_slice(), &[0, 8]);
    }

    proptest! {
        #[test]
        fn prop_decode_never_panics(index in 0usize..20, w in any::<u16>()) {
            let mut words = [0u16; PDO_SLOTS];
            if index < PDO_SLOTS {
                words[index] = w;
            }
            let table = CapabilityTable::from_words(words);
            let cap = SourceCapability::decode(index, &table);
            if index >= PDO_SLOTS || w == 0 {
                prop_assert!(cap.is_none());
            } else {
                prop_assert!(cap.is_some());
            }
        }
    }
}
