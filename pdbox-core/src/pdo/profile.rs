//! Decoded PDO descriptor used by the control loop and the renderer

use core::fmt;

use super::capability::{PowerRange, SourceCapability};
use super::{CURRENT_STEP_MA, MIN_CURRENT_MA};

/// Kind of supply a profile offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PdoKind {
    Fixed,
    Pps,
    Avs,
    /// Fallback profile used when the source offered nothing
    None,
}

impl PdoKind {
    /// Short label shown on the display
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fixed => "FIX",
            Self::Pps => "PPS",
            Self::Avs => "AVS",
            Self::None => "N/A",
        }
    }
}

/// A capability slot resolved into an editable voltage/current envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pdo {
    /// Table slot (0-12)
    pub index: u8,
    pub kind: PdoKind,
    pub voltage_min_mv: u16,
    pub voltage_max_mv: u16,
    /// 0 for fixed supplies
    pub voltage_step_mv: u16,
    pub current_min_ma: u16,
    pub current_max_ma: u16,
    pub current_step_ma: u16,
}

impl Default for Pdo {
    fn default() -> Self {
        Self::fallback()
    }
}

impl Pdo {
    /// Non-editable 5 V / 1 A profile used when no PDO was negotiated
    pub const fn fallback() -> Self {
        Self {
            index: 0,
            kind: PdoKind::None,
            voltage_min_mv: 5000,
            voltage_max_mv: 5000,
            voltage_step_mv: 0,
            current_min_ma: MIN_CURRENT_MA,
            current_max_ma: MIN_CURRENT_MA,
            current_step_ma: CURRENT_STEP_MA,
        }
    }

    /// Build the descriptor for a decoded slot
    ///
    /// `probed_min_mv` is only consulted for programmable supplies whose
    /// minimum voltage must be discovered by probing.
    pub fn from_capability(index: u8, cap: &SourceCapability, probed_min_mv: Option<u16>) -> Self {
        match cap {
            SourceCapability::Fixed(fixed) => Self {
                index,
                kind: PdoKind::Fixed,
                voltage_min_mv: fixed.voltage_mv,
                voltage_max_mv: fixed.voltage_mv,
                voltage_step_mv: 0,
                current_min_ma: MIN_CURRENT_MA,
                current_max_ma: fixed.current_max_ma,
                current_step_ma: CURRENT_STEP_MA,
            },
            SourceCapability::Pps(p) | SourceCapability::Avs(p) => {
                let kind = match cap {
                    SourceCapability::Avs(_) => PdoKind::Avs,
                    _ => PdoKind::Pps,
                };
                let voltage_min_mv = p
                    .voltage_min
                    .resolve(p.range, probed_min_mv)
                    .min(p.voltage_max_mv);
                Self {
                    index,
                    kind,
                    voltage_min_mv,
                    voltage_max_mv: p.voltage_max_mv,
                    voltage_step_mv: p.range.voltage_unit_mv(),
                    current_min_ma: MIN_CURRENT_MA,
                    current_max_ma: p.current_max_ma,
                    current_step_ma: CURRENT_STEP_MA,
                }
            }
        }
    }

    /// Power range of this profile's slot
    pub fn range(&self) -> PowerRange {
        PowerRange::for_index(self.index as usize).unwrap_or(PowerRange::Standard)
    }

    /// Check if the user may adjust voltage and current
    pub fn is_editable(&self) -> bool {
        matches!(self.kind, PdoKind::Pps | PdoKind::Avs)
    }

    /// Clamp a voltage into the negotiated envelope
    pub fn clamp_voltage(&self, mv: i32) -> u16 {
        mv.clamp(self.voltage_min_mv as i32, self.voltage_max_mv as i32) as u16
    }

    /// Clamp a current into the negotiated envelope
    pub fn clamp_current(&self, ma: i32) -> u16 {
        ma.clamp(self.current_min_ma as i32, self.current_max_ma as i32) as u16
    }
}

/// Write a milli-unit value as a trimmed decimal ("3.3", "21", "2.25")
fn write_milli(f: &mut fmt::Formatter<'_>, value: u16) -> fmt::Result {
    let whole = value / 1000;
    let mut frac = value % 1000;
    if frac == 0 {
        return write!(f, "{}", whole);
    }
    let mut digits = 3;
    while frac % 10 == 0 {
        frac /= 10;
        digits -= 1;
    }
    write!(f, "{}.{:0width$}", whole, frac, width = digits)
}

impl fmt::Display for Pdo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.kind.label())?;
        if self.voltage_min_mv != self.voltage_max_mv {
            write_milli(f, self.voltage_min_mv)?;
            f.write_str("-")?;
        }
        write_milli(f, self.voltage_max_mv)?;
        f.write_str("V ")?;
        write_milli(f, self.current_max_ma)?;
        f.write_str("A")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdo::capability::{FixedSupply, MinVoltage, ProgrammableSupply};
    use core::fmt::Write;
    use heapless::String;

    fn label(pdo: &Pdo) -> String<32> {
        let mut s = String::new();
        write!(s, "{}", pdo).unwrap();
        s
    }

    fn pps(min: MinVoltage, max_mv: u16) -> SourceCapability {
        SourceCapability::Pps(ProgrammableSupply {
            range: PowerRange::Standard,
            voltage_min: min,
            voltage_max_mv: max_mv,
            current_max_ma: 3000,
        })
    }

    #[test]
    fn test_fixed_descriptor() {
        let cap = SourceCapability::Fixed(FixedSupply {
            voltage_mv: 10000,
            current_max_ma: 2000,
        });
        let pdo = Pdo::from_capability(2, &cap, None);
        assert_eq!(pdo.kind, PdoKind::Fixed);
        assert_eq!(pdo.voltage_min_mv, 10000);
        assert_eq!(pdo.voltage_max_mv, 10000);
        assert_eq!(pdo.voltage_step_mv, 0);
        assert_eq!(pdo.current_min_ma, 1000);
        assert_eq!(pdo.current_max_ma, 2000);
        assert_eq!(pdo.current_step_ma, 250);
        assert!(!pdo.is_editable());
    }

    #[test]
    fn test_pps_descriptor_uses_probe_result() {
        let pdo = Pdo::from_capability(3, &pps(MinVoltage::Probe, 21000), Some(3600));
        assert_eq!(pdo.kind, PdoKind::Pps);
        assert_eq!(pdo.voltage_min_mv, 3600);
        assert_eq!(pdo.voltage_step_mv, 100);
        assert!(pdo.is_editable());
    }

    #[test]
    fn test_min_never_exceeds_max() {
        let pdo = Pdo::from_capability(1, &pps(MinVoltage::Unspecified, 4200), None);
        assert_eq!(pdo.voltage_min_mv, 4200);
    }

    #[test]
    fn test_clamp_to_envelope() {
        let pdo = Pdo::from_capability(3, &pps(MinVoltage::Floor, 21000), None);
        assert_eq!(pdo.clamp_voltage(2000), 3300);
        assert_eq!(pdo.clamp_voltage(25000), 21000);
        assert_eq!(pdo.clamp_voltage(12000), 12000);
        assert_eq!(pdo.clamp_current(0), 1000);
        assert_eq!(pdo.clamp_current(9000), 3000);
    }

    #[test]
    fn test_labels() {
        let fixed = Pdo::from_capability(
            1,
            &SourceCapability::Fixed(FixedSupply {
                voltage_mv: 9000,
                current_max_ma: 3000,
            }),
            None,
        );
        assert_eq!(label(&fixed).as_str(), "FIX 9V 3A");

        let programmable = Pdo::from_capability(4, &pps(MinVoltage::Floor, 21000), None);
        assert_eq!(label(&programmable).as_str(), "PPS 3.3-21V 3A");

        let avs = Pdo {
            index: 8,
            kind: PdoKind::Avs,
            voltage_min_mv: 15000,
            voltage_max_mv: 28000,
            voltage_step_mv: 200,
            current_min_ma: 1000,
            current_max_ma: 5000,
            current_step_ma: 250,
        };
        assert_eq!(label(&avs).as_str(), "AVS 15-28V 5A");

        let mut odd = fixed;
        odd.current_max_ma = 2250;
        assert_eq!(label(&odd).as_str(), "FIX 9V 2.25A");
    }

    #[test]
    fn test_fallback_profile() {
        let pdo = Pdo::fallback();
        assert_eq!(pdo.kind, PdoKind::None);
        assert_eq!(pdo.voltage_min_mv, 5000);
        assert_eq!(pdo.current_max_ma, 1000);
        assert!(!pdo.is_editable());
    }
}
