//! Value snapshots handed to the renderer

use super::session::MainSession;
use super::state::{Cursor, Field, Setpoint, SupplyMode};
use crate::pdo::{Pdo, PdoKind};
use crate::traits::{PowerMonitor, PowerSource};

/// What the current screen should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum View<'a> {
    Menu {
        profiles: &'a [Pdo],
        highlighted: usize,
    },
    Main(MainView),
}

/// Main screen snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MainView {
    pub kind: PdoKind,
    pub target: Setpoint,
    /// Target shown is not in effect on the source (edit not pending)
    pub unconfirmed: bool,
    pub cursor: Cursor,
    pub editing: bool,
    pub blink_visible: bool,
    pub output_enabled: bool,
    pub supply_mode: SupplyMode,
}

impl MainView {
    pub fn from_session(session: &MainSession) -> Self {
        Self {
            kind: session.pdo().kind,
            target: session.target(),
            unconfirmed: !session.mode().is_editing() && !session.target_confirmed(),
            cursor: session.mode().cursor(),
            editing: session.mode().is_editing(),
            blink_visible: session.blink_visible(),
            output_enabled: session.output_enabled(),
            supply_mode: session.supply_mode(),
        }
    }

    /// Check if `field` should be drawn inverted this frame
    ///
    /// A selected field is always highlighted; an edited one follows the
    /// blink phase.
    pub fn is_highlighted(&self, field: Field) -> bool {
        self.cursor.field() == Some(field) && (!self.editing || self.blink_visible)
    }
}

/// Measurements refreshed on the measuring cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Readings {
    pub voltage_mv: u32,
    pub current_ma: u32,
    /// PD controller temperature, if the last read succeeded
    pub temperature_c: Option<u8>,
}

impl Readings {
    /// Sample the output sensor and the controller temperature
    ///
    /// A failed sensor read shows as zero, a failed temperature read as
    /// unknown. Reverse current reads as zero.
    pub fn measure<M, S>(monitor: &mut M, source: &mut S) -> Self
    where
        M: PowerMonitor,
        S: PowerSource,
    {
        Self {
            voltage_mv: monitor.bus_voltage_mv().unwrap_or(0),
            current_ma: monitor.current_ma().map(|ma| ma.max(0) as u32).unwrap_or(0),
            temperature_c: source.read_temperature().ok(),
        }
    }
}
