//! Outcomes reported by the controller
//!
//! The controller never logs; it tells the caller what it did so the
//! firmware can log and redraw.

use super::state::{Cursor, Field, Setpoint};

/// Something the controller changed in response to an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlEvent {
    // Menu
    /// Highlight moved to a new list position
    HighlightMoved(usize),
    /// Profile at slot `index` became active; `applied` if the initial
    /// request was accepted
    ProfileSelected { index: u8, applied: bool },
    /// Back to the profile list
    ReturnedToMenu,

    // Main
    /// First click of a double click recorded
    DoubleClickArmed,
    CursorMoved(Cursor),
    EditStarted(Field),
    /// Pending target changed while editing
    TargetAdjusted { field: Field, value: u16 },
    /// Source accepted the edited setpoint
    SetpointApplied(Setpoint),
    /// Source refused the setpoint; the previous one stays in effect
    SetpointRejected(Setpoint),
    OutputChanged { enabled: bool },
    /// Output enable write failed; output state unchanged
    OutputChangeFailed { enabled: bool },
}

impl ControlEvent {
    /// Check if this reports a failed peripheral operation
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ControlEvent::SetpointRejected(_)
                | ControlEvent::OutputChangeFailed { .. }
                | ControlEvent::ProfileSelected { applied: false, .. }
        )
    }

    /// Check if this changed what is on screen
    pub fn needs_redraw(&self) -> bool {
        !matches!(self, ControlEvent::DoubleClickArmed)
    }
}
