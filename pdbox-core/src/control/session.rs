//! Main-screen session
//!
//! Created when a profile is entered, dropped when returning to the menu.
//! Targets are always kept inside the active profile's envelope, and the
//! output can only be switched on from a non-editing state.

use super::events::ControlEvent;
use super::state::{Cursor, Field, MainMode, Setpoint, SupplyMode};
use crate::clock::{Clock, Stopwatch};
use crate::config::UiTiming;
use crate::input::EncoderEvent;
use crate::pdo::{Pdo, PdoKind};
use crate::traits::PowerSource;

/// Edit cursor blink phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct Blink {
    visible: bool,
    since: Stopwatch,
}

impl Blink {
    fn start(clock: &impl Clock) -> Self {
        Self {
            visible: true,
            since: Stopwatch::start(clock),
        }
    }
}

/// Lowest setpoint of a profile, where every session starts
fn floor_setpoint(pdo: &Pdo) -> Setpoint {
    Setpoint {
        voltage_mv: pdo.voltage_min_mv,
        current_ma: pdo.current_min_ma,
    }
}

/// Result of feeding an event to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Stay(Option<ControlEvent>),
    ExitToMenu,
}

/// State of an operated profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MainSession {
    pdo: Pdo,
    /// Position of the profile in the controller's list
    position: usize,
    mode: MainMode,
    output_enabled: bool,
    /// Pending target shown to the user
    target: Setpoint,
    /// Last setpoint the source accepted
    applied: Option<Setpoint>,
    supply_mode: SupplyMode,
    /// First click of a possible double click
    double_click: Option<Stopwatch>,
    /// Previous adjustment while editing
    last_rotation: Option<Stopwatch>,
    blink: Blink,
}

impl MainSession {
    /// Start a session on `pdo` with targets at the profile minimum
    ///
    /// Output starts disabled. The initial request is issued by
    /// [`MainSession::request_initial`].
    pub fn new(pdo: Pdo, position: usize, clock: &impl Clock) -> Self {
        Self {
            pdo,
            position,
            mode: MainMode::default(),
            output_enabled: false,
            target: floor_setpoint(&pdo),
            applied: None,
            supply_mode: SupplyMode::default(),
            double_click: None,
            last_rotation: None,
            blink: Blink::start(clock),
        }
    }

    /// Negotiate the initial target
    ///
    /// Skipped for the fallback profile, which has no slot to request.
    /// Returns whether the source accepted.
    pub fn request_initial<P: PowerSource>(&mut self, source: &mut P) -> bool {
        if self.pdo.kind == PdoKind::None {
            return false;
        }
        let target = self.target;
        match source.request_output(self.pdo.index, target.voltage_mv, target.current_ma) {
            Ok(()) => {
                self.applied = Some(target);
                true
            }
            Err(_) => false,
        }
    }

    pub fn pdo(&self) -> &Pdo {
        &self.pdo
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn mode(&self) -> MainMode {
        self.mode
    }

    pub fn output_enabled(&self) -> bool {
        self.output_enabled
    }

    pub fn target(&self) -> Setpoint {
        self.target
    }

    pub fn applied(&self) -> Option<Setpoint> {
        self.applied
    }

    /// Check if the shown target is what the source last accepted
    ///
    /// False while an edit is pending and whenever no request has been
    /// accepted yet on this profile.
    pub fn target_confirmed(&self) -> bool {
        self.applied == Some(self.target)
    }

    pub fn supply_mode(&self) -> SupplyMode {
        self.supply_mode
    }

    /// Check if the edited field is currently drawn highlighted
    pub fn blink_visible(&self) -> bool {
        self.blink.visible
    }

    pub(crate) fn handle<P: PowerSource>(
        &mut self,
        event: EncoderEvent,
        source: &mut P,
        clock: &impl Clock,
        timing: &UiTiming,
        menu_enabled: bool,
    ) -> Outcome {
        use EncoderEvent::*;

        if !matches!(event, ShortPress | Idle | Consumed) {
            // Anything in between breaks a double click
            self.double_click = None;
        }

        match event {
            ShortPress => self.short_press(source, clock, timing, menu_enabled),
            LongPress => Outcome::Stay(self.toggle_output(source)),
            RotateUp => Outcome::Stay(self.rotate(1, clock, timing)),
            RotateDown => Outcome::Stay(self.rotate(-1, clock, timing)),
            // Manual CV/CC override is reserved
            RotateUpWhilePressed | RotateDownWhilePressed => Outcome::Stay(None),
            Idle | Consumed => Outcome::Stay(None),
        }
    }

    fn short_press<P: PowerSource>(
        &mut self,
        source: &mut P,
        clock: &impl Clock,
        timing: &UiTiming,
        menu_enabled: bool,
    ) -> Outcome {
        match self.mode {
            MainMode::Browsing(Cursor::None) => {
                if !menu_enabled || self.output_enabled {
                    self.double_click = None;
                    return Outcome::Stay(None);
                }
                match self.double_click {
                    Some(first) if first.within(clock, timing.double_click_ms) => {
                        self.double_click = None;
                        Outcome::ExitToMenu
                    }
                    _ => {
                        self.double_click = Some(Stopwatch::start(clock));
                        Outcome::Stay(Some(ControlEvent::DoubleClickArmed))
                    }
                }
            }
            MainMode::Browsing(cursor) => {
                let Some(field) = cursor.field() else {
                    return Outcome::Stay(None);
                };
                self.mode = MainMode::Editing(field);
                self.blink = Blink::start(clock);
                self.last_rotation = None;
                Outcome::Stay(Some(ControlEvent::EditStarted(field)))
            }
            MainMode::Editing(field) => {
                self.mode = MainMode::Browsing(field.into());
                Outcome::Stay(Some(self.apply(source)))
            }
        }
    }

    /// Send the pending target; revert it if the source refuses
    fn apply<P: PowerSource>(&mut self, source: &mut P) -> ControlEvent {
        let target = self.target;
        match source.request_output(self.pdo.index, target.voltage_mv, target.current_ma) {
            Ok(()) => {
                self.applied = Some(target);
                ControlEvent::SetpointApplied(target)
            }
            Err(_) => {
                self.target = self.applied.unwrap_or_else(|| floor_setpoint(&self.pdo));
                ControlEvent::SetpointRejected(target)
            }
        }
    }

    fn toggle_output<P: PowerSource>(&mut self, source: &mut P) -> Option<ControlEvent> {
        if self.mode.is_editing() {
            return None;
        }
        let enable = !self.output_enabled;
        if enable {
            self.mode = MainMode::Browsing(Cursor::None);
        }
        match source.set_output_enable(enable) {
            Ok(()) => {
                self.output_enabled = enable;
                Some(ControlEvent::OutputChanged { enabled: enable })
            }
            Err(_) => Some(ControlEvent::OutputChangeFailed { enabled: enable }),
        }
    }

    fn rotate(&mut self, direction: i32, clock: &impl Clock, timing: &UiTiming) -> Option<ControlEvent> {
        if !self.pdo.is_editable() {
            return None;
        }
        match self.mode {
            MainMode::Browsing(cursor) => {
                let cursor = if direction > 0 { cursor.next() } else { cursor.prev() };
                self.mode = MainMode::Browsing(cursor);
                Some(ControlEvent::CursorMoved(cursor))
            }
            MainMode::Editing(field) => {
                let fast = self
                    .last_rotation
                    .is_some_and(|last| last.within(clock, timing.fast_rotation_ms));
                self.last_rotation = Some(Stopwatch::start(clock));

                let step = match field {
                    Field::Voltage => self.pdo.voltage_step_mv,
                    Field::Current => self.pdo.current_step_ma,
                } as i32;
                let step = if fast {
                    step * timing.large_step_multiplier as i32
                } else {
                    step
                };
                let delta = step * direction;

                let value = match field {
                    Field::Voltage => {
                        self.target.voltage_mv =
                            self.pdo.clamp_voltage(self.target.voltage_mv as i32 + delta);
                        self.target.voltage_mv
                    }
                    Field::Current => {
                        self.target.current_ma =
                            self.pdo.clamp_current(self.target.current_ma as i32 + delta);
                        self.target.current_ma
                    }
                };
                Some(ControlEvent::TargetAdjusted { field, value })
            }
        }
    }

    /// Advance the blink phase; returns true when it flipped
    pub fn tick(&mut self, clock: &impl Clock, timing: &UiTiming) -> bool {
        if !self.mode.is_editing() || !self.blink.since.has_elapsed(clock, timing.blink_ms) {
            return false;
        }
        self.blink.visible = !self.blink.visible;
        self.blink.since.restart(clock);
        true
    }
}

/// Recording power source for host tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FakeSource {
    pub(crate) requests: heapless::Vec<(u8, u16, u16), 256>,
    pub(crate) enables: heapless::Vec<bool, 64>,
    pub(crate) reject_requests: bool,
    pub(crate) fail_enable: bool,
    pub(crate) fail_temperature: bool,
}

#[cfg(test)]
impl PowerSource for FakeSource {
    type Error = ();

    fn request_output(&mut self, index: u8, voltage_mv: u16, current_ma: u16) -> Result<(), ()> {
        let _ = self.requests.push((index, voltage_mv, current_ma));
        if self.reject_requests {
            Err(())
        } else {
            Ok(())
        }
    }

    fn set_output_enable(&mut self, enable: bool) -> Result<(), ()> {
        let _ = self.enables.push(enable);
        if self.fail_enable {
            Err(())
        } else {
            Ok(())
        }
    }

    fn read_temperature(&mut self) -> Result<u8, ()> {
        if self.fail_temperature {
            Err(())
        } else {
            Ok(25)
        }
    }
}
