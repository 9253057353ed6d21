//! Top-level Menu/Main controller
//!
//! Owns the negotiated profile list for the device's lifetime and the
//! current [`DeviceState`]. Encoder events go in, [`ControlEvent`]s come
//! out; peripheral actions go through the injected [`PowerSource`].

use heapless::Vec;

use super::events::ControlEvent;
use super::session::{MainSession, Outcome};
use super::state::{DeviceState, MenuState};
use super::view::{MainView, View};
use crate::clock::Clock;
use crate::config::UiTiming;
use crate::input::EncoderEvent;
use crate::pdo::{Pdo, PDO_SLOTS};
use crate::traits::PowerSource;

/// Device controller
#[derive(Debug, Clone)]
pub struct Controller {
    profiles: Vec<Pdo, PDO_SLOTS>,
    state: DeviceState,
    timing: UiTiming,
}

impl Controller {
    /// Create a controller for the negotiated profiles
    ///
    /// With at least one profile the device starts in the menu. With none
    /// it goes straight to `Main` on the non-editable fallback profile;
    /// there is nothing to request, so no source is needed.
    pub fn new(profiles: &[Pdo], timing: UiTiming, clock: &impl Clock) -> Self {
        let mut list = Vec::new();
        for pdo in profiles.iter().take(PDO_SLOTS) {
            let _ = list.push(*pdo);
        }

        let state = if list.is_empty() {
            DeviceState::Main(MainSession::new(Pdo::fallback(), 0, clock))
        } else {
            DeviceState::Menu(MenuState::default())
        };

        Self {
            profiles: list,
            state,
            timing,
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn profiles(&self) -> &[Pdo] {
        &self.profiles
    }

    pub fn timing(&self) -> &UiTiming {
        &self.timing
    }

    /// Returning to the menu needs more than one profile to choose from
    pub fn menu_enabled(&self) -> bool {
        self.profiles.len() > 1
    }

    /// Profile being operated, if in `Main`
    pub fn active_profile(&self) -> Option<&Pdo> {
        match &self.state {
            DeviceState::Main(session) => Some(session.pdo()),
            DeviceState::Menu(_) => None,
        }
    }

    /// Process one encoder event
    pub fn handle_event<P: PowerSource>(
        &mut self,
        event: EncoderEvent,
        source: &mut P,
        clock: &impl Clock,
    ) -> Option<ControlEvent> {
        if !event.is_pending() {
            return None;
        }

        match self.state {
            DeviceState::Menu(menu) => self.handle_menu(menu, event, source, clock),
            DeviceState::Main(_) => self.handle_main(event, source, clock),
        }
    }

    fn handle_menu<P: PowerSource>(
        &mut self,
        menu: MenuState,
        event: EncoderEvent,
        source: &mut P,
        clock: &impl Clock,
    ) -> Option<ControlEvent> {
        let len = self.profiles.len();
        match event {
            EncoderEvent::RotateUp => {
                let next = menu.next(len);
                self.state = DeviceState::Menu(next);
                Some(ControlEvent::HighlightMoved(next.highlighted))
            }
            EncoderEvent::RotateDown => {
                let prev = menu.prev(len);
                self.state = DeviceState::Menu(prev);
                Some(ControlEvent::HighlightMoved(prev.highlighted))
            }
            EncoderEvent::ShortPress => Some(self.enter_main(menu.highlighted, source, clock)),
            _ => None,
        }
    }

    /// Activate the profile at list position `position`
    fn enter_main<P: PowerSource>(
        &mut self,
        position: usize,
        source: &mut P,
        clock: &impl Clock,
    ) -> ControlEvent {
        let pdo = self.profiles.get(position).copied().unwrap_or_default();
        let mut session = MainSession::new(pdo, position, clock);
        let applied = session.request_initial(source);
        self.state = DeviceState::Main(session);
        ControlEvent::ProfileSelected {
            index: pdo.index,
            applied,
        }
    }

    fn handle_main<P: PowerSource>(
        &mut self,
        event: EncoderEvent,
        source: &mut P,
        clock: &impl Clock,
    ) -> Option<ControlEvent> {
        let menu_enabled = self.menu_enabled();
        let DeviceState::Main(session) = &mut self.state else {
            return None;
        };

        match session.handle(event, source, clock, &self.timing, menu_enabled) {
            Outcome::Stay(result) => result,
            Outcome::ExitToMenu => {
                let highlighted = session.position();
                self.state = DeviceState::Menu(MenuState { highlighted });
                Some(ControlEvent::ReturnedToMenu)
            }
        }
    }

    /// Advance time-driven presentation state
    ///
    /// Returns true when the screen needs redrawing.
    pub fn tick(&mut self, clock: &impl Clock) -> bool {
        match &mut self.state {
            DeviceState::Main(session) => session.tick(clock, &self.timing),
            DeviceState::Menu(_) => false,
        }
    }

    /// Snapshot for the renderer
    pub fn view(&self) -> View<'_> {
        match &self.state {
            DeviceState::Menu(menu) => View::Menu {
                profiles: &self.profiles,
                highlighted: menu.highlighted,
            },
            DeviceState::Main(session) => View::Main(MainView::from_session(session)),
        }
    }
}
