//! Encoder event latch
//!
//! Combines the quadrature accumulator and the debounced button into one
//! pending-event slot. While an event is pending nothing new is decoded;
//! after the consumer acknowledges it the slot sits in `Consumed` until
//! it is safe to recognize the next input.

use super::button::{Button, Press};
use super::quadrature::{Quadrature, Rotation};
use crate::clock::Clock;
use crate::config::UiTiming;

/// Decoded encoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderEvent {
    /// Nothing pending
    #[default]
    Idle,
    /// Last event acknowledged, waiting to re-arm
    Consumed,
    RotateUp,
    RotateDown,
    /// Detent completed while the button was held down
    RotateUpWhilePressed,
    RotateDownWhilePressed,
    ShortPress,
    LongPress,
}

impl EncoderEvent {
    /// Check if this is an unacknowledged event
    pub fn is_pending(&self) -> bool {
        !matches!(self, EncoderEvent::Idle | EncoderEvent::Consumed)
    }

    /// Check if the button is (or was) involved in this event
    ///
    /// Acknowledging one of these holds the latch until the button is
    /// released, so a still-held control cannot re-trigger.
    pub fn involves_button(&self) -> bool {
        matches!(
            self,
            EncoderEvent::ShortPress
                | EncoderEvent::LongPress
                | EncoderEvent::RotateUpWhilePressed
                | EncoderEvent::RotateDownWhilePressed
        )
    }

    fn from_rotation(rotation: Rotation, pressed: bool) -> Self {
        match (rotation, pressed) {
            (Rotation::Up, false) => EncoderEvent::RotateUp,
            (Rotation::Down, false) => EncoderEvent::RotateDown,
            (Rotation::Up, true) => EncoderEvent::RotateUpWhilePressed,
            (Rotation::Down, true) => EncoderEvent::RotateDownWhilePressed,
        }
    }
}

impl From<Press> for EncoderEvent {
    fn from(press: Press) -> Self {
        match press {
            Press::Short => EncoderEvent::ShortPress,
            Press::Long => EncoderEvent::LongPress,
        }
    }
}

/// Pin levels captured in one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinSample {
    pub a_low: bool,
    pub b_low: bool,
    pub button_low: bool,
}

/// Rotary encoder decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderDecoder {
    quadrature: Quadrature,
    button: Button,
    state: EncoderEvent,
    /// Consumed state waits for button release
    hold_until_release: bool,
}

impl EncoderDecoder {
    pub fn new(timing: &UiTiming) -> Self {
        Self {
            quadrature: Quadrature::new(),
            button: Button::new(timing.debounce_ms, timing.long_press_ms),
            state: EncoderEvent::Idle,
            hold_until_release: false,
        }
    }

    /// Feed one tick of pin levels
    pub fn poll(&mut self, sample: PinSample, clock: &impl Clock) {
        match self.state {
            EncoderEvent::Consumed => {
                if self.hold_until_release && sample.button_low {
                    return;
                }
                if self.hold_until_release {
                    self.button.reset();
                }
                self.hold_until_release = false;
                self.state = EncoderEvent::Idle;
            }
            EncoderEvent::Idle => {}
            _ => return,
        }

        let sample_bits = Quadrature::sample(sample.a_low, sample.b_low);
        if let Some(rotation) = self.quadrature.update(sample_bits) {
            self.state = EncoderEvent::from_rotation(rotation, self.button.is_pressed());
            return;
        }

        if let Some(press) = self.button.update(sample.button_low, clock) {
            self.state = press.into();
        }
    }

    /// Current state
    pub fn event(&self) -> EncoderEvent {
        self.state
    }

    /// Acknowledge the pending event
    pub fn consume(&mut self) {
        if self.state.is_pending() {
            self.hold_until_release = self.state.involves_button();
            self.state = EncoderEvent::Consumed;
        }
    }

    /// Take and acknowledge the pending event, if any
    pub fn take(&mut self) -> Option<EncoderEvent> {
        let event = self.state;
        if event.is_pending() {
            self.consume();
            Some(event)
        } else {
            None
        }
    }
}
