//! Push button debouncing and press classification
//!
//! ```text
//! Released --low--> Settling --debounce elapsed, still low--> Held
//!                      |                                       |  |
//!                      +--high at debounce check--> Released   |  |
//!                                  Released <--high: Short-----+  |
//!                                  Latched <--long press: Long----+
//! Latched --high--> Released
//! ```

use crate::clock::{Clock, Stopwatch};

/// Classified press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Press {
    /// Released before the long-press threshold
    Short,
    /// Held up to the threshold; reported without waiting for release
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Phase {
    Released,
    /// Low edge seen, waiting out contact bounce
    Settling(Stopwatch),
    /// Debounced press, long-press window running
    Held(Stopwatch),
    /// Long press already reported, waiting for release
    Latched,
}

/// Debounced button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Button {
    phase: Phase,
    debounce_ms: u32,
    long_press_ms: u32,
}

impl Button {
    pub const fn new(debounce_ms: u32, long_press_ms: u32) -> Self {
        Self {
            phase: Phase::Released,
            debounce_ms,
            long_press_ms,
        }
    }

    /// Feed one sample of the (active low) pin
    pub fn update(&mut self, low: bool, clock: &impl Clock) -> Option<Press> {
        match self.phase {
            Phase::Released => {
                if low {
                    self.phase = Phase::Settling(Stopwatch::start(clock));
                }
                None
            }
            Phase::Settling(since) => {
                if since.has_elapsed(clock, self.debounce_ms) {
                    self.phase = if low {
                        Phase::Held(Stopwatch::start(clock))
                    } else {
                        Phase::Released
                    };
                }
                None
            }
            Phase::Held(since) => {
                if !low {
                    self.phase = Phase::Released;
                    Some(Press::Short)
                } else if since.has_elapsed(clock, self.long_press_ms) {
                    self.phase = Phase::Latched;
                    Some(Press::Long)
                } else {
                    None
                }
            }
            Phase::Latched => {
                if !low {
                    self.phase = Phase::Released;
                }
                None
            }
        }
    }

    /// Check if a debounced press is in progress
    pub fn is_pressed(&self) -> bool {
        matches!(self.phase, Phase::Held(_) | Phase::Latched)
    }

    /// Forget any press in progress
    pub fn reset(&mut self) {
        self.phase = Phase::Released;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    /// Hold the pin at `low` for `ms` ticks, collecting reported presses
    fn run(button: &mut Button, clock: &ManualClock, low: bool, ms: u32) -> Option<Press> {
        let mut seen = None;
        for _ in 0..ms {
            if let Some(p) = button.update(low, clock) {
                assert!(seen.is_none(), "more than one press reported");
                seen = Some(p);
            }
            clock.advance(1);
        }
        seen
    }

    #[test]
    fn test_glitch_shorter_than_debounce_is_ignored() {
        let clock = ManualClock::at(0);
        let mut button = Button::new(50, 1000);
        assert_eq!(run(&mut button, &clock, true, 30), None);
        assert_eq!(run(&mut button, &clock, false, 100), None);
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_short_press() {
        let clock = ManualClock::at(0);
        let mut button = Button::new(50, 1000);
        assert_eq!(run(&mut button, &clock, true, 200), None);
        assert!(button.is_pressed());
        assert_eq!(run(&mut button, &clock, false, 5), Some(Press::Short));
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_long_press_reported_while_held() {
        let clock = ManualClock::at(0);
        let mut button = Button::new(50, 1000);
        // Edge, then debounce confirmation at 50 ms
        button.update(true, &clock);
        clock.advance(50);
        assert_eq!(button.update(true, &clock), None);
        assert!(button.is_pressed());

        clock.advance(999);
        assert_eq!(button.update(true, &clock), None);
        clock.advance(1);
        assert_eq!(button.update(true, &clock), Some(Press::Long));

        // Still held: nothing more, and release is silent
        assert_eq!(run(&mut button, &clock, true, 2000), None);
        assert_eq!(run(&mut button, &clock, false, 10), None);
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_release_at_999_ms_is_short_only() {
        let clock = ManualClock::at(0);
        let mut button = Button::new(50, 1000);
        button.update(true, &clock);
        clock.advance(50);
        button.update(true, &clock);
        clock.advance(999);
        assert_eq!(button.update(true, &clock), None);
        assert_eq!(button.update(false, &clock), Some(Press::Short));
        assert_eq!(run(&mut button, &clock, false, 2000), None);
    }

    #[test]
    fn test_reset_drops_press() {
        let clock = ManualClock::at(0);
        let mut button = Button::new(50, 1000);
        run(&mut button, &clock, true, 100);
        button.reset();
        assert!(!button.is_pressed());
        // Release after reset does not report a short press
        assert_eq!(run(&mut button, &clock, false, 10), None);
    }
}
