//! Rotary encoder on three GPIO inputs
//!
//! A and B are the quadrature channels, the third pin is the push button.
//! All three are active-low with pull-ups. Sampling happens from the
//! control tick; the decoding lives in [`EncoderDecoder`].

use embedded_hal::digital::InputPin;

use pdbox_core::clock::Clock;
use pdbox_core::config::UiTiming;
use pdbox_core::input::{EncoderDecoder, EncoderEvent, PinSample};

pub struct RotaryEncoder<A, B, BTN> {
    pin_a: A,
    pin_b: B,
    button: BTN,
    decoder: EncoderDecoder,
}

impl<A, B, BTN> RotaryEncoder<A, B, BTN>
where
    A: InputPin,
    B: InputPin,
    BTN: InputPin,
{
    pub fn new(pin_a: A, pin_b: B, button: BTN, timing: &UiTiming) -> Self {
        Self {
            pin_a,
            pin_b,
            button,
            decoder: EncoderDecoder::new(timing),
        }
    }

    fn sample(&mut self) -> Option<PinSample> {
        Some(PinSample {
            a_low: self.pin_a.is_low().ok()?,
            b_low: self.pin_b.is_low().ok()?,
            button_low: self.button.is_low().ok()?,
        })
    }

    /// Sample the pins once and advance the decoder
    ///
    /// A pin read error skips the tick. Returns true while an event is
    /// pending.
    pub fn poll(&mut self, clock: &impl Clock) -> bool {
        if let Some(sample) = self.sample() {
            self.decoder.poll(sample, clock);
        }
        self.decoder.event().is_pending()
    }

    pub fn event(&self) -> EncoderEvent {
        self.decoder.event()
    }

    /// Take and acknowledge the pending event
    pub fn take(&mut self) -> Option<EncoderEvent> {
        self.decoder.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    struct Level<'a> {
        low: &'a Cell<bool>,
        broken: &'a Cell<bool>,
    }

    impl ErrorType for Level<'_> {
        type Error = ErrorKind;
    }

    impl InputPin for Level<'_> {
        fn is_high(&mut self) -> Result<bool, ErrorKind> {
            self.is_low().map(|low| !low)
        }

        fn is_low(&mut self) -> Result<bool, ErrorKind> {
            if self.broken.get() {
                Err(ErrorKind::Other)
            } else {
                Ok(self.low.get())
            }
        }
    }

    struct Millis(Cell<u32>);

    impl Clock for Millis {
        fn now_ms(&self) -> u32 {
            self.0.get()
        }
    }

    struct Pins {
        a: Cell<bool>,
        b: Cell<bool>,
        button: Cell<bool>,
        broken: Cell<bool>,
    }

    impl Pins {
        fn new() -> Self {
            Self {
                a: Cell::new(false),
                b: Cell::new(false),
                button: Cell::new(false),
                broken: Cell::new(false),
            }
        }

        fn encoder(&self) -> RotaryEncoder<Level<'_>, Level<'_>, Level<'_>> {
            RotaryEncoder::new(
                self.level(&self.a),
                self.level(&self.b),
                self.level(&self.button),
                &UiTiming::default(),
            )
        }

        fn level<'a>(&'a self, low: &'a Cell<bool>) -> Level<'a> {
            Level {
                low,
                broken: &self.broken,
            }
        }
    }

    fn step(
        pins: &Pins,
        enc: &mut RotaryEncoder<Level<'_>, Level<'_>, Level<'_>>,
        clock: &Millis,
        a: bool,
        b: bool,
    ) -> bool {
        pins.a.set(a);
        pins.b.set(b);
        clock.0.set(clock.0.get() + 1);
        enc.poll(clock)
    }

    #[test]
    fn test_detent_from_pins() {
        let pins = Pins::new();
        let clock = Millis(Cell::new(0));
        let mut enc = pins.encoder();

        // Settle the history at rest
        assert!(!step(&pins, &mut enc, &clock, false, false));
        assert!(!step(&pins, &mut enc, &clock, true, false));
        assert!(!step(&pins, &mut enc, &clock, true, true));
        assert!(!step(&pins, &mut enc, &clock, false, true));
        assert!(step(&pins, &mut enc, &clock, false, false));
        assert_eq!(enc.take(), Some(EncoderEvent::RotateUp));
        assert_eq!(enc.event(), EncoderEvent::Consumed);
        assert_eq!(enc.take(), None);
    }

    #[test]
    fn test_button_press_from_pin() {
        let pins = Pins::new();
        let clock = Millis(Cell::new(0));
        let mut enc = pins.encoder();

        pins.button.set(true);
        for _ in 0..60 {
            step(&pins, &mut enc, &clock, false, false);
        }
        pins.button.set(false);
        assert!(step(&pins, &mut enc, &clock, false, false));
        assert_eq!(enc.take(), Some(EncoderEvent::ShortPress));
    }

    #[test]
    fn test_pin_error_skips_tick() {
        let pins = Pins::new();
        let clock = Millis(Cell::new(0));
        let mut enc = pins.encoder();

        step(&pins, &mut enc, &clock, false, false);
        step(&pins, &mut enc, &clock, true, false);
        pins.broken.set(true);
        // Missed transitions leave the accumulator short of a detent
        step(&pins, &mut enc, &clock, true, true);
        step(&pins, &mut enc, &clock, false, true);
        pins.broken.set(false);
        assert!(!step(&pins, &mut enc, &clock, false, false));
        assert_eq!(enc.event(), EncoderEvent::Idle);
    }
}
