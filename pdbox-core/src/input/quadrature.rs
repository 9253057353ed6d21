//! Table-driven quadrature decoding
//!
//! The last two 2-bit samples form a 4-bit index into [`TRANSITIONS`],
//! giving -1, 0 or +1 per tick. Four counts in one direction make one
//! mechanical detent; partial detents from contact bounce cancel out.

/// Step contribution of each (old, new) sample pair, indexed `old << 2 | new`
///
/// Invalid transitions (both lines changing at once) and no-change
/// transitions count as 0.
pub const TRANSITIONS: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

/// Counts per detent
const COUNTS_PER_DETENT: i8 = 4;

/// Direction of one completed detent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    Up,
    Down,
}

/// Quadrature accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Quadrature {
    /// Previous and current 2-bit samples
    history: u8,
    accumulator: i8,
}

impl Default for Quadrature {
    fn default() -> Self {
        Self::new()
    }
}

impl Quadrature {
    pub const fn new() -> Self {
        Self {
            history: 0b11,
            accumulator: 0,
        }
    }

    /// Pack pin levels into a sample; a low A sets bit 1, a low B bit 0
    pub const fn sample(a_low: bool, b_low: bool) -> u8 {
        ((a_low as u8) << 1) | b_low as u8
    }

    /// Shift in a 2-bit sample, returning a direction on a full detent
    pub fn update(&mut self, sample: u8) -> Option<Rotation> {
        self.history = ((self.history << 2) | (sample & 0b11)) & 0x0F;
        self.accumulator += TRANSITIONS[self.history as usize];

        if self.accumulator >= COUNTS_PER_DETENT {
            self.accumulator = 0;
            Some(Rotation::Up)
        } else if self.accumulator <= -COUNTS_PER_DETENT {
            self.accumulator = 0;
            Some(Rotation::Down)
        } else {
            None
        }
    }

    /// Partial detent count
    pub fn accumulator(&self) -> i8 {
        self.accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// One detent clockwise starting from rest (both lines high)
    const UP: [u8; 4] = [0b10, 0b11, 0b01, 0b00];
    const DOWN: [u8; 4] = [0b01, 0b11, 0b10, 0b00];

    fn at_rest() -> Quadrature {
        let mut q = Quadrature::new();
        assert_eq!(q.update(0b00), None);
        q
    }

    #[test]
    fn test_table_matches_gray_code() {
        // Forward gray sequence 00 -> 10 -> 11 -> 01 -> 00
        let forward = [(0b00, 0b10), (0b10, 0b11), (0b11, 0b01), (0b01, 0b00)];
        for (old, new) in forward {
            assert_eq!(TRANSITIONS[(old << 2 | new) as usize], 1);
            assert_eq!(TRANSITIONS[(new << 2 | old) as usize], -1);
        }
        // No change and double changes count as nothing
        for s in 0..4usize {
            assert_eq!(TRANSITIONS[s << 2 | s], 0);
            assert_eq!(TRANSITIONS[s << 2 | (s ^ 0b11)], 0);
        }
    }

    #[test]
    fn test_one_detent_up() {
        let mut q = at_rest();
        let events: heapless::Vec<Option<Rotation>, 4> = UP.iter().map(|&s| q.update(s)).collect();
        assert_eq!(events.as_slice(), &[None, None, None, Some(Rotation::Up)]);
        assert_eq!(q.accumulator(), 0);
    }

    #[test]
    fn test_one_detent_down() {
        let mut q = at_rest();
        let last = DOWN.iter().map(|&s| q.update(s)).last().flatten();
        assert_eq!(last, Some(Rotation::Down));
        assert_eq!(q.accumulator(), 0);
    }

    #[test]
    fn test_bounce_cancels_out() {
        let mut q = at_rest();
        // Half a detent forward, then back to rest
        for s in [0b10, 0b11, 0b10, 0b00] {
            assert_eq!(q.update(s), None);
        }
        assert_eq!(q.accumulator(), 0);
    }

    #[test]
    fn test_repeated_samples_do_not_count() {
        let mut q = at_rest();
        for s in [0b10, 0b10, 0b10, 0b11, 0b11] {
            assert_eq!(q.update(s), None);
        }
        assert_eq!(q.accumulator(), 2);
    }

    #[test]
    fn test_sample_packing() {
        assert_eq!(Quadrature::sample(false, false), 0b00);
        assert_eq!(Quadrature::sample(true, false), 0b10);
        assert_eq!(Quadrature::sample(false, true), 0b01);
    }

    proptest! {
        #[test]
        fn prop_table_values_bounded(index in 0usize..16) {
            prop_assert!((-1..=1).contains(&TRANSITIONS[index]));
        }

        #[test]
        fn prop_accumulator_stays_below_detent(samples in proptest::collection::vec(0u8..4, 0..200)) {
            let mut q = Quadrature::new();
            for s in samples {
                q.update(s);
                prop_assert!(q.accumulator().abs() < COUNTS_PER_DETENT);
            }
        }
    }
}
