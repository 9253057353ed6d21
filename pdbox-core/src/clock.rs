//! Millisecond clock capability
//!
//! Every timing window (debounce, long press, double click, fast rotation,
//! blink, measuring) is a [`Stopwatch`] owned by exactly one component and
//! read against an injected [`Clock`]. Only the owner restarts its window.

/// Monotonic millisecond time source
///
/// The counter is free running and wraps at `u32::MAX`; all elapsed-time
/// arithmetic uses wrapping subtraction.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch
    fn now_ms(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// A restartable timing window anchored at a clock reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stopwatch {
    started_ms: u32,
}

impl Stopwatch {
    /// Start a window at the clock's current time
    pub fn start(clock: &impl Clock) -> Self {
        Self {
            started_ms: clock.now_ms(),
        }
    }

    /// Start a window at an explicit timestamp
    pub const fn started_at(started_ms: u32) -> Self {
        Self { started_ms }
    }

    /// Re-anchor the window at the clock's current time
    pub fn restart(&mut self, clock: &impl Clock) {
        self.started_ms = clock.now_ms();
    }

    /// Milliseconds since the window was (re)started
    pub fn elapsed(&self, clock: &impl Clock) -> u32 {
        clock.now_ms().wrapping_sub(self.started_ms)
    }

    /// Check if at least `period_ms` have passed
    pub fn has_elapsed(&self, clock: &impl Clock, period_ms: u32) -> bool {
        self.elapsed(clock) >= period_ms
    }

    /// Check if at most `window_ms` have passed (inclusive)
    pub fn within(&self, clock: &impl Clock, window_ms: u32) -> bool {
        self.elapsed(clock) <= window_ms
    }
}

/// Hand-driven clock for host tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ManualClock {
    now: core::cell::Cell<u32>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn at(now_ms: u32) -> Self {
        Self {
            now: core::cell::Cell::new(now_ms),
        }
    }

    pub(crate) fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}
