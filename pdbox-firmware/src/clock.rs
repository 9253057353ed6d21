//! Millisecond clock backed by the embassy time driver

use embassy_time::Instant;

use pdbox_core::clock::Clock;

/// Milliseconds since boot, wrapping at `u32::MAX`
#[derive(Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}
