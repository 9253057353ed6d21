//! Control loop task
//!
//! Runs every millisecond: samples the encoder, feeds any pending event to
//! the controller, advances the blink, refreshes the measurements on their
//! own cadence and redraws only when something changed.

use defmt::*;
use embassy_time::{Duration, Ticker};

use pdbox_core::clock::Stopwatch;
use pdbox_core::control::{Controller, Readings};
use pdbox_display::{render, DisplayBackend};

use crate::board::Board;
use crate::clock::EmbassyClock;

/// Control loop period
const TICK_INTERVAL_MS: u64 = 1;

#[embassy_executor::task]
pub async fn control_task(mut board: Board, mut controller: Controller) {
    info!("Control task started");

    let clock = EmbassyClock;
    let measure_ms = controller.timing().measure_ms;
    let mut measured = Stopwatch::start(&clock);
    let mut readings = Readings::measure(&mut board.sensor, &mut board.pd);
    let mut redraw = true;

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));

    loop {
        if board.encoder.poll(&clock) {
            if let Some(input) = board.encoder.take() {
                debug!("Input: {:?}", input);
                if let Some(event) = controller.handle_event(input, &mut board.pd, &clock) {
                    if event.is_failure() {
                        warn!("Control: {:?}", event);
                    } else {
                        info!("Control: {:?}", event);
                    }
                    redraw |= event.needs_redraw();
                }
            }
        }

        redraw |= controller.tick(&clock);

        if measured.has_elapsed(&clock, measure_ms) {
            measured.restart(&clock);
            let latest = Readings::measure(&mut board.sensor, &mut board.pd);
            if latest != readings {
                readings = latest;
                redraw = true;
            }
        }

        if redraw {
            redraw = false;
            let _ = render(&mut *board.frame, &controller.view(), &readings);
            if let Err(e) = board.oled.flush(&mut *board.frame) {
                warn!("Display flush failed: {:?}", e);
            }
        }

        ticker.next().await;
    }
}
