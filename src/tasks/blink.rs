//! Run-status blink task

use embassy_time::{Duration, Ticker};

use crate::blink::StatusBlinker;
use crate::config::timing::RUN_LED_BLINK_INTERVAL_MS;
use crate::platform::Indicators;

/// Toggle the run-status LED forever
///
/// Independent of the BLE state; only touches its own indicator.
pub async fn blink_task<I: Indicators>(mut indicators: I) {
    let mut blinker = StatusBlinker::new();
    let mut ticker = Ticker::every(Duration::from_millis(RUN_LED_BLINK_INTERVAL_MS));

    loop {
        blinker.tick(&mut indicators);
        ticker.next().await;
    }
}
