//! User button task
//!
//! Waits for edges on the BOOT button, lets the contacts settle, then feeds
//! the sampled level to the shared button. Changes are latched there for the
//! BLE task, which owns the service and sends the notification.

use embassy_time::{Duration, Timer};
use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;
use log::warn;

use crate::board::UserButton;
use crate::button::ButtonEdge;
use crate::config::timing::BUTTON_DEBOUNCE_MS;

/// Task that tracks the user button (active low)
pub async fn button_task<P: InputPin + Wait>(mut input: P, button: &'static UserButton) {
    loop {
        if input.wait_for_any_edge().await.is_err() {
            warn!("Button edge wait failed");
            Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;
            continue;
        }
        Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;

        let Ok(pressed) = input.is_low() else {
            continue;
        };
        button.on_edge(ButtonEdge::from_level(pressed, button.is_pressed()));
    }
}
