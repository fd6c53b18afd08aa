//! User button tracking
//!
//! The board's button driver reports edges as a pair of bit masks: the
//! current level of every button and which of them changed. Only the user
//! button bit is of interest here.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use log::{debug, info};

use crate::config::buttons::USER_BUTTON;
use crate::gatt::ButtonSource;

/// One edge report from the button driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEdge {
    /// Bit set per button currently pressed
    pub state: u32,
    /// Bit set per button whose level changed
    pub changed: u32,
}

impl ButtonEdge {
    /// Edge report for a sampled user button level
    pub const fn from_level(pressed: bool, was_pressed: bool) -> Self {
        Self {
            state: if pressed { USER_BUTTON } else { 0 },
            changed: if pressed != was_pressed { USER_BUTTON } else { 0 },
        }
    }
}

/// Latest known user button level
///
/// Written from the edge path, read by the attribute access layer. Each
/// change is also latched in a signal for the notification path; only the
/// newest level is kept.
pub struct AppButton<M: RawMutex> {
    pressed: AtomicBool,
    changed: Signal<M, bool>,
}

impl<M: RawMutex> AppButton<M> {
    pub const fn new() -> Self {
        Self {
            pressed: AtomicBool::new(false),
            changed: Signal::new(),
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.load(Ordering::Acquire)
    }

    /// Apply an edge report; returns the new level if the user button changed
    pub fn on_edge(&self, edge: ButtonEdge) -> Option<bool> {
        if edge.changed & USER_BUTTON == 0 {
            return None;
        }
        let pressed = edge.state & USER_BUTTON != 0;
        self.pressed.store(pressed, Ordering::Release);
        self.changed.signal(pressed);
        info!("Button {}", if pressed { "pressed" } else { "released" });
        Some(pressed)
    }

    /// Wait for the next level change
    pub async fn wait_changed(&self) -> bool {
        self.changed.wait().await
    }

    /// Take a latched change without waiting
    pub fn take_changed(&self) -> Option<bool> {
        self.changed.try_take()
    }

    /// Drop a latched change nobody consumed
    ///
    /// Edges seen while no central is connected must not be notified on the
    /// next connection.
    pub fn discard_changed(&self) {
        if self.changed.signaled() {
            debug!("Discarding stale button change");
        }
        self.changed.reset();
    }
}

impl<M: RawMutex> Default for AppButton<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> ButtonSource for &AppButton<M> {
    fn button_state(&mut self) -> bool {
        self.is_pressed()
    }
}
