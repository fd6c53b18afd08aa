//! Embassy tasks module
//!
//! Contains all async tasks for the firmware, organised by functionality.

pub mod ble;
pub mod blink;
pub mod button;

pub use ble::{ble_task, AppService, Advertising};
pub use blink::blink_task;
pub use button::button_task;
