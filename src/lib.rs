#![cfg_attr(not(test), no_std)]

pub mod advertising;
pub mod app;
pub mod blink;
pub mod button;
pub mod config;
pub mod gatt;
pub mod lifecycle;
pub mod platform;

// These modules depend on esp-hal/trouble-host, only available with embedded feature
#[cfg(feature = "embedded")]
pub mod ble;
#[cfg(feature = "embedded")]
pub mod board;
#[cfg(feature = "embedded")]
pub mod tasks;
