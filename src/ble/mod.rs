//! Bluetooth Low Energy module
//!
//! Binds the LED Button Service to the trouble-host attribute server.

pub mod service;

pub use service::{LedButtonGatt, Server};
