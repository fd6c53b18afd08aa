//! Hardware and BLE configuration constants for the ESP32-S3 LED Button board

/// BLE identity and advertising
pub mod ble {
    /// Complete local name carried in the advertising data
    pub const DEVICE_NAME: &str = "MY_LBS1";

    /// Advertising interval lower bound (800 * 0.625 ms = 500 ms)
    pub const ADV_INTERVAL_MIN: u16 = 800;

    /// Advertising interval upper bound (801 * 0.625 ms = 500.625 ms)
    pub const ADV_INTERVAL_MAX: u16 = 801;

    /// Advertising interval unit in microseconds
    pub const ADV_INTERVAL_UNIT_US: u32 = 625;

    /// Single-connection peripheral
    pub const CONNECTIONS_MAX: usize = 1;

    /// Signal + ATT
    pub const L2CAP_CHANNELS_MAX: usize = 2;

    /// Static random identity address, little-endian (top two bits of the last byte set)
    pub const IDENTITY_ADDRESS: [u8; 6] = [0x12, 0x5B, 0xE7, 0x83, 0x1E, 0xC6];
}

/// GPIO assignments
pub mod pins {
    /// Blinks while the firmware is running
    pub const RUN_STATUS_LED: u8 = 48;
    /// Lit while a central is connected
    pub const CON_STATUS_LED: u8 = 47;
    /// Driven by the LED characteristic
    pub const USER_LED: u8 = 21;
    /// BOOT button, active low
    pub const USER_BUTTON: u8 = 0;
}

/// Button bit masks used by the edge callback
pub mod buttons {
    pub const USER_BUTTON: u32 = 1 << 0;
}

/// Timing
pub mod timing {
    /// Run-status LED toggle period
    pub const RUN_LED_BLINK_INTERVAL_MS: u64 = 1000;

    /// Settle time after a button edge before sampling the level
    pub const BUTTON_DEBOUNCE_MS: u64 = 20;
}
