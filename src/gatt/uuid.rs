//! 128-bit UUIDs for the LED Button Service
//!
//! All three UUIDs share the vendor base `0000xxxx-1212-efde-1523-785feabcd123`;
//! only the 16 bits at offset 12..14 (little-endian) differ.

use core::fmt;

/// Vendor-specific base with the short UUID slot zeroed
const LBS_BASE: u128 = 0x00000000_1212_efde_1523_785feabcd123;

/// A 128-bit UUID held in little-endian (over-the-air) byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uuid128([u8; 16]);

impl Uuid128 {
    /// Create a UUID from its numeric value (as written in canonical form)
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_le_bytes())
    }

    /// Create a UUID from little-endian bytes
    pub const fn from_le_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Bytes in little-endian order, as they appear in AD structures and ATT PDUs
    pub const fn as_le_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Numeric value
    pub const fn as_u128(&self) -> u128 {
        u128::from_le_bytes(self.0)
    }
}

impl fmt::Display for Uuid128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.as_u128();
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xffff_ffff_ffff,
        )
    }
}

/// Build a UUID from the LBS vendor base and a 16-bit short value
pub const fn lbs_uuid(short: u16) -> Uuid128 {
    Uuid128::from_u128(LBS_BASE | ((short as u128) << 96))
}

/// LED Button Service
pub const LBS_SERVICE_UUID: Uuid128 = lbs_uuid(0x1523);

/// Button characteristic (read, notify)
pub const LBS_BUTTON_UUID: Uuid128 = lbs_uuid(0x1524);

/// LED characteristic (write)
pub const LBS_LED_UUID: Uuid128 = lbs_uuid(0x1525);
