//! LED Button Service attribute table
//!
//! - Service UUID: 00001523-1212-EFDE-1523-785FEABCD123
//! - Button characteristic: 00001524-... (read, notify)
//! - LED characteristic: 00001525-... (write)
//!
//! The table only stores values. Every peer access is routed through
//! [`crate::gatt::LedButtonService`] before it is accepted.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use trouble_host::prelude::*;

use crate::gatt::{AttError, Attribute};

/// LED Button Service
#[gatt_service(uuid = "00001523-1212-efde-1523-785feabcd123")]
pub struct LedButtonGatt {
    /// Button characteristic - current button level, notified on change
    #[characteristic(uuid = "00001524-1212-efde-1523-785feabcd123", read, notify, value = false)]
    pub button: bool,

    /// LED characteristic - peer writes 0x00 or 0x01
    #[characteristic(uuid = "00001525-1212-efde-1523-785feabcd123", write, value = false)]
    pub led: bool,
}

/// GATT server with the LED Button Service
#[gatt_server(mutex_type = CriticalSectionRawMutex)]
pub struct Server {
    pub lbs: LedButtonGatt,
}

impl Server<'_> {
    /// Map an attribute handle to the service attribute it addresses
    pub fn attribute(&self, handle: u16) -> Option<Attribute> {
        if handle == self.lbs.button.handle {
            Some(Attribute::ButtonValue)
        } else if Some(handle) == self.lbs.button.cccd_handle {
            Some(Attribute::ButtonCccd)
        } else if handle == self.lbs.led.handle {
            Some(Attribute::LedValue)
        } else {
            None
        }
    }
}

/// ATT error code sent in the error response
pub fn att_error_code(error: AttError) -> AttErrorCode {
    match error {
        AttError::ReadNotPermitted => AttErrorCode::READ_NOT_PERMITTED,
        AttError::WriteNotPermitted => AttErrorCode::WRITE_NOT_PERMITTED,
        AttError::InvalidOffset => AttErrorCode::INVALID_OFFSET,
        AttError::InvalidLength => AttErrorCode::INVALID_ATTRIBUTE_VALUE_LENGTH,
        AttError::Unlikely => AttErrorCode::UNLIKELY_ERROR,
        AttError::ValueNotAllowed => AttErrorCode::VALUE_NOT_ALLOWED,
        AttError::CccdImproperlyConfigured => AttErrorCode::CCCD_IMPROPERLY_CONFIGURED,
    }
}
