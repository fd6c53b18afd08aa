//! Attribute access handlers for the LED Button Service
//!
//! Validates peer reads and writes against the characteristic contract and
//! maps violations to ATT error codes. Validation errors never leave this
//! layer as anything other than an [`AttError`] returned to the peer.

use core::fmt;

use log::debug;

use super::registry::{Attribute, Permissions};

/// CCCD bit enabling notifications
const CCCD_NOTIFY: u16 = 0x0001;

/// CCCD bit enabling indications
const CCCD_INDICATE: u16 = 0x0002;

/// ATT error responses produced by the access handlers
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttError {
    /// Attribute cannot be read (0x02)
    ReadNotPermitted = 0x02,
    /// Attribute cannot be written (0x03)
    WriteNotPermitted = 0x03,
    /// Offset past the end of the attribute value (0x07)
    InvalidOffset = 0x07,
    /// Value length is invalid for the operation (0x0D)
    InvalidLength = 0x0D,
    /// Request failed for a reason the peer cannot fix (0x0E)
    Unlikely = 0x0E,
    /// Value is outside the permitted set (0x13)
    ValueNotAllowed = 0x13,
    /// CCCD written with a mode the characteristic does not support (0xFD)
    CccdImproperlyConfigured = 0xFD,
}

impl AttError {
    /// Wire value carried in the ATT Error Response
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for AttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            AttError::ReadNotPermitted => "read not permitted",
            AttError::WriteNotPermitted => "write not permitted",
            AttError::InvalidOffset => "invalid offset",
            AttError::InvalidLength => "invalid attribute value length",
            AttError::Unlikely => "unlikely error",
            AttError::ValueNotAllowed => "value not allowed",
            AttError::CccdImproperlyConfigured => "CCCD improperly configured",
        };
        write!(f, "{} (0x{:02x})", msg, self.code())
    }
}

/// Errors from service setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceError {
    /// Application callbacks were already bound
    AlreadyRegistered,
}

/// Receives LED state changes written by the peer
///
/// Called on the transport's dispatch context; must return quickly and must
/// not call back into the service or the advertising controller.
pub trait LedSink {
    fn set_led(&mut self, on: bool);
}

/// Supplies the current button state on demand
///
/// Same constraints as [`LedSink`].
pub trait ButtonSource {
    fn button_state(&mut self) -> bool;
}

/// Application callbacks bound to the service once at startup
pub struct AppCallbacks<L, B> {
    pub led: L,
    pub button: B,
}

/// LED Button Service state
///
/// Owns the cached characteristic values, the notify subscription and the
/// application callbacks. All mutation goes through `&mut self`, so whoever
/// owns the service is its single writer.
pub struct LedButtonService<L, B> {
    callbacks: Option<AppCallbacks<L, B>>,
    /// Cache of the last value obtained from the button source or notified
    button_state: bool,
    /// Last accepted LED write; never readable by peers
    led_state: bool,
    /// Raw CCCD value of the button characteristic
    cccd: u16,
}

impl<L: LedSink, B: ButtonSource> LedButtonService<L, B> {
    /// Create a service with no callbacks bound
    pub fn new() -> Self {
        Self {
            callbacks: None,
            button_state: false,
            led_state: false,
            cccd: 0,
        }
    }

    /// Bind the application callbacks
    ///
    /// Binding is once-only; a second call leaves the first binding in place.
    pub fn init(&mut self, callbacks: AppCallbacks<L, B>) -> Result<(), ServiceError> {
        if self.callbacks.is_some() {
            return Err(ServiceError::AlreadyRegistered);
        }
        self.callbacks = Some(callbacks);
        Ok(())
    }

    /// Whether application callbacks are bound
    pub fn is_registered(&self) -> bool {
        self.callbacks.is_some()
    }

    /// Cached button value
    pub fn button_state(&self) -> bool {
        self.button_state
    }

    /// Last LED value accepted from a peer
    pub fn led_state(&self) -> bool {
        self.led_state
    }

    /// Whether the peer enabled notifications on the button characteristic
    pub fn notifications_enabled(&self) -> bool {
        self.cccd & CCCD_NOTIFY != 0
    }

    /// Forget per-connection state once the link is gone
    pub fn connection_closed(&mut self) {
        self.cccd = 0;
    }

    /// Handle a write to the LED characteristic
    ///
    /// Returns the number of bytes consumed.
    pub fn write_led(&mut self, data: &[u8], offset: u16) -> Result<usize, AttError> {
        debug!("Attribute write, led, len {} offset {}", data.len(), offset);

        if data.len() != 1 {
            debug!("Write led: Incorrect data length");
            return Err(AttError::InvalidLength);
        }
        if offset != 0 {
            debug!("Write led: Incorrect data offset");
            return Err(AttError::InvalidOffset);
        }
        let on = match data[0] {
            0x00 => false,
            0x01 => true,
            _ => {
                debug!("Write led: Incorrect value");
                return Err(AttError::ValueNotAllowed);
            }
        };

        self.led_state = on;
        if let Some(callbacks) = self.callbacks.as_mut() {
            callbacks.led.set_led(on);
        }
        Ok(data.len())
    }

    /// Handle a read of the button characteristic
    ///
    /// Copies the value starting at `offset` into `buf`, truncated to the
    /// buffer. With no callbacks bound the read succeeds with zero bytes.
    pub fn read_button(&mut self, buf: &mut [u8], offset: u16) -> Result<usize, AttError> {
        let Some(callbacks) = self.callbacks.as_mut() else {
            debug!("Button read with no callback registered");
            return Ok(0);
        };

        self.button_state = callbacks.button.button_state();
        debug!(
            "Button state: {}",
            if self.button_state { "pressed" } else { "released" }
        );

        read_value(&encode_bool(self.button_state), buf, offset)
    }

    /// Read the button CCCD
    pub fn read_cccd(&self, buf: &mut [u8], offset: u16) -> Result<usize, AttError> {
        read_value(&self.cccd.to_le_bytes(), buf, offset)
    }

    /// Write the button CCCD
    pub fn write_cccd(&mut self, data: &[u8], offset: u16) -> Result<usize, AttError> {
        if offset != 0 {
            return Err(AttError::InvalidOffset);
        }
        let value = match data {
            [lo, hi] => u16::from_le_bytes([*lo, *hi]),
            _ => return Err(AttError::InvalidLength),
        };
        if value & !(CCCD_NOTIFY | CCCD_INDICATE) != 0 {
            return Err(AttError::ValueNotAllowed);
        }
        if value & CCCD_INDICATE != 0 {
            // The button characteristic has NOTIFY only
            return Err(AttError::CccdImproperlyConfigured);
        }

        debug!(
            "Button notifications {}",
            if value & CCCD_NOTIFY != 0 { "enabled" } else { "disabled" }
        );
        self.cccd = value;
        Ok(data.len())
    }

    /// Dispatch a read to the addressed attribute
    pub fn read(
        &mut self,
        attribute: Attribute,
        buf: &mut [u8],
        offset: u16,
    ) -> Result<usize, AttError> {
        match attribute {
            Attribute::ButtonCccd => self.read_cccd(buf, offset),
            value if !readable(value) => Err(AttError::ReadNotPermitted),
            Attribute::ButtonValue => self.read_button(buf, offset),
            Attribute::LedValue => Err(AttError::ReadNotPermitted),
        }
    }

    /// Dispatch a write to the addressed attribute
    pub fn write(
        &mut self,
        attribute: Attribute,
        data: &[u8],
        offset: u16,
    ) -> Result<usize, AttError> {
        match attribute {
            Attribute::ButtonCccd => self.write_cccd(data, offset),
            value if !writable(value) => Err(AttError::WriteNotPermitted),
            Attribute::LedValue => self.write_led(data, offset),
            Attribute::ButtonValue => Err(AttError::WriteNotPermitted),
        }
    }

    /// Record a state about to be notified and produce its payload
    ///
    /// Returns `None` when nobody is subscribed.
    pub fn stage_button_state(&mut self, state: bool) -> Option<[u8; 1]> {
        self.button_state = state;
        if self.notifications_enabled() {
            Some(encode_bool(state))
        } else {
            None
        }
    }
}

impl<L: LedSink, B: ButtonSource> Default for LedButtonService<L, B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-width encoding shared by both characteristics
pub const fn encode_bool(value: bool) -> [u8; 1] {
    [value as u8]
}

fn readable(attribute: Attribute) -> bool {
    attribute
        .characteristic()
        .permissions
        .contains(Permissions::READ)
}

fn writable(attribute: Attribute) -> bool {
    attribute
        .characteristic()
        .permissions
        .contains(Permissions::WRITE)
}

/// Long-read semantics: serve `value[offset..]`, truncated to `buf`
fn read_value(value: &[u8], buf: &mut [u8], offset: u16) -> Result<usize, AttError> {
    let offset = usize::from(offset);
    if offset > value.len() {
        return Err(AttError::InvalidOffset);
    }
    let len = buf.len().min(value.len() - offset);
    buf[..len].copy_from_slice(&value[offset..offset + len]);
    Ok(len)
}

#[cfg(test)]
pub mod mock {
    //! Recording application callbacks for testing

    use super::*;
    use core::cell::{Cell, RefCell};
    use heapless::Vec;

    /// LED sink that records every state it is given
    #[derive(Default)]
    pub struct MockLed {
        calls: RefCell<Vec<bool, 16>>,
    }

    impl MockLed {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<bool, 16> {
            self.calls.borrow().clone()
        }
    }

    impl LedSink for &MockLed {
        fn set_led(&mut self, on: bool) {
            let _ = self.calls.borrow_mut().push(on);
        }
    }

    /// Button source returning queued states, then repeating the last one
    #[derive(Default)]
    pub struct MockButton {
        queued: RefCell<Vec<bool, 16>>,
        last: Cell<bool>,
        reads: Cell<usize>,
    }

    impl MockButton {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn queue(&self, state: bool) {
            let _ = self.queued.borrow_mut().push(state);
        }

        pub fn reads(&self) -> usize {
            self.reads.get()
        }
    }

    impl ButtonSource for &MockButton {
        fn button_state(&mut self) -> bool {
            self.reads.set(self.reads.get() + 1);
            let mut queued = self.queued.borrow_mut();
            if !queued.is_empty() {
                self.last.set(queued.remove(0));
            }
            self.last.get()
        }
    }
}
