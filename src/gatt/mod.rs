//! LED Button Service
//!
//! Declaration, attribute access and notification logic for the custom
//! GATT service. Independent of any particular BLE host stack.

pub mod access;
pub mod notify;
pub mod registry;
pub mod uuid;

pub use access::{AppCallbacks, AttError, ButtonSource, LedButtonService, LedSink, ServiceError};
pub use notify::{Delivery, NotifyError, NotifyTransport};
pub use registry::{Attribute, LED_BUTTON_SERVICE};
pub use uuid::{Uuid128, LBS_BUTTON_UUID, LBS_LED_UUID, LBS_SERVICE_UUID};
