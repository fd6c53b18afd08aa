//! Platform collaborator traits for abstraction and testability
//!
//! The board's status LEDs, button driver and Bluetooth controller are
//! consumed through these traits so the service and lifecycle logic can run
//! against mocks on the host.

/// Errors reported by platform collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    /// Peripheral or stack not ready
    NotReady,
    /// Operation already in progress
    Busy,
    /// Out of memory, buffers or connection objects
    NoResources,
    /// Driver-specific error code
    Driver(i32),
}

/// Board indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorId {
    /// Toggles while the firmware runs
    RunStatus,
    /// On while a central is connected
    ConStatus,
    /// Controlled by the peer through the LED characteristic
    User,
}

/// Status indicator output
pub trait Indicators {
    fn set_indicator(&mut self, id: IndicatorId, on: bool);
}

impl<T: Indicators + ?Sized> Indicators for &mut T {
    fn set_indicator(&mut self, id: IndicatorId, on: bool) {
        (**self).set_indicator(id, on)
    }
}

/// Boot-time hardware bring-up
pub trait Platform {
    /// Configure the indicator outputs
    fn init_indicators(&mut self) -> Result<(), PlatformError>;

    /// Configure the button input and its edge detection
    fn init_buttons(&mut self) -> Result<(), PlatformError>;

    /// Bring up the Bluetooth controller and host
    fn enable_bluetooth(&mut self) -> Result<(), PlatformError>;
}
