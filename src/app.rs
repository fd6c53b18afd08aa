//! Boot sequence
//!
//! Brings the board up in a fixed order and hands back a registered service
//! with the first advertising start already scheduled. Any failure here is
//! fatal to startup.

use core::fmt;

use log::{error, info};

use crate::advertising::AdvertisingStarter;
use crate::gatt::{AppCallbacks, ButtonSource, LedButtonService, LedSink, ServiceError};
use crate::platform::{Platform, PlatformError};

/// Boot stage that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    Indicators(PlatformError),
    Buttons(PlatformError),
    Bluetooth(PlatformError),
    Service(ServiceError),
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootError::Indicators(e) => write!(f, "LEDs init failed (err {:?})", e),
            BootError::Buttons(e) => write!(f, "Failed to initialize buttons (err {:?})", e),
            BootError::Bluetooth(e) => write!(f, "Bluetooth init failed (err {:?})", e),
            BootError::Service(e) => write!(f, "Failed to init LBS (err {:?})", e),
        }
    }
}

/// Run the boot sequence
///
/// Order: indicators, buttons, Bluetooth, service callbacks, first
/// advertising start.
pub fn boot<P, L, B, A>(
    platform: &mut P,
    callbacks: AppCallbacks<L, B>,
    advertising: &A,
) -> Result<LedButtonService<L, B>, BootError>
where
    P: Platform,
    L: LedSink,
    B: ButtonSource,
    A: AdvertisingStarter + ?Sized,
{
    info!("Starting LED Button Service peripheral");

    let result = bring_up(platform, callbacks);
    match &result {
        Ok(_) => advertising.advertising_start(),
        Err(e) => error!("{}", e),
    }
    result
}

fn bring_up<P, L, B>(
    platform: &mut P,
    callbacks: AppCallbacks<L, B>,
) -> Result<LedButtonService<L, B>, BootError>
where
    P: Platform,
    L: LedSink,
    B: ButtonSource,
{
    platform.init_indicators().map_err(BootError::Indicators)?;
    platform.init_buttons().map_err(BootError::Buttons)?;
    platform.enable_bluetooth().map_err(BootError::Bluetooth)?;
    info!("Bluetooth initialized");

    let mut service = LedButtonService::new();
    service.init(callbacks).map_err(BootError::Service)?;
    Ok(service)
}
