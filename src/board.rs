//! ESP32-S3 board support
//!
//! GPIO-backed status LEDs, the user button and Bluetooth controller
//! bring-up behind the [`Platform`] trait.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::digital::OutputPin;
use esp_hal::gpio::{Input, Output};
use esp_hal::peripherals::BT;
use esp_radio::ble::controller::BleConnector;
use log::info;
use static_cell::StaticCell;
use trouble_host::prelude::ExternalController;

use crate::button::{AppButton, ButtonEdge};
use crate::config::buttons::USER_BUTTON;
use crate::gatt::LedSink;
use crate::platform::{IndicatorId, Indicators, Platform, PlatformError};

/// Controller command slots for the trouble-host adapter
const CONTROLLER_SLOTS: usize = 10;

/// BLE controller handed to the host stack
pub type BleController = ExternalController<BleConnector<'static>, CONTROLLER_SLOTS>;

/// User button shared by the button and BLE tasks
pub type UserButton = AppButton<CriticalSectionRawMutex>;

/// Static cell for esp-radio controller (needed for 'static lifetime)
static RADIO_CONTROLLER: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();

/// The three board LEDs, active low
pub struct StatusLeds<P> {
    run: P,
    con: P,
    user: P,
}

impl<P: OutputPin> StatusLeds<P> {
    pub fn new(run: P, con: P, user: P) -> Self {
        Self { run, con, user }
    }

    fn pin(&mut self, id: IndicatorId) -> &mut P {
        match id {
            IndicatorId::RunStatus => &mut self.run,
            IndicatorId::ConStatus => &mut self.con,
            IndicatorId::User => &mut self.user,
        }
    }
}

impl<P: OutputPin> Indicators for StatusLeds<P> {
    fn set_indicator(&mut self, id: IndicatorId, on: bool) {
        let pin = self.pin(id);
        // GPIO errors are infallible on this chip
        let _ = if on { pin.set_low() } else { pin.set_high() };
    }
}

/// LEDs shared between the BLE and blink tasks
pub struct SharedLeds(Mutex<CriticalSectionRawMutex, RefCell<StatusLeds<Output<'static>>>>);

impl SharedLeds {
    pub fn new(leds: StatusLeds<Output<'static>>) -> Self {
        Self(Mutex::new(RefCell::new(leds)))
    }
}

impl Indicators for &SharedLeds {
    fn set_indicator(&mut self, id: IndicatorId, on: bool) {
        self.0.lock(|leds| leds.borrow_mut().set_indicator(id, on));
    }
}

/// The LED characteristic drives the user LED
impl LedSink for &SharedLeds {
    fn set_led(&mut self, on: bool) {
        self.set_indicator(IndicatorId::User, on);
    }
}

/// Board bring-up
pub struct EspPlatform {
    leds: &'static SharedLeds,
    button: Input<'static>,
    app_button: &'static UserButton,
    bt: Option<BT<'static>>,
    controller: Option<BleController>,
}

impl EspPlatform {
    pub fn new(
        leds: &'static SharedLeds,
        button: Input<'static>,
        app_button: &'static UserButton,
        bt: BT<'static>,
    ) -> Self {
        Self {
            leds,
            button,
            app_button,
            bt: Some(bt),
            controller: None,
        }
    }

    /// Hand over the button input and, once enabled, the BLE controller
    pub fn into_parts(self) -> (Input<'static>, Option<BleController>) {
        (self.button, self.controller)
    }
}

impl Platform for EspPlatform {
    fn init_indicators(&mut self) -> Result<(), PlatformError> {
        let mut leds = self.leds;
        for id in [IndicatorId::RunStatus, IndicatorId::ConStatus, IndicatorId::User] {
            leds.set_indicator(id, false);
        }
        Ok(())
    }

    fn init_buttons(&mut self) -> Result<(), PlatformError> {
        // BOOT button is active low; seed the level before the first edge
        let pressed = self.button.is_low();
        self.app_button.on_edge(ButtonEdge {
            state: if pressed { USER_BUTTON } else { 0 },
            changed: USER_BUTTON,
        });
        Ok(())
    }

    fn enable_bluetooth(&mut self) -> Result<(), PlatformError> {
        let bt = self.bt.take().ok_or(PlatformError::Busy)?;

        // Initialise esp-radio for BLE support (must be after esp_rtos::start)
        let radio = esp_radio::init().map_err(|_| PlatformError::NotReady)?;
        let radio = RADIO_CONTROLLER.try_init(radio).ok_or(PlatformError::Busy)?;

        let connector = BleConnector::new(radio, bt, esp_radio::ble::Config::default())
            .map_err(|_| PlatformError::NotReady)?;

        // Wrap in ExternalController for trouble-host compatibility
        self.controller = Some(ExternalController::new(connector));
        info!("BLE controller ready");
        Ok(())
    }
}
