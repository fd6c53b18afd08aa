//! Advertising controller
//!
//! Owns the advertising payload and parameters and turns start requests into
//! transport calls. Requests are only *scheduled* by [`AdvertisingController::advertising_start`];
//! they are executed later on the work context that runs
//! [`AdvertisingController::run_next`], so the request can be raised from
//! connection callbacks that must not call into the host stack.
//!
//! # Payload
//!
//! ```text
//! adv_data:  [02 01 06] [len 09 <device name>]
//! scan_data: [11 07 <service uuid, 16 bytes LE>]
//! ```

use core::future::Future;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use heapless::Vec;
use log::{debug, error, info};

use crate::config::ble;
use crate::gatt::uuid::Uuid128;
use crate::platform::PlatformError;

/// Legacy advertising PDU payload limit
pub const MAX_AD_LEN: usize = 31;

/// AD type: flags
const AD_TYPE_FLAGS: u8 = 0x01;
/// AD type: complete list of 128-bit service UUIDs
const AD_TYPE_UUID128_ALL: u8 = 0x07;
/// AD type: complete local name
const AD_TYPE_NAME_COMPLETE: u8 = 0x09;

/// Flag: LE general discoverable mode
pub const LE_GENERAL_DISCOVERABLE: u8 = 0x02;
/// Flag: BR/EDR not supported
pub const BR_EDR_NOT_SUPPORTED: u8 = 0x04;

/// Errors from the advertising controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisingError {
    /// AD structures do not fit in a legacy advertising PDU
    PayloadTooLong,
    /// The transport refused to start advertising
    Transport(PlatformError),
}

impl From<PlatformError> for AdvertisingError {
    fn from(e: PlatformError) -> Self {
        AdvertisingError::Transport(e)
    }
}

/// Advertising parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingParams {
    /// Accept connections
    pub connectable: bool,
    /// Advertise with the identity address rather than a private one
    pub use_identity: bool,
    /// Minimum interval in 0.625 ms units
    pub interval_min: u16,
    /// Maximum interval in 0.625 ms units
    pub interval_max: u16,
}

impl AdvertisingParams {
    /// Minimum interval in microseconds
    pub const fn interval_min_us(&self) -> u32 {
        self.interval_min as u32 * ble::ADV_INTERVAL_UNIT_US
    }

    /// Maximum interval in microseconds
    pub const fn interval_max_us(&self) -> u32 {
        self.interval_max as u32 * ble::ADV_INTERVAL_UNIT_US
    }
}

impl Default for AdvertisingParams {
    fn default() -> Self {
        Self {
            connectable: true,
            use_identity: true,
            interval_min: ble::ADV_INTERVAL_MIN,
            interval_max: ble::ADV_INTERVAL_MAX,
        }
    }
}

/// Encoded advertising and scan response data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingPayload {
    pub adv_data: Vec<u8, MAX_AD_LEN>,
    pub scan_data: Vec<u8, MAX_AD_LEN>,
}

impl AdvertisingPayload {
    /// Encode flags and the complete name into AD, the service UUID into scan response
    pub fn new(name: &str, service: &Uuid128) -> Result<Self, AdvertisingError> {
        let mut adv_data = Vec::new();
        push_ad_structure(
            &mut adv_data,
            AD_TYPE_FLAGS,
            &[LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED],
        )?;
        push_ad_structure(&mut adv_data, AD_TYPE_NAME_COMPLETE, name.as_bytes())?;

        let mut scan_data = Vec::new();
        push_ad_structure(&mut scan_data, AD_TYPE_UUID128_ALL, service.as_le_bytes())?;

        Ok(Self {
            adv_data,
            scan_data,
        })
    }
}

/// Append one `[len][type][data]` AD structure
fn push_ad_structure(
    buf: &mut Vec<u8, MAX_AD_LEN>,
    ad_type: u8,
    data: &[u8],
) -> Result<(), AdvertisingError> {
    // Length byte covers the type byte plus data
    let len = u8::try_from(data.len() + 1).map_err(|_| AdvertisingError::PayloadTooLong)?;
    buf.extend_from_slice(&[len, ad_type])
        .map_err(|_| AdvertisingError::PayloadTooLong)?;
    buf.extend_from_slice(data)
        .map_err(|_| AdvertisingError::PayloadTooLong)
}

/// Host stack advertising primitive
pub trait AdvertisingTransport {
    /// Begin advertising with the given parameters and payload
    fn start_advertising(
        &mut self,
        params: &AdvertisingParams,
        adv_data: &[u8],
        scan_data: &[u8],
    ) -> impl Future<Output = Result<(), PlatformError>>;
}

/// Something that can schedule an advertising start
pub trait AdvertisingStarter {
    /// Schedule a start request; never calls the transport directly
    fn advertising_start(&self);
}

impl<T: AdvertisingStarter + ?Sized> AdvertisingStarter for &T {
    fn advertising_start(&self) {
        (**self).advertising_start()
    }
}

/// Advertising controller
///
/// Start requests coalesce: scheduling while a request is already pending
/// results in a single transport call, like resubmitting a queued work item.
pub struct AdvertisingController<M: RawMutex> {
    request: Signal<M, ()>,
    params: AdvertisingParams,
    payload: AdvertisingPayload,
}

impl<M: RawMutex> AdvertisingController<M> {
    /// Create a controller advertising `name` and the `service` UUID
    pub fn new(
        name: &str,
        service: &Uuid128,
        params: AdvertisingParams,
    ) -> Result<Self, AdvertisingError> {
        Ok(Self {
            request: Signal::new(),
            params,
            payload: AdvertisingPayload::new(name, service)?,
        })
    }

    pub fn params(&self) -> &AdvertisingParams {
        &self.params
    }

    pub fn payload(&self) -> &AdvertisingPayload {
        &self.payload
    }

    /// Whether a start request is waiting to be executed
    pub fn is_pending(&self) -> bool {
        self.request.signaled()
    }

    /// Execute a scheduled request, if any
    ///
    /// Returns `None` when nothing was scheduled.
    pub async fn process_pending<T: AdvertisingTransport>(
        &self,
        transport: &mut T,
    ) -> Option<Result<(), AdvertisingError>> {
        self.request.try_take()?;
        Some(self.execute(transport).await)
    }

    /// Wait for the next scheduled request and execute it
    pub async fn run_next<T: AdvertisingTransport>(
        &self,
        transport: &mut T,
    ) -> Result<(), AdvertisingError> {
        self.request.wait().await;
        self.execute(transport).await
    }

    async fn execute<T: AdvertisingTransport>(
        &self,
        transport: &mut T,
    ) -> Result<(), AdvertisingError> {
        match transport
            .start_advertising(&self.params, &self.payload.adv_data, &self.payload.scan_data)
            .await
        {
            Ok(()) => {
                info!("Advertising successfully started");
                Ok(())
            }
            Err(e) => {
                // Not retried here; the next lifecycle transition schedules again
                error!("Advertising failed to start (err {:?})", e);
                Err(e.into())
            }
        }
    }
}

impl<M: RawMutex> AdvertisingStarter for AdvertisingController<M> {
    fn advertising_start(&self) {
        debug!("Advertising start scheduled");
        self.request.signal(());
    }
}

#[cfg(test)]
pub mod mock {
    //! Mock advertising transport and starter for testing

    use super::*;
    use core::cell::{Cell, RefCell};

    /// One recorded start_advertising() call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct StartCall {
        pub params: AdvertisingParams,
        pub adv_data: Vec<u8, MAX_AD_LEN>,
        pub scan_data: Vec<u8, MAX_AD_LEN>,
    }

    /// Records advertising starts
    #[derive(Default)]
    pub struct MockAdvertisingTransport {
        calls: RefCell<heapless::Vec<StartCall, 8>>,
        next_error: RefCell<Option<PlatformError>>,
    }

    impl MockAdvertisingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Set an error to be returned by the next start_advertising() call
        pub fn set_next_error(&self, error: PlatformError) {
            *self.next_error.borrow_mut() = Some(error);
        }

        pub fn calls(&self) -> heapless::Vec<StartCall, 8> {
            self.calls.borrow().clone()
        }
    }

    impl AdvertisingTransport for MockAdvertisingTransport {
        async fn start_advertising(
            &mut self,
            params: &AdvertisingParams,
            adv_data: &[u8],
            scan_data: &[u8],
        ) -> Result<(), PlatformError> {
            let mut call = StartCall {
                params: *params,
                adv_data: Vec::new(),
                scan_data: Vec::new(),
            };
            let _ = call.adv_data.extend_from_slice(adv_data);
            let _ = call.scan_data.extend_from_slice(scan_data);
            let _ = self.calls.borrow_mut().push(call);

            match self.next_error.borrow_mut().take() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        }
    }

    /// Counts scheduled starts
    #[derive(Default)]
    pub struct MockStarter {
        starts: Cell<usize>,
    }

    impl MockStarter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn starts(&self) -> usize {
            self.starts.get()
        }
    }

    impl AdvertisingStarter for MockStarter {
        fn advertising_start(&self) {
            self.starts.set(self.starts.get() + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockAdvertisingTransport;
    use super::*;
    use crate::gatt::uuid::LBS_SERVICE_UUID;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    fn controller() -> AdvertisingController<NoopRawMutex> {
        AdvertisingController::new("MY_LBS1", &LBS_SERVICE_UUID, AdvertisingParams::default())
            .unwrap()
    }

    #[test]
    fn test_payload_layout() {
        let payload = AdvertisingPayload::new("MY_LBS1", &LBS_SERVICE_UUID).unwrap();

        assert_eq!(
            payload.adv_data.as_slice(),
            &[0x02, 0x01, 0x06, 0x08, 0x09, b'M', b'Y', b'_', b'L', b'B', b'S', b'1']
        );

        assert_eq!(payload.scan_data.len(), 18);
        assert_eq!(&payload.scan_data[..2], &[0x11, 0x07]);
        assert_eq!(&payload.scan_data[2..], LBS_SERVICE_UUID.as_le_bytes());
    }

    #[test]
    fn test_payload_name_too_long() {
        // 3 bytes of flags + 2 header bytes leaves room for a 26 byte name
        let fits = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        assert!(AdvertisingPayload::new(fits, &LBS_SERVICE_UUID).is_ok());

        let too_long = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0";
        assert_eq!(
            AdvertisingPayload::new(too_long, &LBS_SERVICE_UUID),
            Err(AdvertisingError::PayloadTooLong)
        );
    }

    #[test]
    fn test_default_params() {
        let params = AdvertisingParams::default();
        assert!(params.connectable);
        assert!(params.use_identity);
        assert_eq!(params.interval_min_us(), 500_000);
        assert_eq!(params.interval_max_us(), 500_625);
    }

    #[test]
    fn test_start_is_deferred() {
        let controller = controller();
        let mut transport = MockAdvertisingTransport::new();

        futures::executor::block_on(async {
            // Nothing scheduled yet
            assert!(controller.process_pending(&mut transport).await.is_none());

            controller.advertising_start();
            assert!(controller.is_pending());
            // Scheduling alone never reaches the transport
            assert!(transport.calls().is_empty());

            assert_eq!(controller.process_pending(&mut transport).await, Some(Ok(())));
            assert!(!controller.is_pending());
        });

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].params, AdvertisingParams::default());
        assert_eq!(calls[0].adv_data, controller.payload().adv_data);
        assert_eq!(calls[0].scan_data, controller.payload().scan_data);
    }

    #[test]
    fn test_requests_coalesce() {
        let controller = controller();
        let mut transport = MockAdvertisingTransport::new();

        futures::executor::block_on(async {
            controller.advertising_start();
            controller.advertising_start();

            assert_eq!(controller.process_pending(&mut transport).await, Some(Ok(())));
            assert!(controller.process_pending(&mut transport).await.is_none());
        });
        assert_eq!(transport.calls().len(), 1);
    }

    #[test]
    fn test_failure_is_reported_not_retried() {
        let controller = controller();
        let mut transport = MockAdvertisingTransport::new();
        transport.set_next_error(PlatformError::NoResources);

        futures::executor::block_on(async {
            controller.advertising_start();
            assert_eq!(
                controller.process_pending(&mut transport).await,
                Some(Err(AdvertisingError::Transport(PlatformError::NoResources)))
            );
            // No retry until someone schedules again
            assert!(controller.process_pending(&mut transport).await.is_none());

            controller.advertising_start();
            assert_eq!(controller.run_next(&mut transport).await, Ok(()));
        });
        assert_eq!(transport.calls().len(), 2);
    }
}
