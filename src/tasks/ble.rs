//! BLE task for the LED Button Service
//!
//! Runs the trouble-host stack and is the single owner of the service state:
//! every GATT access, button notification and connection event for the
//! peripheral is handled here, one at a time.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Duration;
use log::{debug, error, warn};
use trouble_host::prelude::*;

use crate::advertising::{
    AdvertisingController, AdvertisingParams, AdvertisingStarter, AdvertisingTransport,
};
use crate::ble::service::{att_error_code, Server};
use crate::board::{SharedLeds, UserButton};
use crate::config::ble;
use crate::gatt::{AttError, Attribute, LedButtonService, NotifyError, NotifyTransport};
use crate::lifecycle::{ConnectionEvent, ConnectionHandle, ConnectionLifecycle};
use crate::platform::PlatformError;

/// Service state as wired on this board
pub type AppService = LedButtonService<&'static SharedLeds, &'static UserButton>;

/// Advertising controller shared with the boot sequence
pub type Advertising = AdvertisingController<CriticalSectionRawMutex>;

/// HCI "Connection Failed to be Established"
const CONNECTION_FAILED: u8 = 0x3E;

/// HCI "Connection Terminated by Local Host"
const LOCAL_HOST_TERMINATED: u8 = 0x16;

/// Placeholder handle for a connection that never came up
const NO_CONNECTION: ConnectionHandle = ConnectionHandle(u16::MAX);

/// Advertising on the trouble-host peripheral
///
/// A successful start leaves the advertiser here for the connection loop
/// to accept on.
struct HostAdvertiser<'d, C: Controller> {
    peripheral: Peripheral<'d, C, DefaultPacketPool>,
    active: Option<Advertiser<'d, C, DefaultPacketPool>>,
}

impl<'d, C: Controller> AdvertisingTransport for HostAdvertiser<'d, C> {
    async fn start_advertising(
        &mut self,
        params: &AdvertisingParams,
        adv_data: &[u8],
        scan_data: &[u8],
    ) -> Result<(), PlatformError> {
        let host_params = AdvertisementParameters {
            interval_min: Duration::from_micros(u64::from(params.interval_min_us())),
            interval_max: Duration::from_micros(u64::from(params.interval_max_us())),
            ..Default::default()
        };
        let advertisement = if params.connectable {
            Advertisement::ConnectableScannableUndirected {
                adv_data,
                scan_data,
            }
        } else {
            Advertisement::NonconnectableScannableUndirected {
                adv_data,
                scan_data,
            }
        };

        let advertiser = self
            .peripheral
            .advertise(&host_params, advertisement)
            .await
            .map_err(|_| PlatformError::NotReady)?;
        self.active = Some(advertiser);
        Ok(())
    }
}

/// Notifications on one GATT connection
struct ConnectionNotifier<'a, 'v, 'd, 's> {
    server: &'a Server<'v>,
    conn: &'a GattConnection<'d, 's, DefaultPacketPool>,
}

impl NotifyTransport for ConnectionNotifier<'_, '_, '_, '_> {
    async fn notify(&mut self, attribute: Attribute, payload: &[u8]) -> Result<(), NotifyError> {
        let value = match (attribute, payload) {
            (Attribute::ButtonValue, [value]) => *value != 0,
            _ => return Err(NotifyError::Transport),
        };

        self.server
            .lbs
            .button
            .notify(self.conn, &value)
            .await
            .map_err(|e| match e {
                Error::Disconnected => NotifyError::NotConnected,
                Error::OutOfMemory => NotifyError::NoBuffers,
                _ => NotifyError::Transport,
            })
    }
}

/// Main BLE task that manages the Bluetooth stack and connections
///
/// This task:
/// 1. Builds the host stack with the static identity address
/// 2. Runs scheduled advertising starts (the advertising work context)
/// 3. Routes GATT reads and writes through the service
/// 4. Sends button notifications
/// 5. Feeds connect, disconnect and recycle events to the lifecycle
pub async fn ble_task<C: Controller>(
    controller: C,
    mut service: AppService,
    advertising: &'static Advertising,
    leds: &'static SharedLeds,
    button: &'static UserButton,
) {
    let mut resources: HostResources<
        DefaultPacketPool,
        { ble::CONNECTIONS_MAX },
        { ble::L2CAP_CHANNELS_MAX },
    > = HostResources::new();

    let stack = trouble_host::new(controller, &mut resources)
        .set_random_address(Address::random(ble::IDENTITY_ADDRESS));

    let Host {
        peripheral,
        mut runner,
        ..
    } = stack.build();

    let gap = GapConfig::Peripheral(PeripheralConfig {
        name: ble::DEVICE_NAME,
        appearance: &appearance::UNKNOWN,
    });
    let server: Server = match Server::new_with_config(gap) {
        Ok(s) => s,
        Err(_) => {
            error!("GATT server init failed");
            return;
        }
    };

    let runner_task = runner.run();

    let peripheral_task = async {
        let mut lifecycle = ConnectionLifecycle::new(leds, advertising);
        let mut transport = HostAdvertiser {
            peripheral,
            active: None,
        };

        loop {
            // Failures are logged by the controller; wait for the next request
            if advertising.run_next(&mut transport).await.is_err() {
                continue;
            }
            let Some(advertiser) = transport.active.take() else {
                continue;
            };

            // Wait for connection
            let Ok(acceptor) = advertiser.accept().await else {
                lifecycle.handle(ConnectionEvent::Connected {
                    handle: NO_CONNECTION,
                    status: CONNECTION_FAILED,
                });
                // The host ends advertising on a failed accept; resume it
                advertising.advertising_start();
                continue;
            };
            let handle = ConnectionHandle(acceptor.handle().raw());
            lifecycle.handle(ConnectionEvent::Connected { handle, status: 0 });

            // The link is up; a failed attach still goes through disconnect
            // and recycle so the connection slot is free before advertising
            let Ok(conn) = acceptor.with_attribute_server(&*server) else {
                warn!("Attaching attribute server failed, dropping link");
                lifecycle.handle(ConnectionEvent::Disconnected {
                    handle,
                    reason: LOCAL_HOST_TERMINATED,
                });
                service.connection_closed();
                lifecycle.handle(ConnectionEvent::Recycled);
                continue;
            };

            // Edges from before this connection are not notified
            button.discard_changed();
            let reason = serve_connection(&server, &conn, &mut service, button).await;
            lifecycle.handle(ConnectionEvent::Disconnected { handle, reason });
            service.connection_closed();

            // Connection object released back to the host
            drop(conn);
            lifecycle.handle(ConnectionEvent::Recycled);
        }
    };

    select(runner_task, peripheral_task).await;
}

/// Handle one connection until it drops; returns the disconnect reason
async fn serve_connection(
    server: &Server<'_>,
    conn: &GattConnection<'_, '_, DefaultPacketPool>,
    service: &mut AppService,
    button: &UserButton,
) -> u8 {
    loop {
        match select(conn.next(), button.wait_changed()).await {
            Either::First(GattConnectionEvent::Disconnected { reason }) => {
                return reason.into_inner();
            }
            Either::First(GattConnectionEvent::Gatt { event }) => {
                handle_gatt_event(server, service, event).await;
            }
            Either::First(_) => {}
            Either::Second(pressed) => {
                let mut notifier = ConnectionNotifier { server, conn };
                // Failures are logged by the notification path
                let _ = service.send_button_state(&mut notifier, pressed).await;
            }
        }
    }
}

/// Validate a GATT access against the service, then accept or reject it
async fn handle_gatt_event(
    server: &Server<'_>,
    service: &mut AppService,
    event: GattEvent<'_, '_, DefaultPacketPool>,
) {
    let result = match &event {
        GattEvent::Read(read) => match server.attribute(read.handle()) {
            Some(attribute) => refresh_for_read(server, service, attribute),
            None => Ok(()),
        },
        GattEvent::Write(write) => match server.attribute(write.handle()) {
            // ATT Write Request carries no offset
            Some(attribute) => service.write(attribute, write.data(), 0).map(|_| ()),
            None => Ok(()),
        },
        _ => Ok(()),
    };

    let reply = match result {
        Ok(()) => event.accept(),
        Err(e) => {
            debug!("Rejecting GATT access: {}", e);
            event.reject(att_error_code(e))
        }
    };
    match reply {
        Ok(reply) => reply.send().await,
        Err(_) => warn!("Error sending GATT response"),
    }
}

/// Run the read handler and store its value in the attribute table
///
/// The table then serves the read, including long-read offsets.
fn refresh_for_read(
    server: &Server<'_>,
    service: &mut AppService,
    attribute: Attribute,
) -> Result<(), AttError> {
    let mut buf = [0u8; 2];
    let len = service.read(attribute, &mut buf, 0)?;
    if attribute == Attribute::ButtonValue && len == 1 {
        // Never serve a stale table value for a fresh read
        server.set(&server.lbs.button, &(buf[0] != 0)).map_err(|_| {
            warn!("Error updating button value");
            AttError::Unlikely
        })?;
    }
    Ok(())
}
