//! BLE client for the LED Button Service.

use std::time::Duration;

use anyhow::{anyhow, Result};
use btleplug::api::{
    Central, CharPropFlags, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use tokio::time::timeout;
use uuid::Uuid;

/// LED Button Service UUIDs
pub const LBS_SERVICE_UUID: Uuid = Uuid::from_u128(0x00001523_1212_efde_1523_785feabcd123);
pub const LBS_BUTTON_UUID: Uuid = Uuid::from_u128(0x00001524_1212_efde_1523_785feabcd123); // Read, notify
pub const LBS_LED_UUID: Uuid = Uuid::from_u128(0x00001525_1212_efde_1523_785feabcd123); // Write

/// Client connected to one LBS peripheral.
pub struct LbsClient {
    adapter: Adapter,
    name: String,
    peripheral: Peripheral,
    button_char: Characteristic,
    led_char: Characteristic,
}

impl LbsClient {
    /// Scan for a device by name and connect.
    pub async fn connect_by_name(name: &str, scan_timeout: Duration) -> Result<Self> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No Bluetooth adapters found"))?;

        let peripheral = Self::scan_and_connect(&adapter, name, scan_timeout).await?;
        let (button_char, led_char) = Self::discover(&peripheral).await?;

        Ok(Self {
            adapter,
            name: name.to_string(),
            peripheral,
            button_char,
            led_char,
        })
    }

    async fn scan_and_connect(
        adapter: &Adapter,
        name: &str,
        scan_timeout: Duration,
    ) -> Result<Peripheral> {
        adapter
            .start_scan(ScanFilter {
                services: vec![LBS_SERVICE_UUID],
            })
            .await?;
        let found = Self::find_device_by_name(adapter, name, scan_timeout).await;
        adapter.stop_scan().await?;

        let peripheral = found?;
        peripheral.connect().await?;
        Ok(peripheral)
    }

    /// Find a device by name within the scan timeout.
    async fn find_device_by_name(
        adapter: &Adapter,
        name: &str,
        scan_timeout: Duration,
    ) -> Result<Peripheral> {
        let start = std::time::Instant::now();

        while start.elapsed() < scan_timeout {
            let peripherals = adapter.peripherals().await?;

            for peripheral in peripherals {
                if let Some(props) = peripheral.properties().await? {
                    if props.local_name.as_deref() == Some(name) {
                        return Ok(peripheral);
                    }
                }
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        Err(anyhow!("Device '{}' not found within timeout", name))
    }

    /// Discover the service and return the button and LED characteristics.
    async fn discover(peripheral: &Peripheral) -> Result<(Characteristic, Characteristic)> {
        peripheral.discover_services().await?;

        let services = peripheral.services();
        let service = services
            .iter()
            .find(|s| s.uuid == LBS_SERVICE_UUID)
            .ok_or_else(|| anyhow!("LED Button Service not found"))?;

        let find = |uuid: Uuid, what: &str| {
            service
                .characteristics
                .iter()
                .find(|c| c.uuid == uuid)
                .cloned()
                .ok_or_else(|| anyhow!("{} characteristic not found", what))
        };

        Ok((find(LBS_BUTTON_UUID, "Button")?, find(LBS_LED_UUID, "LED")?))
    }

    pub fn button_properties(&self) -> CharPropFlags {
        self.button_char.properties
    }

    pub fn led_properties(&self) -> CharPropFlags {
        self.led_char.properties
    }

    /// Write raw bytes to the LED characteristic.
    pub async fn write_led_raw(&self, data: &[u8]) -> Result<()> {
        self.peripheral
            .write(&self.led_char, data, WriteType::WithResponse)
            .await?;
        Ok(())
    }

    pub async fn set_led(&self, on: bool) -> Result<()> {
        self.write_led_raw(&[on as u8]).await
    }

    /// Read the raw button characteristic value.
    pub async fn read_button_raw(&self) -> Result<Vec<u8>> {
        Ok(self.peripheral.read(&self.button_char).await?)
    }

    pub async fn subscribe_button(&self) -> Result<()> {
        self.peripheral.subscribe(&self.button_char).await?;
        Ok(())
    }

    pub async fn unsubscribe_button(&self) -> Result<()> {
        self.peripheral.unsubscribe(&self.button_char).await?;
        Ok(())
    }

    /// Wait for the next button notification.
    pub async fn wait_for_button(&self, wait: Duration) -> Result<Option<Vec<u8>>> {
        let mut stream = self.peripheral.notifications().await?;
        let result = timeout(wait, async {
            while let Some(data) = stream.next().await {
                if data.uuid == LBS_BUTTON_UUID {
                    return Some(data.value);
                }
            }
            None
        })
        .await;

        Ok(result.unwrap_or(None))
    }

    pub async fn is_connected(&self) -> Result<bool> {
        Ok(self.peripheral.is_connected().await?)
    }

    /// Disconnect from the device.
    pub async fn disconnect(&self) -> Result<()> {
        self.peripheral.disconnect().await?;
        Ok(())
    }

    /// Disconnect, then find and connect to the device again.
    ///
    /// Succeeds only if the device resumed advertising after the link closed.
    pub async fn reconnect(&mut self, scan_timeout: Duration) -> Result<()> {
        self.disconnect().await?;

        let peripheral = Self::scan_and_connect(&self.adapter, &self.name, scan_timeout).await?;
        let (button_char, led_char) = Self::discover(&peripheral).await?;

        self.peripheral = peripheral;
        self.button_char = button_char;
        self.led_char = led_char;
        Ok(())
    }
}
