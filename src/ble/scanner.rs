//! BLE scanning functionality.
//!
//! btleplug can only connect to peripherals it has seen in a scan, so even
//! callers that already know their thermometer's address go through the
//! scanner to resolve a [`Peripheral`] handle.

use btleplug::api::{
    Central, CentralEvent, Manager as _, Peripheral as _, PeripheralProperties, ScanFilter,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::StreamExt;
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::ble::uuids::DEVICE_NAME_PREFIX;
use crate::error::{Error, Result};

/// Scanner that resolves TP25 peripherals from BLE advertisements.
pub struct Tp25Scanner {
    /// The BLE adapter to scan with.
    adapter: Adapter,
}

impl Tp25Scanner {
    /// Create a scanner on the first available Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self { adapter })
    }

    /// Create a scanner on a specific adapter.
    pub fn with_adapter(adapter: Adapter) -> Self {
        Self { adapter }
    }

    /// Get the underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Scan until the first advertising TP25 is seen.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if no unit advertises within
    /// `timeout`.
    pub async fn find_first(&self, timeout: Duration) -> Result<Peripheral> {
        self.find_matching(timeout, "any TP25", is_tp25_advertisement)
            .await
    }

    /// Scan until the unit with the given Bluetooth address is seen.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if that address does not advertise
    /// within `timeout`.
    pub async fn find_by_address(&self, address: &str, timeout: Duration) -> Result<Peripheral> {
        self.find_matching(timeout, address, |props| matches_address(props, address))
            .await
    }

    /// Scan until a peripheral whose advertisement satisfies `matches` is
    /// seen, then stop scanning and hand it back.
    async fn find_matching(
        &self,
        timeout: Duration,
        identifier: &str,
        matches: impl Fn(&PeripheralProperties) -> bool,
    ) -> Result<Peripheral> {
        let mut events = self.adapter.events().await.map_err(Error::Bluetooth)?;

        info!("Scanning for {}", identifier);

        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;

        let search = async {
            while let Some(event) = events.next().await {
                let id = match event {
                    CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                    _ => continue,
                };

                trace!("Advertisement from {:?}", id);

                let Ok(peripheral) = self.adapter.peripheral(&id).await else {
                    continue;
                };
                let Ok(Some(properties)) = peripheral.properties().await else {
                    continue;
                };

                if matches(&properties) {
                    debug!(
                        "Matched {} ({:?}, rssi {:?})",
                        properties.address, properties.local_name, properties.rssi
                    );
                    return Some(peripheral);
                }
            }

            None
        };

        let found = tokio::time::timeout(timeout, search).await;

        // Stop the radio regardless of the outcome.
        let _ = self.adapter.stop_scan().await;

        match found {
            Ok(Some(peripheral)) => Ok(peripheral),
            _ => Err(Error::DeviceNotFound {
                identifier: identifier.to_string(),
            }),
        }
    }
}

/// Whether an advertisement looks like a TP25 unit.
fn is_tp25_advertisement(properties: &PeripheralProperties) -> bool {
    properties
        .local_name
        .as_deref()
        .map(|name| name.starts_with(DEVICE_NAME_PREFIX))
        .unwrap_or(false)
}

/// Whether an advertisement comes from the given Bluetooth address.
fn matches_address(properties: &PeripheralProperties, address: &str) -> bool {
    properties.address.to_string().eq_ignore_ascii_case(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props_with_name(name: Option<&str>) -> PeripheralProperties {
        PeripheralProperties {
            local_name: name.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_tp25_advertisement() {
        assert!(is_tp25_advertisement(&props_with_name(Some("TP25"))));
        assert!(is_tp25_advertisement(&props_with_name(Some("TP25_0042"))));
        assert!(!is_tp25_advertisement(&props_with_name(Some("TP19"))));
        assert!(!is_tp25_advertisement(&props_with_name(None)));
    }

    #[test]
    fn test_matches_address_case_insensitive() {
        let props = PeripheralProperties {
            address: btleplug::api::BDAddr::from([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
            ..Default::default()
        };

        assert!(matches_address(&props, "AA:BB:CC:DD:EE:FF"));
        assert!(matches_address(&props, "aa:bb:cc:dd:ee:ff"));
        assert!(!matches_address(&props, "11:22:33:44:55:66"));
    }
}
