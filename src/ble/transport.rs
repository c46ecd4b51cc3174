//! Transport abstraction over the BLE link.
//!
//! The session only needs a handful of primitives from the underlying stack:
//! connect, write, subscribe, disconnect. They are collected in the
//! [`Transport`] trait so the state machine can be driven against a fake link
//! in tests, with [`BtleplugTransport`] as the production implementation.

use async_trait::async_trait;
use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use futures::stream::StreamExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Handler invoked with the raw bytes of each incoming data notification.
pub type NotificationHandler = Box<dyn Fn(Vec<u8>) + Send + Sync>;

/// Primitive operations the session requires from the BLE link.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish the link, failing if it cannot be brought up within
    /// `timeout`.
    async fn connect(&self, timeout: Duration) -> Result<()>;

    /// Write `payload` to the characteristic identified by `uuid`.
    async fn write_characteristic(
        &self,
        uuid: Uuid,
        payload: &[u8],
        with_response: bool,
    ) -> Result<()>;

    /// Subscribe to notifications from `uuid`, delivering each value to
    /// `handler`. The handler may be invoked from an arbitrary task.
    async fn subscribe_notifications(&self, uuid: Uuid, handler: NotificationHandler)
        -> Result<()>;

    /// Tear down the link.
    async fn disconnect(&self) -> Result<()>;

    /// Whether the link currently reports itself connected.
    async fn is_connected(&self) -> bool;
}

/// Production [`Transport`] backed by a btleplug peripheral.
pub struct BtleplugTransport {
    /// The peripheral to communicate with.
    peripheral: Peripheral,
    /// Cached characteristics by UUID, populated on connect.
    characteristics: Arc<RwLock<HashMap<Uuid, Characteristic>>>,
    /// Handle to the notification pump task.
    listener_handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl BtleplugTransport {
    /// Create a transport for a discovered peripheral.
    pub fn new(peripheral: Peripheral) -> Self {
        Self {
            peripheral,
            characteristics: Arc::new(RwLock::new(HashMap::new())),
            listener_handle: Arc::new(RwLock::new(None)),
        }
    }

    /// Get the underlying peripheral.
    pub fn peripheral(&self) -> &Peripheral {
        &self.peripheral
    }

    /// Look up a cached characteristic.
    fn characteristic(&self, uuid: &Uuid) -> Result<Characteristic> {
        self.characteristics
            .read()
            .get(uuid)
            .cloned()
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: uuid.to_string(),
            })
    }

    /// Discover services and cache every characteristic found.
    async fn cache_characteristics(&self) -> Result<()> {
        self.peripheral
            .discover_services()
            .await
            .map_err(Error::Bluetooth)?;

        let mut chars = self.characteristics.write();
        chars.clear();

        for service in self.peripheral.services() {
            for characteristic in service.characteristics {
                trace!(
                    "Found characteristic {} in service {}",
                    characteristic.uuid,
                    service.uuid
                );
                chars.insert(characteristic.uuid, characteristic);
            }
        }

        debug!("Discovered {} characteristics", chars.len());

        Ok(())
    }

    /// Stop the notification pump, if one is running.
    fn stop_listener(&self) {
        if let Some(handle) = self.listener_handle.write().take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl Transport for BtleplugTransport {
    async fn connect(&self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.peripheral.connect()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(Error::Bluetooth(e)),
            Err(_) => {
                return Err(Error::Timeout {
                    seconds: timeout.as_secs(),
                })
            }
        }

        self.cache_characteristics().await
    }

    async fn write_characteristic(
        &self,
        uuid: Uuid,
        payload: &[u8],
        with_response: bool,
    ) -> Result<()> {
        let characteristic = self.characteristic(&uuid)?;

        let write_type = if with_response {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };

        self.peripheral
            .write(&characteristic, payload, write_type)
            .await
            .map_err(Error::Bluetooth)?;

        trace!("Wrote {} bytes to characteristic {}", payload.len(), uuid);

        Ok(())
    }

    async fn subscribe_notifications(
        &self,
        uuid: Uuid,
        handler: NotificationHandler,
    ) -> Result<()> {
        let characteristic = self.characteristic(&uuid)?;

        self.peripheral
            .subscribe(&characteristic)
            .await
            .map_err(Error::Bluetooth)?;

        let mut notifications = self
            .peripheral
            .notifications()
            .await
            .map_err(Error::Bluetooth)?;

        // Replace any pump left over from a previous subscription.
        self.stop_listener();

        let handle = tokio::spawn(async move {
            debug!("Notification pump started for {}", uuid);

            while let Some(notification) = notifications.next().await {
                if notification.uuid != uuid {
                    continue;
                }

                trace!(
                    "Notification from {}: {} bytes",
                    notification.uuid,
                    notification.value.len()
                );

                handler(notification.value);
            }

            debug!("Notification pump for {} ended", uuid);
        });

        *self.listener_handle.write() = Some(handle);

        debug!("Subscribed to notifications from {}", uuid);

        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.stop_listener();

        if let Err(e) = self.peripheral.disconnect().await {
            warn!("Failed to disconnect cleanly: {}", e);
            return Err(Error::Bluetooth(e));
        }

        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }
}

impl Drop for BtleplugTransport {
    fn drop(&mut self) {
        self.stop_listener();
    }
}
