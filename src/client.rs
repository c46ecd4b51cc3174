//! Connection session for a TP25 thermometer.
//!
//! Drives the connect → handshake → subscribe sequence and dispatches each
//! decoded notification to the caller's callback.

use btleplug::platform::Peripheral;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::ble::transport::{BtleplugTransport, NotificationHandler, Transport};
use crate::ble::uuids::{CMD_CHAR_UUID, DATA_CHAR_UUID};
use crate::error::{Error, Result};
use crate::protocol::{decode_packet, ProbeReadings, HANDSHAKE_COMMANDS, HANDSHAKE_PACING};

/// Time allowed for the transport to bring the link up.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Callback invoked with each decoded notification.
pub type ReadingCallback = Arc<dyn Fn(&ProbeReadings) + Send + Sync>;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionState {
    /// Not connected to the thermometer.
    #[default]
    Disconnected,
    /// Waiting for the transport to bring the link up.
    Connecting,
    /// Link is up, setup commands are being written.
    Handshaking,
    /// Handshake done and notification stream established.
    Subscribed,
}

impl SessionState {
    /// Check if the notification stream is established.
    pub fn is_subscribed(&self) -> bool {
        matches!(self, Self::Subscribed)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Handshaking => write!(f, "Handshaking"),
            Self::Subscribed => write!(f, "Subscribed"),
        }
    }
}

/// Session with a single TP25 thermometer.
///
/// Owns the transport and a single callback slot. There is no internal retry
/// or reconnect loop; when the link drops, reconnection policy is the
/// caller's.
pub struct Tp25Client<T: Transport = BtleplugTransport> {
    /// The BLE link.
    transport: T,
    /// Current lifecycle state.
    state: RwLock<SessionState>,
    /// The reading-delivery callback. Shared with the notification handler,
    /// which clones the current value out under the lock before invoking it.
    callback: Arc<RwLock<Option<ReadingCallback>>>,
}

impl Tp25Client<BtleplugTransport> {
    /// Create a session for a discovered peripheral.
    pub fn new(peripheral: Peripheral) -> Self {
        Self::with_transport(BtleplugTransport::new(peripheral))
    }
}

impl<T: Transport> Tp25Client<T> {
    /// Create a session over an arbitrary transport.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            state: RwLock::new(SessionState::Disconnected),
            callback: Arc::new(RwLock::new(None)),
        }
    }

    /// Get the current session state.
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Get the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Install the reading callback, replacing any previous one.
    ///
    /// Last write wins: a notification already mid-delivery may still reach
    /// the old callback, the next one only reaches the new. Past readings are
    /// never queued or replayed.
    pub fn set_callback(&self, callback: impl Fn(&ProbeReadings) + Send + Sync + 'static) {
        *self.callback.write() = Some(Arc::new(callback));
    }

    /// Remove the reading callback. Subsequent readings are dropped.
    pub fn clear_callback(&self) {
        *self.callback.write() = None;
    }

    /// Connect, run the handshake, and subscribe to temperature
    /// notifications.
    ///
    /// Returns once the notification stream is established. There is no
    /// automatic retry; on any failure the session is back in
    /// [`SessionState::Disconnected`] and the error names the cause.
    ///
    /// # Errors
    ///
    /// [`Error::ConnectionFailed`] if the link cannot be brought up within
    /// [`CONNECT_TIMEOUT`], [`Error::SubscriptionFailed`] if the notification
    /// stream cannot be established. Individual handshake write failures are
    /// not errors; the unit tolerates missed setup commands.
    pub async fn connect(&self) -> Result<()> {
        self.set_state(SessionState::Connecting);

        if let Err(e) = self.transport.connect(CONNECT_TIMEOUT).await {
            self.set_state(SessionState::Disconnected);
            return Err(Error::ConnectionFailed {
                reason: e.to_string(),
            });
        }

        info!("Link up, sending handshake");
        self.set_state(SessionState::Handshaking);

        for (index, command) in HANDSHAKE_COMMANDS.iter().enumerate() {
            if let Err(e) = self
                .transport
                .write_characteristic(CMD_CHAR_UUID, command, false)
                .await
            {
                // Swallowed on purpose; the remaining commands still go out.
                debug!("Handshake write {} failed: {}", index, e);
            }

            // Give the unit time to process before the next command.
            tokio::time::sleep(HANDSHAKE_PACING).await;
        }

        let callback = Arc::clone(&self.callback);
        let handler: NotificationHandler = Box::new(move |data| {
            let readings = decode_packet(&data);

            // Clone the slot's current value out under the lock and invoke
            // outside it, so a concurrent set_callback neither blocks nor is
            // half-observed.
            let current = callback.read().clone();
            match current {
                Some(cb) => cb(&readings),
                None => trace!("No callback installed, dropping reading"),
            }
        });

        if let Err(e) = self
            .transport
            .subscribe_notifications(DATA_CHAR_UUID, handler)
            .await
        {
            self.set_state(SessionState::Disconnected);
            return Err(Error::SubscriptionFailed {
                reason: e.to_string(),
            });
        }

        self.set_state(SessionState::Subscribed);
        info!("Subscribed to temperature notifications");

        Ok(())
    }

    /// Disconnect from the thermometer.
    ///
    /// A no-op when the transport does not report itself connected, so it is
    /// safe to call repeatedly.
    pub async fn disconnect(&self) -> Result<()> {
        if !self.transport.is_connected().await {
            debug!("Not connected, nothing to disconnect");
            return Ok(());
        }

        let result = self.transport.disconnect().await;
        self.set_state(SessionState::Disconnected);
        result
    }

    /// Update the session state.
    fn set_state(&self, new_state: SessionState) {
        let mut state = self.state.write();
        if *state != new_state {
            debug!("Session state changed: {} -> {}", *state, new_state);
            *state = new_state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use uuid::Uuid;

    /// Scripted transport for driving the session without a radio.
    #[derive(Default)]
    struct FakeLinkInner {
        fail_connect: bool,
        fail_writes: bool,
        fail_subscribe: bool,
        connected: bool,
        writes: Vec<(Uuid, Vec<u8>, bool)>,
        subscriptions: Vec<Uuid>,
        handler: Option<NotificationHandler>,
        disconnects: usize,
    }

    #[derive(Clone, Default)]
    struct FakeLink {
        inner: Arc<Mutex<FakeLinkInner>>,
    }

    impl FakeLink {
        fn failing_connect() -> Self {
            let link = Self::default();
            link.inner.lock().fail_connect = true;
            link
        }

        fn failing_writes() -> Self {
            let link = Self::default();
            link.inner.lock().fail_writes = true;
            link
        }

        fn failing_subscribe() -> Self {
            let link = Self::default();
            link.inner.lock().fail_subscribe = true;
            link
        }

        /// Push a notification through the registered handler.
        fn emit(&self, data: &[u8]) {
            let inner = self.inner.lock();
            if let Some(handler) = &inner.handler {
                handler(data.to_vec());
            }
        }

        fn writes(&self) -> Vec<(Uuid, Vec<u8>, bool)> {
            self.inner.lock().writes.clone()
        }

        fn subscriptions(&self) -> Vec<Uuid> {
            self.inner.lock().subscriptions.clone()
        }

        fn disconnects(&self) -> usize {
            self.inner.lock().disconnects
        }
    }

    #[async_trait]
    impl Transport for FakeLink {
        async fn connect(&self, _timeout: Duration) -> Result<()> {
            let mut inner = self.inner.lock();
            if inner.fail_connect {
                return Err(Error::BluetoothUnavailable);
            }
            inner.connected = true;
            Ok(())
        }

        async fn write_characteristic(
            &self,
            uuid: Uuid,
            payload: &[u8],
            with_response: bool,
        ) -> Result<()> {
            let mut inner = self.inner.lock();
            inner.writes.push((uuid, payload.to_vec(), with_response));
            if inner.fail_writes {
                return Err(Error::CharacteristicNotFound {
                    uuid: uuid.to_string(),
                });
            }
            Ok(())
        }

        async fn subscribe_notifications(
            &self,
            uuid: Uuid,
            handler: NotificationHandler,
        ) -> Result<()> {
            let mut inner = self.inner.lock();
            if inner.fail_subscribe {
                return Err(Error::CharacteristicNotFound {
                    uuid: uuid.to_string(),
                });
            }
            inner.subscriptions.push(uuid);
            inner.handler = Some(handler);
            Ok(())
        }

        async fn disconnect(&self) -> Result<()> {
            let mut inner = self.inner.lock();
            inner.connected = false;
            inner.disconnects += 1;
            Ok(())
        }

        async fn is_connected(&self) -> bool {
            self.inner.lock().connected
        }
    }

    /// A packet reading 26°C on probe 0 with the rest empty.
    fn sample_packet(battery: u8) -> Vec<u8> {
        vec![
            0x55, 0x01, 0x00, 0x00, 0x00, // header
            0x02, 0x56, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // probe pairs
            battery, 0x00, 0x00,
        ]
    }

    fn collecting_callback() -> (Arc<Mutex<Vec<ProbeReadings>>>, impl Fn(&ProbeReadings)) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |readings: &ProbeReadings| {
            sink.lock().push(readings.clone())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failure_leaves_disconnected() {
        let link = FakeLink::failing_connect();
        let client = Tp25Client::with_transport(link.clone());

        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, Error::ConnectionFailed { .. }));

        assert_eq!(client.state(), SessionState::Disconnected);
        assert!(link.writes().is_empty());
        assert!(link.subscriptions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_runs_handshake_in_order() {
        let link = FakeLink::default();
        let client = Tp25Client::with_transport(link.clone());

        client.connect().await.unwrap();

        let writes = link.writes();
        assert_eq!(writes.len(), HANDSHAKE_COMMANDS.len());
        for (write, expected) in writes.iter().zip(HANDSHAKE_COMMANDS) {
            assert_eq!(write.0, CMD_CHAR_UUID);
            assert_eq!(write.1, expected);
            assert!(!write.2, "handshake writes must not request a response");
        }

        assert_eq!(link.subscriptions(), vec![DATA_CHAR_UUID]);
        assert_eq!(client.state(), SessionState::Subscribed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handshake_write_failures_are_swallowed() {
        let link = FakeLink::failing_writes();
        let client = Tp25Client::with_transport(link.clone());

        client.connect().await.unwrap();

        // Every command was still attempted and the subscription went ahead.
        assert_eq!(link.writes().len(), HANDSHAKE_COMMANDS.len());
        assert_eq!(link.subscriptions(), vec![DATA_CHAR_UUID]);
        assert_eq!(client.state(), SessionState::Subscribed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscription_failure_fails_connect() {
        let link = FakeLink::failing_subscribe();
        let client = Tp25Client::with_transport(link.clone());

        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, Error::SubscriptionFailed { .. }));
        assert_eq!(client.state(), SessionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notifications_reach_callback() {
        let link = FakeLink::default();
        let client = Tp25Client::with_transport(link.clone());

        let (seen, callback) = collecting_callback();
        client.set_callback(callback);
        client.connect().await.unwrap();

        link.emit(&sample_packet(0x64));

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].temperatures, [Some(26), None, None, None]);
        assert_eq!(seen[0].battery, Some(0x64));
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_replacement_last_write_wins() {
        let link = FakeLink::default();
        let client = Tp25Client::with_transport(link.clone());

        let (first_seen, first) = collecting_callback();
        let (second_seen, second) = collecting_callback();

        client.set_callback(first);
        client.connect().await.unwrap();
        link.emit(&sample_packet(0x64));

        client.set_callback(second);
        link.emit(&sample_packet(0x63));

        // Each delivery reached exactly the callback installed at the time.
        assert_eq!(first_seen.lock().len(), 1);
        assert_eq!(second_seen.lock().len(), 1);
        assert_eq!(second_seen.lock()[0].battery, Some(0x63));
    }

    #[tokio::test(start_paused = true)]
    async fn test_readings_dropped_without_callback() {
        let link = FakeLink::default();
        let client = Tp25Client::with_transport(link.clone());

        client.connect().await.unwrap();
        link.emit(&sample_packet(0x64));

        let (seen, callback) = collecting_callback();
        client.set_callback(callback);
        link.emit(&sample_packet(0x63));

        client.clear_callback();
        link.emit(&sample_packet(0x62));

        // Only the delivery made while a callback was installed survives.
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].battery, Some(0x63));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_is_idempotent() {
        let link = FakeLink::default();
        let client = Tp25Client::with_transport(link.clone());

        // Not connected yet: a no-op, not an error.
        client.disconnect().await.unwrap();
        assert_eq!(link.disconnects(), 0);

        client.connect().await.unwrap();
        client.disconnect().await.unwrap();
        assert_eq!(link.disconnects(), 1);
        assert_eq!(client.state(), SessionState::Disconnected);

        client.disconnect().await.unwrap();
        assert_eq!(link.disconnects(), 1);
    }

    #[test]
    fn test_session_state() {
        assert!(SessionState::Subscribed.is_subscribed());
        assert!(!SessionState::Handshaking.is_subscribed());
        assert_eq!(SessionState::default(), SessionState::Disconnected);
        assert_eq!(format!("{}", SessionState::Connecting), "Connecting");
    }
}
