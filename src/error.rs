//! Error types for the tp25-ble crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// No matching thermometer was found during scanning.
    #[error("Thermometer not found: {identifier}")]
    DeviceNotFound {
        /// The name or address that was searched for.
        identifier: String,
    },

    /// Failed to establish a connection to the thermometer.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// Failed to subscribe to the data notification stream.
    #[error("Subscription failed: {reason}")]
    SubscriptionFailed {
        /// Description of why the subscription failed.
        reason: String,
    },

    /// Characteristic not found on the device.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// An operation did not complete within its time limit.
    #[error("Operation timed out after {seconds} seconds")]
    Timeout {
        /// The time limit that was exceeded.
        seconds: u64,
    },
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
