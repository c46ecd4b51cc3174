// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # tp25-ble
//!
//! A cross-platform Rust library for reading ThermoPro TP25 four-probe
//! thermometers via Bluetooth Low Energy.
//!
//! The TP25 streams no data out of the box: a client has to write a fixed
//! vendor handshake to the command characteristic before the unit starts
//! pushing temperature notifications. This crate handles the full sequence
//! (discover, connect, handshake, subscribe) and decodes each notification
//! into per-probe whole-degree readings plus a battery level.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tp25_ble::{Result, Tp25Client, Tp25Scanner};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Find the nearest advertising TP25
//!     let scanner = Tp25Scanner::new().await?;
//!     let peripheral = scanner.find_first(Duration::from_secs(10)).await?;
//!
//!     // Connect and stream readings
//!     let client = Tp25Client::new(peripheral);
//!     client.set_callback(|readings| {
//!         for (probe, temp) in readings.temperatures.iter().enumerate() {
//!             match temp {
//!                 Some(celsius) => println!("Probe {}: {}°C", probe + 1, celsius),
//!                 None => println!("Probe {}: not connected", probe + 1),
//!             }
//!         }
//!     });
//!     client.connect().await?;
//!
//!     tokio::time::sleep(Duration::from_secs(30)).await;
//!
//!     client.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod client;
pub mod error;
pub mod protocol;

// Re-exports for convenience
pub use client::{ReadingCallback, SessionState, Tp25Client, CONNECT_TIMEOUT};
pub use error::{Error, Result};
pub use protocol::{decode_packet, ProbeReadings, NUM_PROBES};

// Re-export commonly used types from submodules
pub use ble::scanner::Tp25Scanner;
pub use ble::transport::{BtleplugTransport, NotificationHandler, Transport};
pub use ble::uuids::{CMD_CHAR_UUID, DATA_CHAR_UUID, TP25_SERVICE_UUID};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that key types are exported
        let _ = std::any::TypeId::of::<Error>();
        let _ = std::any::TypeId::of::<ProbeReadings>();
        let _ = std::any::TypeId::of::<SessionState>();
    }

    #[test]
    fn test_probe_count_matches_packet_layout() {
        // Four probes means eight BCD payload bytes after the header.
        assert_eq!(NUM_PROBES, 4);
    }
}
