//! BLE communication module.
//!
//! This module provides low-level Bluetooth Low Energy functionality
//! for discovering and communicating with TP25 thermometers.

pub mod scanner;
pub mod transport;
pub mod uuids;

pub use scanner::Tp25Scanner;
pub use transport::{BtleplugTransport, NotificationHandler, Transport};
pub use uuids::*;
