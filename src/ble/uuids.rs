//! BLE Service and Characteristic UUIDs.
//!
//! Contains the UUID constants used for TP25 thermometer communication.

use uuid::Uuid;

// Device Information Service (Standard BLE)
/// Standard BLE Device Information Service UUID.
pub const DEVICE_INFO_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_180a_0000_1000_8000_00805f9b34fb);

// TP25 vendor service
/// TP25 primary service UUID.
pub const TP25_SERVICE_UUID: Uuid = Uuid::from_u128(0x1086_fff0_3343_4817_8bb2_b32206336ce8);
/// Command characteristic UUID (write without response).
pub const CMD_CHAR_UUID: Uuid = Uuid::from_u128(0x1086_fff1_3343_4817_8bb2_b32206336ce8);
/// Data characteristic UUID (notifications from the thermometer).
pub const DATA_CHAR_UUID: Uuid = Uuid::from_u128(0x1086_fff2_3343_4817_8bb2_b32206336ce8);

/// Local name prefix advertised by TP25 units.
pub const DEVICE_NAME_PREFIX: &str = "TP25";

/// Check if a service UUID is the TP25 vendor service.
pub fn is_tp25_service(uuid: &Uuid) -> bool {
    *uuid == TP25_SERVICE_UUID
}
