//! Handshake command frames.
//!
//! The TP25 only starts streaming temperature notifications after a fixed
//! sequence of setup commands has been written to the command characteristic.
//! The frames are opaque protocol configuration captured from the vendor app;
//! each one carries an opcode, a payload, and a trailing additive checksum.

use std::time::Duration;

/// Setup commands, written once per connection in this exact order.
pub const HANDSHAKE_COMMANDS: [&[u8]; 3] = [
    // Unlock the unit for third-party clients.
    &[0x01, 0x2F, 0x2F, 0x2F, 0x2F, 0x2F, 0x2F, 0x1B],
    // Select Celsius reporting.
    &[0x02, 0x01, 0x00, 0x00, 0x00, 0x03],
    // Enable realtime temperature notifications.
    &[0x0E, 0x01, 0x00, 0x00, 0x00, 0x0F],
];

/// Delay after each handshake write, giving the unit time to process the
/// command. The writes themselves are fire-and-forget; nothing is awaited
/// beyond this pause.
pub const HANDSHAKE_PACING: Duration = Duration::from_millis(50);
