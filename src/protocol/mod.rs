//! Protocol module for the TP25 wire format.
//!
//! This module contains the implementations for:
//! - Data notification packet decoding
//! - Handshake command frames

pub mod handshake;
pub mod packet;

pub use handshake::{HANDSHAKE_COMMANDS, HANDSHAKE_PACING};
pub use packet::{decode_bcd_pair, decode_packet, ProbeReadings, NUM_PROBES};
