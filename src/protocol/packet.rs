//! Notification packet decoding.
//!
//! Parses the data notifications pushed by the thermometer into per-probe
//! temperature readings and a battery level.

/// Number of probe sockets on a TP25 unit.
///
/// Every decoded packet carries exactly this many readings, positionally
/// aligned to the physical probe index.
pub const NUM_PROBES: usize = 4;

/// Byte offset of the first probe pair in a data notification.
const PROBE_DATA_OFFSET: usize = 5;

/// Decode a 2-byte BCD value.
///
/// The four nibbles (high then low nibble of each byte) are read as decimal
/// digits, most significant first. Returns `None` if the slice is not exactly
/// two bytes or any nibble is not a decimal digit.
///
/// # Example
///
/// ```
/// use tp25_ble::protocol::decode_bcd_pair;
///
/// assert_eq!(decode_bcd_pair(&[0x02, 0x56]), Some(256));
/// assert_eq!(decode_bcd_pair(&[0x0A, 0x00]), None);
/// ```
pub fn decode_bcd_pair(pair: &[u8]) -> Option<u16> {
    let &[hi, lo] = pair else {
        return None;
    };

    let nibbles = [hi >> 4, hi & 0xF, lo >> 4, lo & 0xF];

    if nibbles.iter().any(|n| *n > 9) {
        return None;
    }

    Some(
        u16::from(nibbles[0]) * 1000
            + u16::from(nibbles[1]) * 100
            + u16::from(nibbles[2]) * 10
            + u16::from(nibbles[3]),
    )
}

/// Round a tenths-of-degree value to whole degrees, ties to even.
fn round_tenths(raw: u16) -> u16 {
    let whole = raw / 10;
    match raw % 10 {
        r if r > 5 => whole + 1,
        5 if whole % 2 == 1 => whole + 1,
        _ => whole,
    }
}

/// Decoded contents of a single data notification.
///
/// The thermometer reports tenths of a degree Celsius per probe in BCD; this
/// type carries the rounded whole-degree values. A probe slot is `None` when
/// no probe is plugged in (the device sends a zero value) or when its pair is
/// missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProbeReadings {
    /// Whole-degree Celsius readings, indexed by probe socket.
    pub temperatures: [Option<u16>; NUM_PROBES],
    /// Battery level byte, if the packet was long enough to carry one.
    pub battery: Option<u8>,
}

impl ProbeReadings {
    /// Get the reading for a probe socket in degrees Celsius.
    ///
    /// Returns `None` for an out-of-range index as well as for an empty
    /// socket.
    pub fn celsius(&self, probe: usize) -> Option<u16> {
        self.temperatures.get(probe).copied().flatten()
    }

    /// Get the reading for a probe socket in degrees Fahrenheit.
    pub fn fahrenheit(&self, probe: usize) -> Option<f64> {
        self.celsius(probe)
            .map(|c| f64::from(c) * 9.0 / 5.0 + 32.0)
    }

    /// Number of probe sockets currently reporting a temperature.
    pub fn connected_probes(&self) -> usize {
        self.temperatures.iter().filter(|t| t.is_some()).count()
    }
}

/// Decode a TP25 data notification.
///
/// Packet layout:
/// - Bytes 0-4: fixed header (not interpreted)
/// - Bytes 5..5+2*[`NUM_PROBES`]: one 2-byte BCD pair per probe, tenths of a
///   degree Celsius, zero meaning "no probe connected"
/// - Byte `len-3`: battery indicator
///
/// Decoding is total: short or malformed buffers degrade probe-by-probe to
/// absent readings and never panic.
pub fn decode_packet(data: &[u8]) -> ProbeReadings {
    let mut temperatures = [None; NUM_PROBES];
    let mut offset = PROBE_DATA_OFFSET;

    for slot in temperatures.iter_mut() {
        let pair = data.get(offset..offset + 2).unwrap_or(&[]);
        offset += 2;

        *slot = match decode_bcd_pair(pair) {
            // Zero is the "probe not connected" sentinel.
            None | Some(0) => None,
            Some(raw) => Some(round_tenths(raw)),
        };
    }

    let battery = if data.len() >= 3 {
        Some(data[data.len() - 3])
    } else {
        None
    };

    ProbeReadings {
        temperatures,
        battery,
    }
}
