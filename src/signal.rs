//! Raw pulse buffer handed over by the capture layer.

use serde::{Deserialize, Serialize};

/// A completed capture of alternating high/low pulse durations.
///
/// Durations are stored in units of `multiply` microseconds so the same
/// nominal protocol timings serve multiple sampling resolutions. Index 0 is
/// a partial lead-in measured while the receiver was still settling; decoders
/// read `pulses[1..number]` by convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSignal {
    /// Pulse durations in `multiply`-microsecond units.
    pub pulses: Vec<u16>,
    /// Number of valid entries, counting the index-0 lead-in. Decoders may
    /// zero this to mark the buffer consumed for the rest of the cycle.
    pub number: usize,
    /// Microseconds per duration unit. Must be at least 1.
    pub multiply: u32,
    /// Set by an accepting decoder to tell the capture layer not to hand the
    /// same burst back in again.
    pub repeats: bool,
    /// Capture-layer hash of this signal.
    pub hash: u32,
    /// Capture-layer hash of the previous signal.
    pub hash_previous: u32,
}

impl RawSignal {
    pub fn new(pulses: Vec<u16>, multiply: u32) -> Self {
        let number = pulses.len();
        Self {
            pulses,
            number,
            multiply,
            repeats: false,
            hash: 0,
            hash_previous: 0,
        }
    }

    /// True when the capture layer saw the same signal twice in a row.
    pub fn hash_repeat(&self) -> bool {
        self.hash == self.hash_previous
    }
}
