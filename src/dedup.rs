//! Duplicate-burst suppression.
//!
//! Physical transmitters repeat the same packet 3-5 times per burst to
//! survive collisions. A single shared slot remembers the fingerprint and
//! time of the last accepted decode - of any protocol, most recent wins -
//! and collapses a burst into one logical event.

use chrono::{DateTime, Duration, Utc};

/// Last-accepted-packet slot shared by all decoders in a dispatch cycle.
#[derive(Debug, Default)]
pub struct Dedup {
    fingerprint: Option<u32>,
    last_accept: Option<DateTime<Utc>>,
}

impl Dedup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report whether a packet is a burst repeat, recording it when fresh.
    ///
    /// A repeat requires all three: the capture layer saw the same raw signal
    /// twice (`hash_repeat`), the fingerprint equals the last accepted one,
    /// and the protocol's window has not elapsed. Anything else counts as a
    /// fresh packet and replaces the slot.
    pub fn check_and_update(
        &mut self,
        fingerprint: u32,
        hash_repeat: bool,
        window: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        let repeat = hash_repeat
            && self.fingerprint == Some(fingerprint)
            && self.last_accept.is_some_and(|last| now - last <= window);

        if !repeat {
            self.fingerprint = Some(fingerprint);
            self.last_accept = Some(now);
        }
        repeat
    }
}
