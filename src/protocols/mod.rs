//! Protocol decoders and encoders for 433 MHz remotes and weather sensors.
//!
//! Each protocol owns its packet layout, sanity checks, integrity rule, and
//! transmit timing. Decoders are pure predicates over a completed pulse
//! buffer: rejection is the cheap, expected outcome (most packets on the air
//! belong to some other protocol) and dispatch simply tries the next decoder.
//!
//! Dispatch order is part of the observable contract - two protocols with
//! overlapping pulse counts and timings shadow one another based on list
//! position. The default order tries remotes before weather sensors.

mod hyws77;
mod louvolite;
mod upm_esic;

pub use hyws77::HyWs77;
pub use louvolite::Louvolite;
pub use upm_esic::UpmEsic;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::dedup::Dedup;
use crate::event::{emit, DecodedPacket, EventSink};
use crate::signal::RawSignal;
use crate::tx::{TxError, TxLine, TxRequest};

/// Outcome of one decode attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Decode {
    /// Structural, timing, or integrity mismatch: not this protocol.
    Rejected,
    /// A new packet was validated and is being emitted.
    Accepted(DecodedPacket),
    /// A valid packet that deliberately produces no event.
    Quiet(QuietReason),
}

/// Why a valid packet produced no event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuietReason {
    /// Burst repeat suppressed by the dedup slot.
    Repeat,
    /// An end-of-press code that only terminates a held button.
    EndOfPress,
}

/// Per-dispatch-cycle state threaded through every decoder call.
pub struct DecodeContext<'a> {
    /// Shared last-accepted-packet slot.
    pub dedup: &'a mut Dedup,
    /// Wall-clock time of this cycle.
    pub now: DateTime<Utc>,
}

/// One supported radio protocol.
pub trait Protocol: Send + Sync {
    /// Protocol name, also used for transmit lookup.
    fn name(&self) -> &'static str;

    /// Try to decode the raw buffer. Decoders read `signal.pulses[1..number]`
    /// and on acceptance set `repeats` (and for some protocols zero `number`)
    /// to mark the buffer consumed.
    fn decode(&self, signal: &mut RawSignal, ctx: &mut DecodeContext<'_>) -> Decode;

    /// Whether this protocol can transmit.
    fn supports_transmit(&self) -> bool {
        false
    }

    /// Build the frame for `request` and drive the line with exact timings.
    /// Blocking for the full pulse train.
    fn transmit(&self, _line: &mut dyn TxLine, _request: &TxRequest) -> Result<(), TxError> {
        Err(TxError::TransmitUnsupported)
    }
}

/// Ordered registry of protocols; first acceptance wins.
pub struct ProtocolRegistry {
    protocols: Vec<Box<dyn Protocol>>,
}

impl ProtocolRegistry {
    /// Registry with the built-in protocols in default priority order.
    pub fn new() -> Self {
        Self::with_protocols(vec![
            Box::new(Louvolite::new()),
            Box::new(UpmEsic::new()),
            Box::new(HyWs77::new()),
        ])
    }

    /// Registry with an explicit priority order.
    pub fn with_protocols(protocols: Vec<Box<dyn Protocol>>) -> Self {
        Self { protocols }
    }

    /// Try protocols in order until one claims the signal, emitting accepted
    /// packets to the sink. Returns `Rejected` when nothing matched.
    pub fn dispatch(
        &self,
        signal: &mut RawSignal,
        ctx: &mut DecodeContext<'_>,
        sink: &mut dyn EventSink,
    ) -> Decode {
        for protocol in &self.protocols {
            match protocol.decode(signal, ctx) {
                Decode::Rejected => continue,
                Decode::Accepted(packet) => {
                    debug!(protocol = packet.protocol.as_str(), "packet accepted");
                    emit(sink, &packet);
                    return Decode::Accepted(packet);
                }
                Decode::Quiet(reason) => {
                    debug!(protocol = protocol.name(), ?reason, "packet matched, no event");
                    return Decode::Quiet(reason);
                }
            }
        }
        trace!(pulses = signal.number, "no protocol claimed the signal");
        Decode::Rejected
    }

    /// Look up a protocol by name, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&dyn Protocol> {
        self.protocols
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .map(|p| p.as_ref())
    }

    /// All protocol names in priority order.
    pub fn names(&self) -> Vec<&'static str> {
        self.protocols.iter().map(|p| p.name()).collect()
    }

    /// Transmit a command through the named protocol.
    pub fn transmit(
        &self,
        protocol: &str,
        line: &mut dyn TxLine,
        request: &TxRequest,
    ) -> Result<(), TxError> {
        let protocol = self
            .get(protocol)
            .ok_or_else(|| TxError::UnknownProtocol(protocol.to_string()))?;
        protocol.transmit(line, request)
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
