//! Transmit-side pulse trains and the hardware line contract.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::Command;

/// One timed level on the output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pulse {
    /// Signal level (true = high, false = low)
    pub level: bool,
    /// Duration in microseconds
    pub duration_us: u32,
}

impl Pulse {
    pub fn new(level: bool, duration_us: u32) -> Self {
        Self { level, duration_us }
    }
}

/// The single digital output line driven during transmission.
///
/// Implementations toggle a pin and busy-wait with microsecond precision;
/// both calls are expected to be cheap and non-blocking beyond the delay
/// itself.
pub trait TxLine {
    fn set(&mut self, level: bool);
    fn delay_us(&mut self, micros: u32);
}

/// Play a complete pulse train on the line, leaving it low.
///
/// Blocking and atomic: the caller owns the radio for the full duration
/// (receive capture must be suspended) and there is no cancellation - once a
/// train starts it runs to completion. Reliability comes from the repeat
/// schedule baked into the train, never from feedback.
pub fn send(line: &mut dyn TxLine, pulses: &[Pulse]) {
    for pulse in pulses {
        line.set(pulse.level);
        line.delay_us(pulse.duration_us);
    }
    line.set(false);
}

/// Line implementation that records the driven pulses, for tests and
/// host-side inspection of transmit schedules.
#[derive(Debug, Default)]
pub struct RecordedLine {
    pub pulses: Vec<Pulse>,
    level: bool,
}

impl RecordedLine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TxLine for RecordedLine {
    fn set(&mut self, level: bool) {
        self.level = level;
    }

    fn delay_us(&mut self, micros: u32) {
        self.pulses.push(Pulse::new(self.level, micros));
    }
}

/// An outgoing command, already parsed by the textual command layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxRequest {
    /// Remote/device identifier.
    pub id: u32,
    /// Node or channel byte.
    pub node: u8,
    /// Symbolic command to send.
    pub command: Command,
}

/// Why an outgoing command was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    #[error("unknown protocol `{0}`")]
    UnknownProtocol(String),
    #[error("protocol does not support transmit")]
    TransmitUnsupported,
    #[error("command {0} cannot be transmitted by this protocol")]
    UnsupportedCommand(Command),
}
