//! RFGate - 433 MHz OOK gateway codec.
//!
//! Turns raw on/off-keyed pulse trains captured by a 433 MHz receiver into
//! structured sensor and remote-control events, and turns structured commands
//! back into hardware-timed pulse trains for transmission.
//!
//! The capture mechanism, the textual output formatting, and the command
//! parsing all live outside this crate: decoding starts from a completed
//! [`RawSignal`] buffer and ends at an [`EventSink`]; transmission starts
//! from a [`TxRequest`] and ends at a [`TxLine`]. In between sit the pieces
//! that do the real work - tolerance-band pulse classification, the generic
//! PWM bit decoder, per-protocol packet validation with checksum/parity and
//! multi-format disambiguation, duplicate-burst suppression, and
//! microsecond-exact transmit encoders.
//!
//! Everything is synchronous and single-threaded by design: decoders are
//! bounded pure functions over the pulse buffer, and a transmit occupies the
//! caller until the last pulse is sent. The surrounding scheduler must keep
//! receive capture suspended while transmitting.

pub mod bitfield;
pub mod dedup;
pub mod event;
pub mod protocols;
pub mod pulse;
pub mod pwm;
pub mod signal;
pub mod tx;

pub use dedup::Dedup;
pub use event::{Command, DecodedPacket, EventSink, Field, MemorySink, Trend};
pub use protocols::{Decode, DecodeContext, Protocol, ProtocolRegistry, QuietReason};
pub use signal::RawSignal;
pub use tx::{Pulse, RecordedLine, TxError, TxLine, TxRequest};
