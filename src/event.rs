//! Decoded events and the output sink contract.
//!
//! The core never formats strings: an accepted packet is a protocol name plus
//! an ordered list of typed fields, and the sink renders them into whatever
//! textual wire protocol the gateway speaks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remote-control command carried by a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Up,
    Down,
    Stop,
    Unknown,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Up => write!(f, "Up"),
            Command::Down => write!(f, "Down"),
            Command::Stop => write!(f, "Stop"),
            Command::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Temperature trend reported by some weather sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Stable,
    Up,
    Down,
    Unknown,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Stable => write!(f, "Stable"),
            Trend::Up => write!(f, "Up"),
            Trend::Down => write!(f, "Down"),
            Trend::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One typed field of a decoded packet, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    /// Identifier rendered with a fixed number of hex digits.
    Id { value: u32, digits: u8 },
    Channel(u8),
    Command(Command),
    /// Temperature in 0.1 degrees Celsius.
    TemperatureDeci(i16),
    /// Relative humidity in percent.
    Humidity(u8),
    WindSpeed(u16),
    WindDirection(u16),
    /// Rain in 0.1 millimetres.
    RainDeciMm(u16),
    /// True when the sender's battery is good.
    Battery(bool),
    Trend(Trend),
}

/// A validated packet, created fresh per decode attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedPacket {
    pub protocol: String,
    pub received: DateTime<Utc>,
    pub fields: Vec<Field>,
}

impl DecodedPacket {
    pub fn new(protocol: &str, received: DateTime<Utc>, fields: Vec<Field>) -> Self {
        Self {
            protocol: protocol.to_string(),
            received,
            fields,
        }
    }
}

/// Ordered rendering calls for one event record.
///
/// Dispatch drives the sequence begin, name, field(s), end exactly once per
/// accepted packet.
pub trait EventSink {
    fn begin(&mut self);
    fn name(&mut self, protocol: &str);
    fn field(&mut self, field: &Field);
    fn end(&mut self);
}

/// Walk a packet through the sink call sequence.
pub fn emit(sink: &mut dyn EventSink, packet: &DecodedPacket) {
    sink.begin();
    sink.name(&packet.protocol);
    for field in &packet.fields {
        sink.field(field);
    }
    sink.end();
}

/// Sink that collects records in memory, for tests and buffered outer layers.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<(String, Vec<Field>)>,
    current: Option<(String, Vec<Field>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for MemorySink {
    fn begin(&mut self) {
        self.current = Some((String::new(), Vec::new()));
    }

    fn name(&mut self, protocol: &str) {
        if let Some((name, _)) = self.current.as_mut() {
            *name = protocol.to_string();
        }
    }

    fn field(&mut self, field: &Field) {
        if let Some((_, fields)) = self.current.as_mut() {
            fields.push(*field);
        }
    }

    fn end(&mut self) {
        if let Some(record) = self.current.take() {
            self.records.push(record);
        }
    }
}
