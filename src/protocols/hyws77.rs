//! Hyundai WS Senzor 77 / 77TH outdoor temperature(/humidity) sensors.
//!
//! Protocol characteristics:
//! - 74 pulses, 36 bits; a short high pulse starts every bit and the
//!   following low carries the value (short low = 0, long low = 1)
//! - the very first high pulse runs 70-80us longer than the rest
//! - fields: 8-bit system id (channel embedded), battery, temperature trend,
//!   12-bit wire-reversed signed temperature in 0.1C, 8-bit wire-reversed
//!   humidity stored as value - 100
//! - the last nibble looks like a checksum but its algorithm is unknown, so
//!   it is not validated
//! - units emit each reading four times; duplicates are suppressed on a
//!   reconstructed header/temperature/humidity word within a 600ms window

use chrono::Duration;
use tracing::debug;

use super::{Decode, DecodeContext, Protocol, QuietReason};
use crate::bitfield::BitField;
use crate::event::{DecodedPacket, Field, Trend};
use crate::pulse::Band;
use crate::signal::RawSignal;

const PULSECOUNT: usize = 74;

const HIGH_MIN: u32 = 480;
const HIGH_MAX: u32 = 580;
const FIRST_HIGH_MIN: u32 = 560;
const FIRST_HIGH_MAX: u32 = 640;
const LOW_SHORT_MIN: u32 = 1800;
const LOW_SHORT_MAX: u32 = 2100;
const LOW_LONG_MIN: u32 = 3800;
const LOW_LONG_MAX: u32 = 4200;

const REPEAT_WINDOW_MS: i64 = 600;

const DEVICE_ID: BitField = BitField::new(28, 8);
const CHANNEL: BitField = BitField::new(30, 2);
const BATTERY_LOW: BitField = BitField::new(27, 1);
const TREND: BitField = BitField::new(25, 2);
const TEMPERATURE: BitField = BitField::new(12, 12).reversed().signed();
const TEMPERATURE_RAW: BitField = BitField::new(12, 12).reversed();
const HUMIDITY: BitField = BitField::new(4, 8).reversed();

/// Hyundai WS Senzor 77(TH) decoder.
pub struct HyWs77;

impl HyWs77 {
    pub fn new() -> Self {
        Self
    }
}

impl Protocol for HyWs77 {
    fn name(&self) -> &'static str {
        "HyWS77TH"
    }

    fn decode(&self, signal: &mut RawSignal, ctx: &mut DecodeContext<'_>) -> Decode {
        if signal.number != PULSECOUNT {
            return Decode::Rejected;
        }

        let multiply = signal.multiply;
        let high = Band::from_range(HIGH_MIN, HIGH_MAX, multiply);
        let first_high = Band::from_range(FIRST_HIGH_MIN, FIRST_HIGH_MAX, multiply);
        let low_short = Band::from_range(LOW_SHORT_MIN, LOW_SHORT_MAX, multiply);
        let low_long = Band::from_range(LOW_LONG_MIN, LOW_LONG_MAX, multiply);

        if !first_high.contains(signal.pulses[1]) {
            return Decode::Rejected;
        }

        let mut word: u64 = 0;
        for i in (2..signal.number).step_by(2) {
            let low = signal.pulses[i];
            if !low_short.contains(low) && !low_long.contains(low) {
                return Decode::Rejected;
            }
            if !high.contains(signal.pulses[i + 1]) {
                return Decode::Rejected;
            }
            word = word << 1 | u64::from(low_long.contains(low));
        }

        let header = (word >> 24) as u32 & 0xFFF;
        let id = DEVICE_ID.extract(word) as u32;
        let channel = CHANNEL.extract(word) as u8;
        let battery_low = BATTERY_LOW.extract(word) != 0;
        let trend = match TREND.extract(word) {
            0 => Trend::Stable,
            1 => Trend::Up,
            2 => Trend::Down,
            _ => Trend::Unknown,
        };
        let temperature = TEMPERATURE.extract(word) as i16;
        let humidity = (HUMIDITY.extract(word) as u8).wrapping_add(100);
        // trailing checksum nibble skipped: algorithm unknown

        let fingerprint =
            header << 20 | (TEMPERATURE_RAW.extract(word) as u32) << 8 | u32::from(humidity);
        if ctx.dedup.check_and_update(
            fingerprint,
            signal.hash_repeat(),
            Duration::milliseconds(REPEAT_WINDOW_MS),
            ctx.now,
        ) {
            debug!("HyWS77TH: duplicated packet");
            return Decode::Quiet(QuietReason::Repeat);
        }

        signal.repeats = true;
        signal.number = 0;

        Decode::Accepted(DecodedPacket::new(
            self.name(),
            ctx.now,
            vec![
                Field::Id {
                    value: id,
                    digits: 2,
                },
                Field::Channel(channel),
                Field::TemperatureDeci(temperature),
                Field::Trend(trend),
                Field::Humidity(humidity),
                Field::Battery(!battery_low),
            ],
        ))
    }
}

impl Default for HyWs77 {
    fn default() -> Self {
        Self::new()
    }
}
