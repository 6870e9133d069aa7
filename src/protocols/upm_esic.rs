//! UPM/Esic weather-station outdoor sensors (also Emos, DVM, Clas Ohlson;
//! WT260/WT440H/WT450, WDS500, RG700).
//!
//! Protocol characteristics:
//! - 46..=56 pulses, 36 bits; a full-length pulse (1600..2075us exclusive) is
//!   a 0 bit, two consecutive half-length pulses (<=1100us) are a 1 bit
//! - first 10 bits: constant 1100 preamble, house code, device code
//! - remaining 26 bits: payload + 2 trailer bits
//! - two layouts share the carrier. Format 1 validates a two-bit XOR
//!   checksum over bit pairs and carries temperature/humidity, wind or rain;
//!   format 2 is only attempted when that check fails, validates whole-packet
//!   parity and carries temperature/humidity at higher resolution
//! - sensors send bursts of three; duplicates are suppressed on the first
//!   10 bits within a 500ms window

use chrono::Duration;
use tracing::debug;

use super::{Decode, DecodeContext, Protocol, QuietReason};
use crate::bitfield::BitField;
use crate::event::{DecodedPacket, Field};
use crate::signal::RawSignal;

const MIN_PULSECOUNT: usize = 46;
const MAX_PULSECOUNT: usize = 56;

const PULSE_HALF_MAX: u32 = 1100;
const PULSE_FULL_MIN: u32 = 1600;
const PULSE_FULL_MAX: u32 = 2075;

const MAX_BITS: usize = 36;
const REPEAT_WINDOW_MS: i64 = 500;

const HOUSE: BitField = BitField::new(0, 2);
const DEVICE: BitField = BitField::new(2, 4);

const F1_BATTERY_LOW: BitField = BitField::new(23, 1);
const F1_TEMP_WHOLE: BitField = BitField::new(8, 7);
const F1_TEMP_TENTHS: BitField = BitField::new(4, 4);
const F1_HUMIDITY: BitField = BitField::new(15, 8);
const F1_WIND_SPEED: BitField = BitField::new(8, 7);
const F1_WIND_DIR: BitField = BitField::new(15, 4);
const F1_RAIN: BitField = BitField::new(8, 7);

const F2_TEMP_WHOLE: BitField = BitField::new(8, 8);
const F2_TEMP_HUNDREDTHS: BitField = BitField::new(1, 7);
const F2_HUMIDITY: BitField = BitField::new(16, 7);

/// Wind and rain units use a reserved house/device pair.
const SPECIAL_HOUSE: u8 = 10;
const DEVICE_WIND: u8 = 2;
const DEVICE_RAIN: u8 = 3;

/// UPM/Esic weather sensor decoder.
pub struct UpmEsic;

impl UpmEsic {
    pub fn new() -> Self {
        Self
    }

    /// Two-bit XOR over the bit pairs of both words, excluding the trailer
    /// pair itself.
    fn pair_checksum(word1: u32, word2: u32) -> u32 {
        let mut check = 0;
        for i in (0..9).step_by(2) {
            check ^= (word1 >> i) & 0b11;
        }
        for i in (2..25).step_by(2) {
            check ^= (word2 >> i) & 0b11;
        }
        check
    }
}

impl Protocol for UpmEsic {
    fn name(&self) -> &'static str {
        "UPM/Esic"
    }

    fn decode(&self, signal: &mut RawSignal, ctx: &mut DecodeContext<'_>) -> Decode {
        if signal.number < MIN_PULSECOUNT || signal.number > MAX_PULSECOUNT {
            return Decode::Rejected;
        }

        let half_max = (PULSE_HALF_MAX / signal.multiply) as u16;
        let full_min = (PULSE_FULL_MIN / signal.multiply) as u16;
        let full_max = (PULSE_FULL_MAX / signal.multiply) as u16;

        let mut word1: u32 = 0; // first 10 bits
        let mut word2: u32 = 0; // last 26 bits
        let mut bits = 0usize;
        let mut halfbit = false; // one low half of a 1 bit seen

        for x in 1..signal.number {
            let pulse = signal.pulses[x];
            if pulse > full_min && pulse < full_max {
                if halfbit {
                    // a 0 cannot follow a single half pulse
                    return Decode::Rejected;
                }
                if bits < 10 {
                    word1 <<= 1;
                } else {
                    word2 <<= 1;
                }
                bits += 1;
            } else {
                if pulse > half_max {
                    return Decode::Rejected; // dead zone between the bands
                }
                if !halfbit {
                    halfbit = true;
                    continue;
                }
                if bits < 10 {
                    word1 = word1 << 1 | 1;
                } else {
                    word2 = word2 << 1 | 1;
                }
                bits += 1;
                halfbit = false;
            }
            if bits > MAX_BITS {
                return Decode::Rejected;
            }
        }

        // First four bits are always 1100 on this family.
        if word1 >> 6 != 0x0C {
            return Decode::Rejected;
        }
        if word2 == 0 {
            return Decode::Rejected;
        }

        let check = Self::pair_checksum(word1, word2);
        let format2 = if check == word2 & 0b11 {
            false
        } else {
            // Fold the residual to a single parity bit for the second layout.
            let folded = check ^ (word2 & 0b11);
            if (folded & 1) ^ (folded >> 1 & 1) != 0 {
                debug!("UPM/Esic: both integrity checks failed");
                return Decode::Rejected;
            }
            true
        };

        if ctx.dedup.check_and_update(
            word1,
            signal.hash_repeat(),
            Duration::milliseconds(REPEAT_WINDOW_MS),
            ctx.now,
        ) {
            return Decode::Quiet(QuietReason::Repeat);
        }

        let w1 = u64::from(word1);
        let w2 = u64::from(word2);
        let house = HOUSE.extract(w1) as u8;
        let device = DEVICE.extract(w1) as u8;
        let id = Field::Id {
            value: u32::from(house) << 8 | u32::from(device),
            digits: 4,
        };

        let packet = if !format2 {
            let battery_ok = F1_BATTERY_LOW.extract(w2) == 0;
            if house == SPECIAL_HOUSE && device == DEVICE_WIND {
                DecodedPacket::new(
                    "UPM/Esic",
                    ctx.now,
                    vec![
                        id,
                        Field::WindSpeed(F1_WIND_SPEED.extract(w2) as u16),
                        Field::WindDirection(F1_WIND_DIR.extract(w2) as u16),
                        Field::Battery(battery_ok),
                    ],
                )
            } else if house == SPECIAL_HOUSE && device == DEVICE_RAIN {
                // counter ticks are 0.7mm each
                let rain = (F1_RAIN.extract(w2) * 7) as u16;
                DecodedPacket::new(
                    "UPM/Esic",
                    ctx.now,
                    vec![id, Field::RainDeciMm(rain), Field::Battery(battery_ok)],
                )
            } else {
                let temperature =
                    (F1_TEMP_WHOLE.extract(w2) - 50) * 10 + F1_TEMP_TENTHS.extract(w2);
                if temperature > 1000 {
                    return Decode::Rejected;
                }
                let humidity = (F1_HUMIDITY.extract(w2) / 2) as u8;
                DecodedPacket::new(
                    "UPM/Esic",
                    ctx.now,
                    vec![
                        id,
                        Field::TemperatureDeci(temperature as i16),
                        Field::Humidity(humidity),
                        Field::Battery(battery_ok),
                    ],
                )
            }
        } else {
            let temperature =
                ((F2_TEMP_WHOLE.extract(w2) - 50) * 100 + F2_TEMP_HUNDREDTHS.extract(w2)) / 10;
            if temperature > 1000 {
                return Decode::Rejected;
            }
            let humidity = F2_HUMIDITY.extract(w2) as u8;
            DecodedPacket::new(
                "UPM/Esic F2",
                ctx.now,
                vec![
                    id,
                    Field::TemperatureDeci(temperature as i16),
                    Field::Humidity(humidity),
                    Field::Battery(false),
                ],
            )
        };

        signal.repeats = true;
        signal.number = 0;
        Decode::Accepted(packet)
    }
}

impl Default for UpmEsic {
    fn default() -> Self {
        Self::new()
    }
}
