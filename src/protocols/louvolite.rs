//! Louvolite R1492 remote-controlled blinds.
//!
//! Protocol characteristics:
//! - PWM encoding: short high + long low = 0, long high + short low = 1
//! - short = 266us, long = 665us, sync = 4750us, tolerance +-50us
//! - 65 bits per frame, 130 pulses on the air
//! - 9-byte frame: header 0xAC, 24-bit remote id, node byte, 16-bit command,
//!   byte-sum checksum over bytes 1..=6, trailer 0x80
//! - transmit sends one wake-primed frame plus 9 bare repeats; Up/Down are
//!   held commands and get a Release burst 500ms later

use bitvec::prelude::*;
use tracing::debug;

use super::{Decode, DecodeContext, Protocol, QuietReason};
use crate::event::{Command, DecodedPacket, Field};
use crate::pulse::Band;
use crate::pwm::decode_pwm;
use crate::signal::RawSignal;
use crate::tx::{send, Pulse, TxError, TxLine, TxRequest};

const BYTE_COUNT: usize = 9;
const BIT_COUNT: usize = 65;
const EXPECTED_PULSES: usize = 130;

const HEADER: u8 = 0xAC;
const TRAILER: u8 = 0x80;

const CMD_UP: u16 = 0x000B;
const CMD_STOP: u16 = 0x0023;
const CMD_RELEASE: u16 = 0x0024; // end of button press
const CMD_DOWN: u16 = 0x0043;

const PWM_SYNC: u32 = 4750;
const PWM_LONG: u32 = 665;
const PWM_SHORT: u32 = 266;
const PWM_TOLERANCE: u32 = 50;

const WAKE_PAIRS: usize = 8;
const NUM_REPEATS: usize = 9;
const RELEASE_GAP_US: u32 = 500_000;

/// Louvolite blinds remote decoder/encoder.
pub struct Louvolite;

impl Louvolite {
    pub fn new() -> Self {
        Self
    }

    /// Byte-sum checksum over bytes 1..=6, truncated to one byte.
    fn checksum(frame: &[u8; BYTE_COUNT]) -> u8 {
        frame[1..7].iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
    }

    fn frame(id: u32, node: u8, command: u16) -> [u8; BYTE_COUNT] {
        let mut frame = [
            HEADER,
            (id >> 16) as u8,
            (id >> 8) as u8,
            id as u8,
            node,
            (command >> 8) as u8,
            command as u8,
            0,
            TRAILER,
        ];
        frame[7] = Self::checksum(&frame);
        frame
    }

    /// Pulse train for one frame: optional wake preamble, sync pulse, 65 bits
    /// MSB-first as two-phase pairs, trailing sync-length low.
    fn burst(frame: &[u8; BYTE_COUNT], wake: bool) -> Vec<Pulse> {
        let mut pulses = Vec::with_capacity(2 * WAKE_PAIRS + 3 + 2 * BIT_COUNT);

        // wake-up pulses, only for the first frame of a sequence
        if wake {
            for _ in 0..WAKE_PAIRS {
                pulses.push(Pulse::new(true, PWM_SHORT));
                pulses.push(Pulse::new(false, PWM_LONG));
            }
        }

        pulses.push(Pulse::new(true, PWM_SYNC));
        pulses.push(Pulse::new(false, PWM_LONG));

        for bit in frame.view_bits::<Msb0>()[..BIT_COUNT].iter().by_vals() {
            if bit {
                pulses.push(Pulse::new(true, PWM_LONG));
                pulses.push(Pulse::new(false, PWM_SHORT));
            } else {
                pulses.push(Pulse::new(true, PWM_SHORT));
                pulses.push(Pulse::new(false, PWM_LONG));
            }
        }

        pulses.push(Pulse::new(false, PWM_SYNC));
        pulses
    }
}

impl Protocol for Louvolite {
    fn name(&self) -> &'static str {
        "Louvolite"
    }

    fn decode(&self, signal: &mut RawSignal, ctx: &mut DecodeContext<'_>) -> Decode {
        if signal.number != EXPECTED_PULSES {
            return Decode::Rejected;
        }

        let short = Band::scaled(PWM_SHORT, PWM_TOLERANCE, signal.multiply);
        let long = Band::scaled(PWM_LONG, PWM_TOLERANCE, signal.multiply);

        let mut frame = [0u8; BYTE_COUNT];
        if !decode_pwm(
            &mut frame,
            BIT_COUNT,
            &signal.pulses,
            signal.number,
            1,
            short,
            long,
        ) {
            debug!("Louvolite: PWM decode failed");
            return Decode::Rejected;
        }

        if frame[0] != HEADER {
            return Decode::Rejected;
        }
        if frame[7] != Self::checksum(&frame) {
            debug!("Louvolite: checksum mismatch");
            return Decode::Rejected;
        }

        let id = u32::from(frame[1]) << 16 | u32::from(frame[2]) << 8 | u32::from(frame[3]);
        let node = frame[4];
        let raw_command = u16::from(frame[5]) << 8 | u16::from(frame[6]);

        // This burst is ours either way; stop the capture layer re-offering it.
        signal.repeats = true;

        let command = match raw_command {
            CMD_UP => Command::Up,
            CMD_STOP => Command::Stop,
            CMD_DOWN => Command::Down,
            CMD_RELEASE => return Decode::Quiet(QuietReason::EndOfPress),
            _ => Command::Unknown,
        };

        Decode::Accepted(DecodedPacket::new(
            self.name(),
            ctx.now,
            vec![
                Field::Id {
                    value: id,
                    digits: 6,
                },
                Field::Id {
                    value: u32::from(node),
                    digits: 4,
                },
                Field::Command(command),
            ],
        ))
    }

    fn supports_transmit(&self) -> bool {
        true
    }

    fn transmit(&self, line: &mut dyn TxLine, request: &TxRequest) -> Result<(), TxError> {
        let command = match request.command {
            Command::Up => CMD_UP,
            Command::Down => CMD_DOWN,
            Command::Stop => CMD_STOP,
            other => return Err(TxError::UnsupportedCommand(other)),
        };

        let frame = Self::frame(request.id, request.node, command);
        let mut train = Self::burst(&frame, true);
        for _ in 0..NUM_REPEATS {
            train.extend(Self::burst(&frame, false));
        }

        // Up and Down are held commands: a Release burst follows after a
        // fixed gap, repeated half as often.
        if command != CMD_STOP {
            train.push(Pulse::new(false, RELEASE_GAP_US));
            let release = Self::frame(request.id, request.node, CMD_RELEASE);
            train.extend(Self::burst(&release, true));
            for _ in 0..NUM_REPEATS / 2 {
                train.extend(Self::burst(&release, false));
            }
        }

        send(line, &train);
        Ok(())
    }
}

impl Default for Louvolite {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::Dedup;
    use chrono::Utc;

    /// Idealized 130-pulse capture for a frame, lead-in slot included.
    fn signal_for(frame: &[u8; BYTE_COUNT]) -> RawSignal {
        let mut pulses = vec![77u16];
        for bit in frame.view_bits::<Msb0>()[..BIT_COUNT].iter().by_vals() {
            if bit {
                pulses.push(665);
                pulses.push(266);
            } else {
                pulses.push(266);
                pulses.push(665);
            }
        }
        pulses.truncate(EXPECTED_PULSES);
        RawSignal::new(pulses, 1)
    }

    fn decode(signal: &mut RawSignal) -> Decode {
        let mut dedup = Dedup::new();
        let mut ctx = DecodeContext {
            dedup: &mut dedup,
            now: Utc::now(),
        };
        Louvolite::new().decode(signal, &mut ctx)
    }

    #[test]
    fn frame_layout_and_checksum() {
        let frame = Louvolite::frame(0x1A602A, 1, CMD_UP);
        assert_eq!(frame, [0xAC, 0x1A, 0x60, 0x2A, 0x01, 0x00, 0x0B, 0xB0, 0x80]);
    }

    #[test]
    fn decodes_up_command_end_to_end() {
        let mut signal = signal_for(&Louvolite::frame(0x1A602A, 1, CMD_UP));
        match decode(&mut signal) {
            Decode::Accepted(packet) => {
                assert_eq!(packet.protocol, "Louvolite");
                assert_eq!(
                    packet.fields,
                    vec![
                        Field::Id {
                            value: 0x1A602A,
                            digits: 6
                        },
                        Field::Id { value: 1, digits: 4 },
                        Field::Command(Command::Up),
                    ]
                );
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
        assert!(signal.repeats);
    }

    #[test]
    fn release_code_matches_but_stays_quiet() {
        let mut signal = signal_for(&Louvolite::frame(0x1A602A, 1, CMD_RELEASE));
        assert_eq!(decode(&mut signal), Decode::Quiet(QuietReason::EndOfPress));
        assert!(signal.repeats);
    }

    #[test]
    fn unexpected_command_code_is_reported_unknown() {
        let mut signal = signal_for(&Louvolite::frame(0x1A602A, 1, 0x00FF));
        match decode(&mut signal) {
            Decode::Accepted(packet) => {
                assert_eq!(packet.fields[2], Field::Command(Command::Unknown));
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[test]
    fn any_single_payload_bit_flip_is_rejected() {
        for byte in 1..7 {
            for bit in 0..8 {
                let mut frame = Louvolite::frame(0x1A602A, 1, CMD_UP);
                frame[byte] ^= 1 << bit; // checksum byte stays stale
                let mut signal = signal_for(&frame);
                assert_eq!(decode(&mut signal), Decode::Rejected, "byte {byte} bit {bit}");
                assert!(!signal.repeats);
            }
        }
    }

    #[test]
    fn wrong_header_is_rejected() {
        let mut frame = Louvolite::frame(0x1A602A, 1, CMD_UP);
        frame[0] = 0xAD;
        let mut signal = signal_for(&frame);
        assert_eq!(decode(&mut signal), Decode::Rejected);
    }

    #[test]
    fn wrong_pulse_count_is_rejected() {
        let mut signal = signal_for(&Louvolite::frame(0x1A602A, 1, CMD_UP));
        signal.number = 128;
        assert_eq!(decode(&mut signal), Decode::Rejected);
    }

    #[test]
    fn transmit_schedule_for_a_held_command() {
        let mut line = crate::tx::RecordedLine::new();
        Louvolite::new()
            .transmit(
                &mut line,
                &TxRequest {
                    id: 0x1A602A,
                    node: 1,
                    command: Command::Up,
                },
            )
            .unwrap();

        let primed = 2 * WAKE_PAIRS + 3 + 2 * BIT_COUNT; // 149
        let bare = 3 + 2 * BIT_COUNT; // 133
        assert_eq!(
            line.pulses.len(),
            primed + NUM_REPEATS * bare + 1 + primed + (NUM_REPEATS / 2) * bare
        );

        // Wake preamble: 8 short-high/long-low pairs.
        for pair in 0..WAKE_PAIRS {
            assert_eq!(line.pulses[2 * pair], Pulse::new(true, PWM_SHORT));
            assert_eq!(line.pulses[2 * pair + 1], Pulse::new(false, PWM_LONG));
        }

        // Sync pulse, then the first data bit (header MSB = 1).
        assert_eq!(line.pulses[16], Pulse::new(true, PWM_SYNC));
        assert_eq!(line.pulses[17], Pulse::new(false, PWM_LONG));
        assert_eq!(line.pulses[18], Pulse::new(true, PWM_LONG));
        assert_eq!(line.pulses[19], Pulse::new(false, PWM_SHORT));

        // First bare repeat starts with the sync, no wake pulses.
        assert_eq!(line.pulses[primed], Pulse::new(true, PWM_SYNC));

        // Release section after the fixed gap.
        let gap_at = primed + NUM_REPEATS * bare;
        assert_eq!(line.pulses[gap_at], Pulse::new(false, RELEASE_GAP_US));
        assert_eq!(line.pulses[gap_at + 1], Pulse::new(true, PWM_SHORT));

        // Data bits of the first frame spell out the expected bytes.
        let mut frame = [0u8; BYTE_COUNT];
        let bits = frame.view_bits_mut::<Msb0>();
        for i in 0..BIT_COUNT {
            bits.set(i, line.pulses[18 + 2 * i].duration_us == PWM_LONG);
        }
        assert_eq!(frame[..8], [0xAC, 0x1A, 0x60, 0x2A, 0x01, 0x00, 0x0B, 0xB0]);
        assert_eq!(frame[8] & 0x80, 0x80);
    }

    #[test]
    fn stop_command_sends_no_release_burst() {
        let mut line = crate::tx::RecordedLine::new();
        Louvolite::new()
            .transmit(
                &mut line,
                &TxRequest {
                    id: 0x1A602A,
                    node: 1,
                    command: Command::Stop,
                },
            )
            .unwrap();

        let primed = 2 * WAKE_PAIRS + 3 + 2 * BIT_COUNT;
        let bare = 3 + 2 * BIT_COUNT;
        assert_eq!(line.pulses.len(), primed + NUM_REPEATS * bare);
        assert!(line
            .pulses
            .iter()
            .all(|p| p.duration_us != RELEASE_GAP_US));
    }

    #[test]
    fn unsupported_command_is_refused() {
        let mut line = crate::tx::RecordedLine::new();
        let result = Louvolite::new().transmit(
            &mut line,
            &TxRequest {
                id: 0x1A602A,
                node: 1,
                command: Command::Unknown,
            },
        );
        assert_eq!(result, Err(TxError::UnsupportedCommand(Command::Unknown)));
        assert!(line.pulses.is_empty());
    }

    #[test]
    fn transmit_round_trips_through_the_decoder() {
        let mut line = crate::tx::RecordedLine::new();
        Louvolite::new()
            .transmit(
                &mut line,
                &TxRequest {
                    id: 0xBEEF01,
                    node: 6,
                    command: Command::Down,
                },
            )
            .unwrap();

        // Rebuild a capture from the first frame's data section: lead-in
        // slot, then the 130 on-air pulses.
        let data_start = 2 * WAKE_PAIRS + 2;
        let mut pulses = vec![77u16];
        pulses.extend(
            line.pulses[data_start..data_start + 2 * BIT_COUNT]
                .iter()
                .map(|p| p.duration_us as u16),
        );
        pulses.truncate(EXPECTED_PULSES);
        let mut signal = RawSignal::new(pulses, 1);

        match decode(&mut signal) {
            Decode::Accepted(packet) => {
                assert_eq!(
                    packet.fields,
                    vec![
                        Field::Id {
                            value: 0xBEEF01,
                            digits: 6
                        },
                        Field::Id { value: 6, digits: 4 },
                        Field::Command(Command::Down),
                    ]
                );
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
    }
}
