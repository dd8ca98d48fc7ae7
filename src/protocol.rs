//! Sensor link frame format and byte-at-a-time decoder.
//!
//! Every frame is seven bytes:
//!
//! ```text
//! 0xAA | X_hi | X_lo | Y_hi | Y_lo | checksum | 0x55
//! ```
//!
//! X and Y are big-endian sign-magnitude values (bit 15 = negative, bits 0..14
//! magnitude) and `checksum` is the wrapping sum of the four payload bytes.
//! A committed frame is a *relative* move: it is added onto the setpoint
//! registers, never written over them.

use crate::shared::{LinkStats, SetpointRegisters};

/* ───── Packet anatomy ──────────────────────────────────────────────── */
pub const SYNC_BYTE: u8 = 0xAA;
pub const END_BYTE: u8 = 0x55;
pub const PAYLOAD_LEN: usize = 4;
pub const FRAME_LEN: usize = PAYLOAD_LEN + 3;

const SIGN_BIT: u16 = 0x8000;
const MAGNITUDE_MASK: u16 = 0x7FFF;

/// Decoded displacement in pulse units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Displacement {
    pub dx: i16,
    pub dy: i16,
}

impl Displacement {
    pub const fn new(dx: i16, dy: i16) -> Self {
        Self { dx, dy }
    }
}

/// Why a complete frame was thrown away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    BadTerminator,
    BadChecksum,
}

/// Result of feeding one byte to the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decoded {
    Pending,
    Frame(Displacement),
    Rejected(FrameError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderState {
    /// Hunting for `SYNC_BYTE`; everything else is dropped.
    WaitSync,
    /// `filled` payload bytes stored so far.
    Payload { filled: u8 },
    Checksum,
    WaitEnd,
}

#[inline]
pub fn checksum(payload: &[u8; PAYLOAD_LEN]) -> u8 {
    payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Sign-magnitude to two's complement. `0x8000` ("negative zero") is 0.
#[inline]
pub fn decode_axis(raw: u16) -> i16 {
    let magnitude = (raw & MAGNITUDE_MASK) as i16;
    if raw & SIGN_BIT != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Two's complement to sign-magnitude. `i16::MIN` saturates to -32767.
#[inline]
pub fn encode_axis(value: i16) -> u16 {
    let magnitude = value.unsigned_abs().min(MAGNITUDE_MASK);
    if value < 0 {
        SIGN_BIT | magnitude
    } else {
        magnitude
    }
}

/// Build the wire bytes for one displacement.
pub fn encode_frame(displacement: Displacement) -> [u8; FRAME_LEN] {
    let [x_hi, x_lo] = encode_axis(displacement.dx).to_be_bytes();
    let [y_hi, y_lo] = encode_axis(displacement.dy).to_be_bytes();
    let payload = [x_hi, x_lo, y_hi, y_lo];

    [
        SYNC_BYTE,
        x_hi,
        x_lo,
        y_hi,
        y_lo,
        checksum(&payload),
        END_BYTE,
    ]
}

/// Frame state machine. Never blocks, never allocates, and resynchronises on
/// the next sync byte after any malformed frame.
pub struct FrameDecoder {
    state: DecoderState,
    payload: [u8; PAYLOAD_LEN],
    checksum: u8,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub const fn new() -> Self {
        Self {
            state: DecoderState::WaitSync,
            payload: [0; PAYLOAD_LEN],
            checksum: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Process a single incoming byte.
    pub fn push(&mut self, byte: u8) -> Decoded {
        match self.state {
            DecoderState::WaitSync => {
                if byte == SYNC_BYTE {
                    self.state = DecoderState::Payload { filled: 0 };
                }
                Decoded::Pending
            }
            DecoderState::Payload { filled } => {
                self.payload[filled as usize] = byte;
                let filled = filled + 1;
                self.state = if filled as usize == PAYLOAD_LEN {
                    DecoderState::Checksum
                } else {
                    DecoderState::Payload { filled }
                };
                Decoded::Pending
            }
            DecoderState::Checksum => {
                self.checksum = byte;
                self.state = DecoderState::WaitEnd;
                Decoded::Pending
            }
            DecoderState::WaitEnd => {
                // Whatever the terminator slot holds, the next byte is hunted
                // as a fresh sync.
                self.state = DecoderState::WaitSync;
                if byte != END_BYTE {
                    return Decoded::Rejected(FrameError::BadTerminator);
                }
                if self.checksum != checksum(&self.payload) {
                    return Decoded::Rejected(FrameError::BadChecksum);
                }

                let [x_hi, x_lo, y_hi, y_lo] = self.payload;
                Decoded::Frame(Displacement {
                    dx: decode_axis(u16::from_be_bytes([x_hi, x_lo])),
                    dy: decode_axis(u16::from_be_bytes([y_hi, y_lo])),
                })
            }
        }
    }
}

/// Decoder bound to the shared setpoint registers.
///
/// Owned by the link receive context; the only writer of the setpoints.
pub struct FrameReceiver<'a> {
    decoder: FrameDecoder,
    setpoints: &'a SetpointRegisters,
    stats: &'a LinkStats,
}

impl<'a> FrameReceiver<'a> {
    pub const fn new(setpoints: &'a SetpointRegisters, stats: &'a LinkStats) -> Self {
        Self {
            decoder: FrameDecoder::new(),
            setpoints,
            stats,
        }
    }

    #[inline]
    pub fn state(&self) -> DecoderState {
        self.decoder.state()
    }

    /// Feed one byte; returns the displacement if it completed a valid frame.
    pub fn push(&mut self, byte: u8) -> Option<Displacement> {
        match self.decoder.push(byte) {
            Decoded::Pending => None,
            Decoded::Frame(d) => {
                self.setpoints.accumulate(d);
                self.stats.record_frame();
                trace!("link frame dx={} dy={}", d.dx, d.dy);
                Some(d)
            }
            Decoded::Rejected(e) => {
                self.stats.record_rejected(e);
                trace!("link frame rejected: {:?}", e);
                None
            }
        }
    }

    /// Feed a run of bytes; returns how many frames were committed.
    pub fn extend(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().filter_map(|&b| self.push(b)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Setpoints;

    fn feed(decoder: &mut FrameDecoder, bytes: &[u8]) -> (usize, Option<Displacement>) {
        let mut frames = 0;
        let mut last = None;
        for &b in bytes {
            if let Decoded::Frame(d) = decoder.push(b) {
                frames += 1;
                last = Some(d);
            }
        }
        (frames, last)
    }

    #[test]
    fn decodes_reference_frame() {
        let mut decoder = FrameDecoder::new();
        let bytes = [0xAA, 0x00, 0x0A, 0x00, 0x05, 0x0F, 0x55];

        for &b in &bytes[..6] {
            assert_eq!(decoder.push(b), Decoded::Pending);
        }
        assert_eq!(
            decoder.push(bytes[6]),
            Decoded::Frame(Displacement::new(10, 5))
        );
        assert_eq!(decoder.state(), DecoderState::WaitSync);
    }

    #[test]
    fn bad_checksum_is_dropped() {
        let setpoints = SetpointRegisters::new(Setpoints::NEUTRAL);
        let stats = LinkStats::new();
        let mut rx = FrameReceiver::new(&setpoints, &stats);

        let committed = rx.extend(&[0xAA, 0x00, 0x0A, 0x00, 0x05, 0x00, 0x55]);

        assert_eq!(committed, 0);
        assert_eq!(setpoints.snapshot(), Setpoints::NEUTRAL);
        assert_eq!(rx.state(), DecoderState::WaitSync);
        assert_eq!(stats.snapshot().checksum_failures, 1);
        assert_eq!(stats.snapshot().frames, 0);
    }

    #[test]
    fn bad_terminator_resets() {
        let mut decoder = FrameDecoder::new();
        let (frames, _) = feed(&mut decoder, &[0xAA, 0x00, 0x0A, 0x00, 0x05, 0x0F]);
        assert_eq!(frames, 0);
        assert_eq!(
            decoder.push(0x56),
            Decoded::Rejected(FrameError::BadTerminator)
        );
        assert_eq!(decoder.state(), DecoderState::WaitSync);
    }

    #[test]
    fn noise_before_sync_is_ignored() {
        let mut decoder = FrameDecoder::new();
        let mut bytes = [0x00, 0x55, 0x13, 0xFF].to_vec();
        bytes.extend_from_slice(&encode_frame(Displacement::new(-300, 42)));

        let (frames, last) = feed(&mut decoder, &bytes);
        assert_eq!(frames, 1);
        assert_eq!(last, Some(Displacement::new(-300, 42)));
    }

    #[test]
    fn sign_magnitude_axis() {
        assert_eq!(decode_axis(0x000A), 10);
        assert_eq!(decode_axis(0x800A), -10);
        assert_eq!(decode_axis(0x8000), 0);
        assert_eq!(decode_axis(0x7FFF), 32767);
        assert_eq!(decode_axis(0xFFFF), -32767);

        assert_eq!(encode_axis(-10), 0x800A);
        assert_eq!(encode_axis(0), 0x0000);
        assert_eq!(encode_axis(i16::MIN), 0xFFFF);
    }

    #[test]
    fn every_representable_value_survives_the_wire() {
        let mut decoder = FrameDecoder::new();
        for dx in (-32767i16..=32767).step_by(97) {
            let dy = dx.wrapping_mul(3) / 4;
            let sent = Displacement::new(dx, dy);
            let (frames, got) = feed(&mut decoder, &encode_frame(sent));
            assert_eq!(frames, 1, "dx={dx}");
            assert_eq!(got, Some(sent));
        }
        let (_, got) = feed(&mut decoder, &encode_frame(Displacement::new(32767, -32767)));
        assert_eq!(got, Some(Displacement::new(32767, -32767)));
    }

    #[test]
    fn corrupted_frame_then_good_frame_commits_once() {
        // payload free of sync/terminator values so a corrupted sync byte
        // cannot be mistaken for a frame start further down
        let bad = encode_frame(Displacement::new(0x0102, 0x0304));
        let good = encode_frame(Displacement::new(250, -125));

        for offset in 0..FRAME_LEN {
            for corrupt in 0..=u8::MAX {
                let mut first = bad;
                if first[offset] == corrupt {
                    continue;
                }
                first[offset] = corrupt;

                let mut decoder = FrameDecoder::new();
                let (frames, last) = feed(&mut decoder, &[&first[..], &good[..]].concat());
                assert_eq!(frames, 1, "offset={offset} corrupt={corrupt:#04x}");
                assert_eq!(last, Some(Displacement::new(250, -125)));
            }
        }
    }

    #[test]
    fn sync_byte_as_terminator_rejects_and_rehunts() {
        let mut decoder = FrameDecoder::new();
        let mut bad = encode_frame(Displacement::new(0x0102, 0x0304));
        bad[FRAME_LEN - 1] = SYNC_BYTE;

        let (frames, _) = feed(&mut decoder, &bad[..FRAME_LEN - 1]);
        assert_eq!(frames, 0);
        assert_eq!(
            decoder.push(SYNC_BYTE),
            Decoded::Rejected(FrameError::BadTerminator)
        );
        assert_eq!(decoder.state(), DecoderState::WaitSync);

        let (frames, last) = feed(&mut decoder, &encode_frame(Displacement::new(250, -125)));
        assert_eq!(frames, 1);
        assert_eq!(last, Some(Displacement::new(250, -125)));
    }

    #[test]
    fn truncated_frame_costs_the_frame_behind_it() {
        let mut decoder = FrameDecoder::new();
        let next = encode_frame(Displacement::new(7, 8));
        let after = encode_frame(Displacement::new(-9, 10));

        // truncated frame: the next frame's sync lands in the terminator slot
        // and is consumed, so the rest of that frame is hunted over as noise
        let mut bytes = [0xAA, 0x01, 0x02, 0x03, 0x04, 0x0A].to_vec();
        bytes.extend_from_slice(&next);
        let (frames, _) = feed(&mut decoder, &bytes);
        assert_eq!(frames, 0);
        assert_eq!(decoder.state(), DecoderState::WaitSync);

        let (frames, last) = feed(&mut decoder, &after);
        assert_eq!(frames, 1);
        assert_eq!(last, Some(Displacement::new(-9, 10)));
    }

    #[test]
    fn frames_accumulate_relative_moves() {
        let setpoints = SetpointRegisters::new(Setpoints::NEUTRAL);
        let stats = LinkStats::new();
        let mut rx = FrameReceiver::new(&setpoints, &stats);

        assert_eq!(rx.extend(&[0xAA, 0x00, 0x0A, 0x00, 0x05, 0x0F, 0x55]), 1);
        assert_eq!(rx.extend(&encode_frame(Displacement::new(-30, 100))), 1);

        assert_eq!(setpoints.snapshot(), Setpoints { x: 2980.0, y: 3105.0 });
        assert_eq!(stats.snapshot().frames, 2);
    }
}
