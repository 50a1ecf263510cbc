//! Value field codec.
//!
//! The last four payload bytes carry an IEEE-754 single.  The byte
//! received last is the most significant; the 32 bits are reinterpreted,
//! never numerically converted, so NaN payloads and signed zero survive.

use super::{FRAME_START, PAYLOAD_LEN, VALUE_LEN};

/// Reassemble a value from its four wire bytes, given in arrival order.
pub fn decode_value(wire: [u8; VALUE_LEN]) -> f32 {
    let bits = wire
        .iter()
        .enumerate()
        .fold(0u32, |acc, (i, &b)| acc | (u32::from(b) << (8 * i)));
    f32::from_bits(bits)
}

/// Lay a value out as its four wire bytes, in arrival order.
pub fn encode_value(value: f32) -> [u8; VALUE_LEN] {
    value.to_bits().to_le_bytes()
}

/// Full frame: start marker, tag, payload.
pub const FRAME_LEN: usize = 2 + PAYLOAD_LEN;

/// Build a complete wire frame with zeroed padding.
///
/// Returns `None` if the tag or any value byte equals the frame-start
/// marker: the receiver would resynchronise mid-frame.
pub fn encode_frame(tag: u8, value: f32) -> Option<[u8; FRAME_LEN]> {
    let wire = encode_value(value);
    if tag == FRAME_START || wire.contains(&FRAME_START) {
        return None;
    }

    let mut frame = [0u8; FRAME_LEN];
    frame[0] = FRAME_START;
    frame[1] = tag;
    frame[FRAME_LEN - VALUE_LEN..].copy_from_slice(&wire);
    Some(frame)
}
