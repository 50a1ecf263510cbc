//! Fuzz target: `FrameDecoder::feed`
//!
//! Drives arbitrary byte sequences through the streaming frame decoder
//! and checks that it never panics, never buffers past one frame, and
//! that every `/` leaves it awaiting a tag with an empty buffer.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use irontrack::protocol::decoder::FRAME_SLOTS;
use irontrack::protocol::{DecoderState, FRAME_START, FrameDecoder, FrameEvent};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = FrameDecoder::new();
    let mut frames = 0usize;

    for &b in data {
        let event = decoder.feed(b);
        assert!(decoder.buffered() <= FRAME_SLOTS, "buffer overrun");

        if b == FRAME_START {
            assert_eq!(decoder.state(), DecoderState::AwaitingTag);
            assert_eq!(decoder.buffered(), 0);
        }
        if let FrameEvent::FrameReady { .. } = event {
            frames += 1;
            assert_eq!(decoder.state(), DecoderState::Idle);
        }
    }

    // Every frame costs at least twelve bytes.
    assert!(frames <= data.len() / 12);

    decoder.reset();
    assert_eq!(decoder.state(), DecoderState::Idle);
    assert_eq!(decoder.buffered(), 0);
});
