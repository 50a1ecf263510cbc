//! Byte-at-a-time frame decoder.
//!
//! Wire format:
//! ```text
//! ┌──────┬─────┬──────────────────────────┬──────────────────┐
//! │ '/'  │ tag │ address pattern (6B)     │ value (4B)       │
//! │ 0x2F │ 1B  │ ignored                  │ f32, last = MSB  │
//! └──────┴─────┴──────────────────────────┴──────────────────┘
//! ```
//!
//! There is no length field, terminator or checksum.  Every `/` is a hard
//! frame boundary: whatever was being collected is dropped and the
//! decoder waits for a tag again.  That is the only way the stream
//! recovers from lost or corrupted bytes.

use log::trace;

use super::command::{Command, TagTable};
use super::value::decode_value;
use super::{FRAME_START, PAYLOAD_LEN, VALUE_LEN};

/// Slots in a frame buffer: the tag plus the payload.
pub const FRAME_SLOTS: usize = 1 + PAYLOAD_LEN;

/// Outcome of feeding one byte.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameEvent {
    /// Nothing to act on yet.
    Incomplete,
    /// A frame just completed.
    FrameReady { command: Command, value: f32 },
    /// A `/` aborted a frame in progress; the decoder now awaits a tag.
    Resynchronized,
}

/// Decoder state tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Waiting for a frame-start marker.
    Idle,
    /// Marker seen, waiting for a bound tag byte.
    AwaitingTag,
    /// Tag bound, collecting payload bytes.
    Collecting { command: Command },
}

/// In-progress frame buffer.
struct ByteFrame {
    slots: [u8; FRAME_SLOTS],
    /// Next slot to fill.
    cursor: usize,
}

impl ByteFrame {
    const fn new() -> Self {
        Self {
            slots: [0; FRAME_SLOTS],
            cursor: 0,
        }
    }

    fn clear(&mut self) {
        self.cursor = 0;
    }

    fn push(&mut self, byte: u8) {
        debug_assert!(self.cursor < FRAME_SLOTS, "frame buffer overrun");
        self.slots[self.cursor] = byte;
        self.cursor += 1;
    }

    /// Payload bytes collected so far (excludes the tag slot).
    fn payload_len(&self) -> usize {
        self.cursor.saturating_sub(1)
    }

    /// Value bytes in arrival order.  Only meaningful once full.
    fn value_bytes(&self) -> [u8; VALUE_LEN] {
        let mut out = [0u8; VALUE_LEN];
        out.copy_from_slice(&self.slots[FRAME_SLOTS - VALUE_LEN..]);
        out
    }
}

/// Streaming frame decoder.
///
/// Owns all decode progress; independent instances never interfere.
pub struct FrameDecoder {
    state: DecoderState,
    frame: ByteFrame,
    tags: TagTable,
}

impl FrameDecoder {
    /// Decoder for the default `M`/`W` tag set.
    pub fn new() -> Self {
        Self::with_tags(TagTable::default())
    }

    /// Decoder over a custom tag table.
    pub fn with_tags(tags: TagTable) -> Self {
        Self {
            state: DecoderState::Idle,
            frame: ByteFrame::new(),
            tags,
        }
    }

    /// Feed one byte from the stream.
    pub fn feed(&mut self, byte: u8) -> FrameEvent {
        if byte == FRAME_START {
            let aborted = self.state != DecoderState::Idle;
            let dropped = self.frame.cursor;
            self.frame.clear();
            self.state = DecoderState::AwaitingTag;
            if aborted {
                trace!("decoder: resync, dropped {} buffered bytes", dropped);
                return FrameEvent::Resynchronized;
            }
            return FrameEvent::Incomplete;
        }

        match self.state {
            DecoderState::Idle => FrameEvent::Incomplete,

            DecoderState::AwaitingTag => {
                if let Some(command) = self.tags.lookup(byte) {
                    self.frame.push(byte);
                    self.state = DecoderState::Collecting { command };
                } else {
                    trace!("decoder: ignoring non-tag byte 0x{:02X}", byte);
                }
                FrameEvent::Incomplete
            }

            DecoderState::Collecting { command } => {
                self.frame.push(byte);
                if self.frame.payload_len() < PAYLOAD_LEN {
                    return FrameEvent::Incomplete;
                }

                let value = decode_value(self.frame.value_bytes());
                self.frame.clear();
                self.state = DecoderState::Idle;
                FrameEvent::FrameReady { command, value }
            }
        }
    }

    /// Drop any partial frame and return to Idle (e.g. after link loss).
    pub fn reset(&mut self) {
        self.frame.clear();
        self.state = DecoderState::Idle;
    }

    /// Current state tag.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Filled slots in the frame buffer (tag included).
    pub fn buffered(&self) -> usize {
        self.frame.cursor
    }

    /// The tag table this decoder resolves tags with.
    pub fn tags(&self) -> &TagTable {
        &self.tags
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
