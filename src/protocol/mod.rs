//! Serial wire protocol.
//!
//! ```text
//! ┌───────────┐   bytes   ┌───────────┐  FrameReady  ┌────────────┐
//! │ ByteSource│──────────▶│  Decoder  │─────────────▶│ Dispatcher │
//! └───────────┘           │ (tags,    │              └────────────┘
//!                         │  value)   │
//!                         └───────────┘
//! ```
//!
//! Frames are fire-and-forget: no acknowledgment, no retransmission.

pub mod command;
pub mod decoder;
pub mod value;

pub use command::{Command, TagTable};
pub use decoder::{DecoderState, FrameDecoder, FrameEvent};

/// Frame-start marker (`/`).
pub const FRAME_START: u8 = 0x2F;

/// Payload bytes following the tag.
pub const PAYLOAD_LEN: usize = 10;

/// Trailing payload bytes that carry the value.
pub const VALUE_LEN: usize = 4;
