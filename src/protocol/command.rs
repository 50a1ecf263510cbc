//! Command set and tag-byte bindings.
//!
//! A frame's tag byte selects which actuator the frame drives.  The
//! binding from tag byte to [`Command`] is data, not code: the decoder
//! looks tags up in a [`TagTable`], so enabling another channel on the
//! wire is a configuration change.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use super::FRAME_START;

/// Maximum number of tag bindings a table can hold.
pub const MAX_TAGS: usize = 8;

/// Tag byte for the drive motor (`M`).
pub const TAG_MOTOR: u8 = 0x4D;
/// Tag byte for the front-wheel steering servo (`W`).
pub const TAG_WHEELS: u8 = 0x57;

/// Actuator a frame targets.
///
/// Discriminants index the actuator bank and the channel table in
/// [`ControlConfig`](crate::config::ControlConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Command {
    /// Camera gimbal, horizontal axis.
    Pan = 0,
    /// Camera gimbal, vertical axis.
    Tilt = 1,
    /// Primary drive motor (ESC).
    Motor = 2,
    /// Secondary motor: front-wheel steering.
    Wheels = 3,
}

impl Command {
    /// Number of commands, used to size per-command tables.
    pub const COUNT: usize = 4;

    /// Every command in channel order.
    pub const ALL: [Command; Self::COUNT] = [Self::Pan, Self::Tilt, Self::Motor, Self::Wheels];

    /// Slot in per-command tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lower-case name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pan => "pan",
            Self::Tilt => "tilt",
            Self::Motor => "motor",
            Self::Wheels => "wheels",
        }
    }
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// One tag byte bound to one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagBinding {
    pub tag: u8,
    pub command: Command,
}

/// Errors from building a [`TagTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagError {
    /// The frame-start marker cannot double as a tag.
    ReservedByte,
    /// The tag byte is already bound.
    Duplicate(u8),
    /// More than [`MAX_TAGS`] bindings.
    TableFull,
}

impl core::fmt::Display for TagError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ReservedByte => write!(f, "tag 0x{:02X} is the frame-start marker", FRAME_START),
            Self::Duplicate(tag) => write!(f, "tag 0x{:02X} bound twice", tag),
            Self::TableFull => write!(f, "more than {} tag bindings", MAX_TAGS),
        }
    }
}

/// Lookup table from tag byte to command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagTable {
    bindings: Vec<TagBinding, MAX_TAGS>,
}

impl TagTable {
    /// A table with no bindings; every byte after `/` is ignored.
    pub const fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Bind `tag` to `command`.
    pub fn bind(&mut self, tag: u8, command: Command) -> Result<(), TagError> {
        if tag == FRAME_START {
            return Err(TagError::ReservedByte);
        }
        if self.lookup(tag).is_some() {
            return Err(TagError::Duplicate(tag));
        }
        self.bindings
            .push(TagBinding { tag, command })
            .map_err(|_| TagError::TableFull)
    }

    /// Builder-style [`bind`](Self::bind).
    pub fn with(mut self, tag: u8, command: Command) -> Result<Self, TagError> {
        self.bind(tag, command)?;
        Ok(self)
    }

    /// Command bound to `tag`, if any.
    pub fn lookup(&self, tag: u8) -> Option<Command> {
        self.bindings
            .iter()
            .find(|b| b.tag == tag)
            .map(|b| b.command)
    }

    /// Check table invariants (used after deserialisation, which bypasses
    /// [`bind`](Self::bind)).
    pub fn check(&self) -> Result<(), TagError> {
        for (i, b) in self.bindings.iter().enumerate() {
            if b.tag == FRAME_START {
                return Err(TagError::ReservedByte);
            }
            if self.bindings[..i].iter().any(|prev| prev.tag == b.tag) {
                return Err(TagError::Duplicate(b.tag));
            }
        }
        Ok(())
    }

    /// Bindings in insertion order.
    pub fn bindings(&self) -> &[TagBinding] {
        &self.bindings
    }
}

/// The observed wire protocol: `M` drives the motor, `W` steers.
const DEFAULT_BINDINGS: [TagBinding; 2] = [
    TagBinding {
        tag: TAG_MOTOR,
        command: Command::Motor,
    },
    TagBinding {
        tag: TAG_WHEELS,
        command: Command::Wheels,
    },
];

const _: () = assert!(DEFAULT_BINDINGS.len() <= MAX_TAGS);

impl Default for TagTable {
    fn default() -> Self {
        Self {
            bindings: DEFAULT_BINDINGS.into_iter().collect(),
        }
    }
}
