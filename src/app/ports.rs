//! Port traits — the boundary between the control core and the hardware
//! session manager.
//!
//! ```text
//!   HardwarePort ──opens──▶ ByteSource + PulseOutput ×N ──▶ ControlLoop
//! ```
//!
//! The session manager owns the peripherals' open/close lifecycle.  The
//! control loop only borrows the handles of a [`HardwareSession`] while
//! that session is live, so any implementation (real UART/LEDC, a fake
//! fed from a byte slice) can be substituted.

use crate::config::{ChannelConfig, ControlConfig, UartConfig};
use crate::error::{ConfigError, OutputError, SessionError, SourceError};
use crate::protocol::Command;

// ───────────────────────────────────────────────────────────────
// Byte source (driven adapter: serial link → core)
// ───────────────────────────────────────────────────────────────

/// Pull-based serial input.
pub trait ByteSource {
    /// Block until the next byte arrives.  This is the loop's only
    /// suspension point; there is no timeout.
    fn read_byte(&mut self) -> Result<u8, SourceError>;
}

// ───────────────────────────────────────────────────────────────
// Pulse output (driven adapter: core → actuator)
// ───────────────────────────────────────────────────────────────

/// A pulse-width-controlled output channel.
pub trait PulseOutput {
    /// Set the high time of each period, in microseconds.
    fn set_pulse_width(&mut self, micros: i32) -> Result<(), OutputError>;
}

impl<T: PulseOutput + ?Sized> PulseOutput for Box<T> {
    fn set_pulse_width(&mut self, micros: i32) -> Result<(), OutputError> {
        (**self).set_pulse_width(micros)
    }
}

// ───────────────────────────────────────────────────────────────
// Hardware port (session manager capability)
// ───────────────────────────────────────────────────────────────

/// Opens the peripherals a session needs.
pub trait HardwarePort {
    type Source: ByteSource;
    type Output: PulseOutput;

    /// Open the serial command input.  Fails when the link is down.
    fn open_byte_source(&mut self, uart: &UartConfig) -> Result<Self::Source, SessionError>;

    /// Open one actuator channel at the given update rate.
    fn open_actuator(
        &mut self,
        channel: &ChannelConfig,
        update_rate_hz: u32,
    ) -> Result<Self::Output, SessionError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: core → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// Receives every event the control loop emits.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Config port (driven adapter: core ↔ persistent storage)
// ───────────────────────────────────────────────────────────────

/// Persistent controller configuration.
pub trait ConfigPort {
    /// Load the stored config, or [`ControlConfig::default()`] when none
    /// is stored.  A stored blob that fails validation is an error.
    fn load(&self) -> Result<ControlConfig, ConfigError>;

    /// Validate and persist.
    fn save(&mut self, config: &ControlConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Session resources
// ───────────────────────────────────────────────────────────────

/// Open actuator handles, one slot per [`Command`].
pub struct ActuatorBank<O> {
    slots: [Option<O>; Command::COUNT],
}

impl<O> ActuatorBank<O> {
    /// A bank with every slot closed.
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
        }
    }

    /// Store the open handle for `command`, replacing any previous one.
    pub fn insert(&mut self, command: Command, output: O) {
        self.slots[command.index()] = Some(output);
    }

    /// The open handle for `command`, if any.
    pub fn get_mut(&mut self, command: Command) -> Option<&mut O> {
        self.slots[command.index()].as_mut()
    }

    /// Whether `command` has an open handle.
    pub fn is_open(&self, command: Command) -> bool {
        self.slots[command.index()].is_some()
    }

    /// Number of open handles.
    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Drop every handle, closing the underlying channels.
    pub fn release_all(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }
}

impl<O> Default for ActuatorBank<O> {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a live session holds: the serial input and the actuators.
///
/// Dropping it releases every peripheral.
pub struct HardwareSession<S, O> {
    pub source: S,
    pub actuators: ActuatorBank<O>,
}

impl<S, O> HardwareSession<S, O> {
    /// A session over `source` with no actuators open yet.
    pub fn new(source: S) -> Self {
        Self {
            source,
            actuators: ActuatorBank::new(),
        }
    }
}
