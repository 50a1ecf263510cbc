//! Outbound application events.
//!
//! The [`ControlLoop`](super::control_loop::ControlLoop) emits these
//! through the [`EventSink`](super::ports::EventSink) port.

use crate::error::{DispatchError, SessionError};
use crate::protocol::Command;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The byte source or an actuator reported the link gone.
    LinkLost,
    /// The session manager posted a loss notice.
    LostNotice,
    /// Shutdown was requested.
    Shutdown,
}

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Peripherals opened and parked at idle.
    SessionEstablished { actuators: usize },

    /// Opening the session failed.
    SessionFailed(SessionError),

    /// The session ended; handles released, decoder cleared.
    SessionLost(SessionEnd),

    /// A frame was decoded and written to its actuator.
    FrameApplied {
        command: Command,
        value: f32,
        pulse_us: i32,
    },

    /// A `/` aborted a partial frame.
    Resynchronized,

    /// A transient read error; the loop carries on.
    ReadFailed,

    /// A decoded frame could not be applied; the loop carries on.
    DispatchFailed(DispatchError),
}
