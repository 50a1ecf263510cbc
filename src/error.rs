//! Error types for the IronTrack controller.
//!
//! Small `Copy` enums per boundary, all convertible into the crate-wide
//! [`Error`].  Only link loss ends a session; everything else is handled
//! where it happens and the loop keeps running.

use core::fmt;

use crate::protocol::Command;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Any crate error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Reading the serial link failed.
    Source(SourceError),
    /// Writing an actuator failed.
    Output(OutputError),
    /// Opening the session's peripherals failed.
    Session(SessionError),
    /// A decoded frame could not be applied.
    Dispatch(DispatchError),
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(e) => write!(f, "source: {e}"),
            Self::Output(e) => write!(f, "output: {e}"),
            Self::Session(e) => write!(f, "session: {e}"),
            Self::Dispatch(e) => write!(f, "dispatch: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Byte source
// ---------------------------------------------------------------------------

/// Failure reading from the command link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceError {
    /// The link is gone; the session is over.
    LinkLost,
    /// A read failed but the link is still up.
    Transient,
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkLost => write!(f, "link lost"),
            Self::Transient => write!(f, "transient read failure"),
        }
    }
}

impl From<SourceError> for Error {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

// ---------------------------------------------------------------------------
// Pulse outputs
// ---------------------------------------------------------------------------

/// Failure writing a pulse width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputError {
    /// The link is gone; the handle is dead.
    LinkLost,
    /// The peripheral rejected the write.
    WriteFailed,
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkLost => write!(f, "link lost"),
            Self::WriteFailed => write!(f, "pulse-width write failed"),
        }
    }
}

impl From<OutputError> for Error {
    fn from(e: OutputError) -> Self {
        Self::Output(e)
    }
}

// ---------------------------------------------------------------------------
// Session setup
// ---------------------------------------------------------------------------

/// Failure establishing a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The hardware link is not available.
    LinkUnavailable,
    /// The serial input could not be opened.
    SourceOpenFailed,
    /// An actuator channel could not be opened.
    ActuatorOpenFailed(Command),
    /// An actuator refused its idle pulse width.
    IdleWriteFailed(Command),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkUnavailable => write!(f, "link unavailable"),
            Self::SourceOpenFailed => write!(f, "serial input open failed"),
            Self::ActuatorOpenFailed(c) => write!(f, "{c} actuator open failed"),
            Self::IdleWriteFailed(c) => write!(f, "{c} idle pulse write failed"),
        }
    }
}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Why a decoded frame was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The actuator's link is gone.
    LinkLost,
    /// The actuator rejected the write; the link is still up.
    WriteFailed(Command),
    /// No open actuator for this command.  The decoder only emits bound
    /// commands, so this is an internal invariant violation.
    Unmapped(Command),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkLost => write!(f, "link lost"),
            Self::WriteFailed(c) => write!(f, "{c} write failed"),
            Self::Unmapped(c) => write!(f, "no actuator mapped for {c}"),
        }
    }
}

impl From<DispatchError> for Error {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}

impl DispatchError {
    pub(crate) fn from_output(command: Command, e: OutputError) -> Self {
        match e {
            OutputError::LinkLost => Self::LinkLost,
            OutputError::WriteFailed => Self::WriteFailed(command),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Config rejected or unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The document could not be parsed.
    Parse,
    /// A field failed range validation; the message names it.
    Invalid(&'static str),
    /// Persistent storage could not be read or written.
    Storage,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "parse error"),
            Self::Invalid(msg) => write!(f, "invalid: {msg}"),
            Self::Storage => write!(f, "storage error"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
