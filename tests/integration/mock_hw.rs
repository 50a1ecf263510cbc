//! Mock hardware port for integration tests.
//!
//! Serves canned byte scripts as the serial input and records every
//! actuator call so tests can assert on the full write history without
//! touching real UART/LEDC registers.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use irontrack::app::events::AppEvent;
use irontrack::app::ports::{ByteSource, EventSink, HardwarePort, PulseOutput};
use irontrack::config::{ChannelConfig, UartConfig};
use irontrack::error::{OutputError, SessionError, SourceError};
use irontrack::protocol::value::{FRAME_LEN, encode_frame};
use irontrack::protocol::Command;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    Open { command: Command, update_rate_hz: u32 },
    SetPulse { command: Command, micros: i32 },
    Release { command: Command },
}

pub type CallLog = Rc<RefCell<Vec<ActuatorCall>>>;

// ── Byte source ───────────────────────────────────────────────

/// One scripted read result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadStep {
    Byte(u8),
    Transient,
    LinkLost,
}

pub fn script(bytes: &[u8]) -> Vec<ReadStep> {
    bytes.iter().copied().map(ReadStep::Byte).collect()
}

pub struct MockSource {
    script: VecDeque<ReadStep>,
    /// Serve `0x00` forever once the script runs out.
    endless: bool,
}

impl ByteSource for MockSource {
    fn read_byte(&mut self) -> Result<u8, SourceError> {
        match self.script.pop_front() {
            Some(ReadStep::Byte(b)) => Ok(b),
            Some(ReadStep::Transient) => Err(SourceError::Transient),
            Some(ReadStep::LinkLost) => Err(SourceError::LinkLost),
            None if self.endless => Ok(0x00),
            None => Err(SourceError::LinkLost),
        }
    }
}

// ── Pulse output ──────────────────────────────────────────────

pub struct MockOutput {
    command: Command,
    log: CallLog,
    writes: u32,
    /// Fails every write after the idle write.
    fail_frames: Option<OutputError>,
}

impl MockOutput {
    pub fn new(command: Command, log: CallLog) -> Self {
        Self {
            command,
            log,
            writes: 0,
            fail_frames: None,
        }
    }
}

impl PulseOutput for MockOutput {
    fn set_pulse_width(&mut self, micros: i32) -> Result<(), OutputError> {
        self.writes += 1;
        if let Some(e) = self.fail_frames.filter(|_| self.writes > 1) {
            return Err(e);
        }
        self.log.borrow_mut().push(ActuatorCall::SetPulse {
            command: self.command,
            micros,
        });
        Ok(())
    }
}

impl Drop for MockOutput {
    fn drop(&mut self) {
        self.log.borrow_mut().push(ActuatorCall::Release {
            command: self.command,
        });
    }
}

// ── MockPort ──────────────────────────────────────────────────

pub struct MockPort {
    pub log: CallLog,
    /// One script per session, consumed in order.
    sessions: VecDeque<Vec<ReadStep>>,
    pub endless: bool,
    pub link_down: bool,
    pub fail_actuator: Option<Command>,
    pub fail_frames: Option<(Command, OutputError)>,
    pub sources_opened: u32,
    pub uart_seen: Option<UartConfig>,
}

#[allow(dead_code)]
impl MockPort {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
            sessions: VecDeque::new(),
            endless: false,
            link_down: false,
            fail_actuator: None,
            fail_frames: None,
            sources_opened: 0,
            uart_seen: None,
        }
    }

    /// Queue a session that serves `bytes` then reports link loss.
    pub fn with_session(mut self, bytes: &[u8]) -> Self {
        self.sessions.push_back(script(bytes));
        self
    }

    pub fn with_script(mut self, steps: Vec<ReadStep>) -> Self {
        self.sessions.push_back(steps);
        self
    }

    pub fn calls(&self) -> Vec<ActuatorCall> {
        self.log.borrow().clone()
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }

    /// Every width written to `command`, idle writes included.
    pub fn pulses_for(&self, command: Command) -> Vec<i32> {
        self.log
            .borrow()
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::SetPulse { command: c, micros } if *c == command => Some(*micros),
                _ => None,
            })
            .collect()
    }

    pub fn opened(&self) -> Vec<Command> {
        self.log
            .borrow()
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Open { command, .. } => Some(*command),
                _ => None,
            })
            .collect()
    }

    pub fn released(&self) -> Vec<Command> {
        self.log
            .borrow()
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Release { command } => Some(*command),
                _ => None,
            })
            .collect()
    }
}

impl Default for MockPort {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwarePort for MockPort {
    type Source = MockSource;
    type Output = MockOutput;

    fn open_byte_source(&mut self, uart: &UartConfig) -> Result<MockSource, SessionError> {
        if self.link_down {
            return Err(SessionError::LinkUnavailable);
        }
        self.sources_opened += 1;
        self.uart_seen = Some(*uart);
        Ok(MockSource {
            script: self.sessions.pop_front().unwrap_or_default().into(),
            endless: self.endless,
        })
    }

    fn open_actuator(
        &mut self,
        channel: &ChannelConfig,
        update_rate_hz: u32,
    ) -> Result<MockOutput, SessionError> {
        if self.fail_actuator == Some(channel.command) {
            return Err(SessionError::ActuatorOpenFailed(channel.command));
        }
        self.log.borrow_mut().push(ActuatorCall::Open {
            command: channel.command,
            update_rate_hz,
        });
        let mut out = MockOutput::new(channel.command, Rc::clone(&self.log));
        out.fail_frames = self
            .fail_frames
            .filter(|(c, _)| *c == channel.command)
            .map(|(_, e)| e);
        Ok(out)
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn applied(&self) -> Vec<(Command, f32, i32)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::FrameApplied {
                    command,
                    value,
                    pulse_us,
                } => Some((*command, *value, *pulse_us)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Frame helpers ─────────────────────────────────────────────

/// A complete wire frame with zero padding.
pub fn frame(tag: u8, value: f32) -> [u8; FRAME_LEN] {
    match encode_frame(tag, value) {
        Some(f) => f,
        None => panic!("value {value} not encodable"),
    }
}
