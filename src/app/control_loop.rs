//! The control loop: read, decode, dispatch, yield.
//!
//! ```text
//!  ByteSource ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │       ControlLoop         │
//!  PulseOutput ◀──│  FrameDecoder · Dispatcher│
//!                 └──────────────────────────┘
//! ```
//!
//! One logical thread of control: a blocking single-byte read, a
//! synchronous decode, at most one actuator write, then a short pause.
//! Iterations never overlap and the decoder is never shared, so nothing
//! here needs locking.  Lifecycle notices are only checked between
//! iterations.

use std::time::Duration;

use log::{debug, info, warn};

use crate::config::ControlConfig;
use crate::error::{DispatchError, SessionError, SourceError};
use crate::protocol::{FrameDecoder, FrameEvent};

use super::dispatcher::Dispatcher;
use super::events::{AppEvent, SessionEnd};
use super::lifecycle::{Notice, SessionNotices};
use super::ports::{ByteSource, EventSink, HardwarePort, HardwareSession, PulseOutput};

/// Running counters, kept across sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub bytes: u64,
    pub frames: u64,
    pub resyncs: u64,
    pub read_errors: u64,
    pub write_errors: u64,
    pub unmapped: u64,
}

/// Decoder, dispatcher and counters driven one byte at a time.
pub struct ControlLoop {
    config: ControlConfig,
    decoder: FrameDecoder,
    dispatcher: Dispatcher,
    stats: LoopStats,
}

impl ControlLoop {
    /// Build a loop over `config`.
    ///
    /// An invalid config is logged but still used; dispatch never panics
    /// on it.
    pub fn new(config: ControlConfig) -> Self {
        if let Err(e) = config.validate() {
            warn!("loop: config failed validation: {}", e);
        }
        let decoder = FrameDecoder::with_tags(config.tags.clone());
        let dispatcher = Dispatcher::new(&config);
        Self {
            config,
            decoder,
            dispatcher,
            stats: LoopStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Open the serial input and every enabled actuator, parking each
    /// at its idle pulse width.
    ///
    /// On error the partially opened peripherals are dropped again.
    pub fn on_session_established<P: HardwarePort>(
        &mut self,
        port: &mut P,
    ) -> Result<HardwareSession<P::Source, P::Output>, SessionError> {
        self.decoder.reset();

        let source = port.open_byte_source(&self.config.uart)?;
        let mut session = HardwareSession::new(source);

        for ch in self.config.channels.iter().filter(|c| c.enabled) {
            let mut output = port.open_actuator(ch, self.config.pwm_frequency_hz)?;
            output.set_pulse_width(ch.idle_pulse_us).map_err(|e| {
                warn!("session: {} idle write failed: {}", ch.command, e);
                SessionError::IdleWriteFailed(ch.command)
            })?;
            debug!("session: {} on pin {} idle at {}us", ch.command, ch.pin, ch.idle_pulse_us);
            session.actuators.insert(ch.command, output);
        }

        info!(
            "session: established ({} actuators, {} baud)",
            session.actuators.open_count(),
            self.config.uart.baud_rate
        );
        Ok(session)
    }

    /// Release the session's handles and forget any partial frame.
    pub fn on_session_lost<S, O>(&mut self, mut session: HardwareSession<S, O>) {
        session.actuators.release_all();
        drop(session);
        self.decoder.reset();
        info!("session: released");
    }

    // ── Per-iteration work ────────────────────────────────────

    /// One read → decode → dispatch cycle.
    ///
    /// `Err` means the session is over; everything else is handled here.
    pub fn step<S: ByteSource, O: PulseOutput>(
        &mut self,
        session: &mut HardwareSession<S, O>,
        sink: &mut impl EventSink,
    ) -> Result<(), SessionEnd> {
        let byte = match session.source.read_byte() {
            Ok(b) => b,
            Err(SourceError::LinkLost) => return Err(SessionEnd::LinkLost),
            Err(SourceError::Transient) => {
                self.stats.read_errors += 1;
                warn!("loop: transient read failure, continuing");
                sink.emit(&AppEvent::ReadFailed);
                return Ok(());
            }
        };
        self.stats.bytes += 1;

        match self.decoder.feed(byte) {
            FrameEvent::Incomplete => {}
            FrameEvent::Resynchronized => {
                self.stats.resyncs += 1;
                sink.emit(&AppEvent::Resynchronized);
            }
            FrameEvent::FrameReady { command, value } => {
                self.stats.frames += 1;
                match self.dispatcher.dispatch(command, value, &mut session.actuators) {
                    Ok(pulse_us) => sink.emit(&AppEvent::FrameApplied {
                        command,
                        value,
                        pulse_us,
                    }),
                    Err(DispatchError::LinkLost) => return Err(SessionEnd::LinkLost),
                    Err(e) => {
                        match e {
                            DispatchError::Unmapped(_) => self.stats.unmapped += 1,
                            _ => self.stats.write_errors += 1,
                        }
                        warn!("loop: frame dropped: {}", e);
                        sink.emit(&AppEvent::DispatchFailed(e));
                    }
                }
            }
        }
        Ok(())
    }

    /// Run until the link drops or a notice arrives.
    pub fn run_session<S: ByteSource, O: PulseOutput>(
        &mut self,
        session: &mut HardwareSession<S, O>,
        notices: &SessionNotices,
        sink: &mut impl EventSink,
    ) -> SessionEnd {
        loop {
            if let Some(notice) = notices.try_take() {
                return match notice {
                    Notice::SessionLost => SessionEnd::LostNotice,
                    Notice::Shutdown => SessionEnd::Shutdown,
                };
            }
            if let Err(end) = self.step(session, sink) {
                return end;
            }
            self.pace();
        }
    }

    /// A whole session: establish, run, release.
    ///
    /// Notices queued before the call belong to an earlier session and
    /// are dropped, except a shutdown, which returns at once without
    /// touching the hardware.  Never reconnects; the caller decides
    /// whether to call again.
    pub fn run<P: HardwarePort>(
        &mut self,
        port: &mut P,
        notices: &SessionNotices,
        sink: &mut impl EventSink,
    ) -> Result<SessionEnd, SessionError> {
        if notices.drain_stale() {
            info!("session: shutdown pending, not connecting");
            return Ok(SessionEnd::Shutdown);
        }

        let mut session = match self.on_session_established(port) {
            Ok(s) => s,
            Err(e) => {
                sink.emit(&AppEvent::SessionFailed(e));
                return Err(e);
            }
        };
        sink.emit(&AppEvent::SessionEstablished {
            actuators: session.actuators.open_count(),
        });

        let end = self.run_session(&mut session, notices, sink);
        self.on_session_lost(session);
        sink.emit(&AppEvent::SessionLost(end));
        Ok(end)
    }

    // ── Queries ───────────────────────────────────────────────

    /// Counters accumulated over every session so far.
    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// The frame decoder, for inspection.
    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// The config the loop was built with.
    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn pace(&self) {
        match self.config.loop_pause_ms {
            0 => std::thread::yield_now(),
            ms => std::thread::sleep(Duration::from_millis(u64::from(ms))),
        }
    }
}
