//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing control events to the ESP-IDF
//! logger (UART0 / USB-CDC in production).  Per-frame events go out at
//! debug level so a 9600-baud command stream does not flood the console.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    frames: u64,
}

impl LogEventSink {
    /// A sink with its frame counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames applied since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::SessionEstablished { actuators } => {
                info!("SESSION | established, {} actuators at idle", actuators);
            }
            AppEvent::SessionFailed(e) => {
                warn!("SESSION | failed: {}", e);
            }
            AppEvent::SessionLost(end) => {
                info!("SESSION | ended ({:?}) after {} frames", end, self.frames);
            }
            AppEvent::FrameApplied {
                command,
                value,
                pulse_us,
            } => {
                self.frames += 1;
                debug!("FRAME | {} value={} -> {}us", command, value, pulse_us);
            }
            AppEvent::Resynchronized => {
                debug!("FRAME | resync on '/'");
            }
            AppEvent::ReadFailed => {
                warn!("LINK | transient read failure");
            }
            AppEvent::DispatchFailed(e) => {
                warn!("FRAME | dropped: {}", e);
            }
        }
    }
}
