//! Session lifecycle notices.
//!
//! The session manager runs in other contexts (USB host callbacks, a
//! supervisor thread) and cannot touch the loop's state.  It posts a
//! [`Notice`] here instead; the loop drains the channel between
//! iterations, never mid-frame.
//!
//! ```text
//! ┌─────────────────┐  Notice   ┌──────────────┐
//! │ Session manager │─────────▶│ Control loop │
//! │ (any context)   │           │ (one thread) │
//! └─────────────────┘           └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, warn};

/// Channel depth for lifecycle notices.
const NOTICE_DEPTH: usize = 4;

/// Posted by the session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The hardware link dropped.
    SessionLost,
    /// The process is being torn down.
    Shutdown,
}

/// Bounded notice channel shared between the manager and the loop.
pub struct SessionNotices {
    channel: Channel<CriticalSectionRawMutex, Notice, NOTICE_DEPTH>,
}

impl SessionNotices {
    /// An empty channel; usable in a `static`.
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Post a notice.  A full channel already holds a stop request, so
    /// dropping the extra one loses nothing.
    pub fn post(&self, notice: Notice) {
        if self.channel.try_send(notice).is_err() {
            warn!("lifecycle: notice channel full, dropping {:?}", notice);
        }
    }

    /// Report that the hardware link dropped.
    pub fn notify_lost(&self) {
        self.post(Notice::SessionLost);
    }

    /// Ask the loop to stop for good.
    pub fn request_shutdown(&self) {
        self.post(Notice::Shutdown);
    }

    /// Take the next pending notice, if any.
    pub fn try_take(&self) -> Option<Notice> {
        self.channel.try_receive().ok()
    }

    /// Drop notices left over from an earlier session.
    ///
    /// A loss notice can arrive after the loop already saw the same loss
    /// on its own; it must not end the next session.  Returns `true` if a
    /// shutdown was among the drained notices.
    pub fn drain_stale(&self) -> bool {
        let mut shutdown = false;
        let mut dropped = 0usize;
        while let Some(notice) = self.try_take() {
            match notice {
                Notice::Shutdown => shutdown = true,
                Notice::SessionLost => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!("lifecycle: dropped {} stale loss notice(s)", dropped);
        }
        shutdown
    }
}

impl Default for SessionNotices {
    fn default() -> Self {
        Self::new()
    }
}
