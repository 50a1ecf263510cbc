//! Hardware adapter. Bridges the ESP32 UART and LEDC peripherals to
//! the [`HardwarePort`] trait.
//!
//! This is the only module in the system that opens real hardware.  On
//! non-espidf targets the underlying hw_init calls are simulation stubs:
//! channels accept writes and the UART reports the link as gone.
//!
//! LEDC channels are assigned by [`Command::index`], so each actuator
//! keeps the same channel across sessions.

use log::warn;

use crate::app::ports::{ByteSource, HardwarePort};
use crate::config::{ChannelConfig, UartConfig};
use crate::drivers::hw_init::{self, LedcChannel, UartReadError};
use crate::drivers::servo::ServoOutput;
use crate::error::{SessionError, SourceError};

// ── Serial input ──────────────────────────────────────────────

/// The command UART.  Deletes its driver when dropped.
pub struct UartSource {
    port: i32,
}

impl UartSource {
    /// UART port number.
    pub fn port(&self) -> i32 {
        self.port
    }
}

impl ByteSource for UartSource {
    fn read_byte(&mut self) -> Result<u8, SourceError> {
        hw_init::uart_read_byte(self.port).map_err(|e| match e {
            UartReadError::NotConnected => SourceError::LinkLost,
            UartReadError::Failed(rc) => {
                warn!("uart: read failed (rc={})", rc);
                SourceError::Transient
            }
        })
    }
}

impl Drop for UartSource {
    fn drop(&mut self) {
        hw_init::uart_close(self.port);
    }
}

// ── HardwarePort implementation ───────────────────────────────

/// Concrete adapter that opens the real peripherals.
#[derive(Debug, Default)]
pub struct HardwareAdapter {
    sessions: u32,
}

impl HardwareAdapter {
    /// Adapter with no session opened yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of serial inputs opened so far.
    pub fn sessions_opened(&self) -> u32 {
        self.sessions
    }
}

impl HardwarePort for HardwareAdapter {
    type Source = UartSource;
    type Output = ServoOutput<LedcChannel>;

    fn open_byte_source(&mut self, uart: &UartConfig) -> Result<UartSource, SessionError> {
        hw_init::uart_open(uart).map_err(|e| {
            warn!("hardware: {}", e);
            SessionError::SourceOpenFailed
        })?;
        self.sessions += 1;
        Ok(UartSource { port: uart.port })
    }

    fn open_actuator(
        &mut self,
        channel: &ChannelConfig,
        update_rate_hz: u32,
    ) -> Result<ServoOutput<LedcChannel>, SessionError> {
        let ledc = hw_init::ledc_servo_channel(
            channel.command.index() as u32,
            channel.pin,
            update_rate_hz,
        )
        .map_err(|e| {
            warn!("hardware: {} channel: {}", channel.command, e);
            SessionError::ActuatorOpenFailed(channel.command)
        })?;
        Ok(ServoOutput::new(ledc, update_rate_hz))
    }
}
