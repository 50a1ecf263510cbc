//! IronTrack Firmware — Main Entry Point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                  │
//! │                                                          │
//! │   HardwareAdapter (UART + LEDC)      LogEventSink        │
//! │                                                          │
//! │   ─────────────── Port Trait Boundary ───────────────    │
//! │                                                          │
//! │   ┌──────────────────────────────────────────────────┐   │
//! │   │          ControlLoop (pure logic)                │   │
//! │   │   FrameDecoder · Dispatcher                      │   │
//! │   └──────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each pass of the outer loop is one session.  A session that ends on
//! link loss is re-established after a short pause; only a shutdown
//! notice leaves the loop.

use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use irontrack::adapters::hardware::HardwareAdapter;
use irontrack::adapters::log_sink::LogEventSink;
use irontrack::adapters::nvs::NvsConfigStore;
use irontrack::app::control_loop::ControlLoop;
use irontrack::app::events::SessionEnd;
use irontrack::app::lifecycle::SessionNotices;
use irontrack::app::ports::ConfigPort;
use irontrack::config::ControlConfig;

/// Pause before re-opening the peripherals after a session ends.
const RECONNECT_PAUSE: Duration = Duration::from_millis(500);

/// Lifecycle notices; other contexts post here.
static NOTICES: SessionNotices = SessionNotices::new();

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  IronTrack v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsConfigStore::new().and_then(|nvs| nvs.load()) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            ControlConfig::default()
        }
    };
    config.validate().map_err(irontrack::Error::from)?;
    info!(
        "Config: UART{} rx={} tx={} @ {} baud, PWM {} Hz",
        config.uart.port,
        config.uart.rx_pin,
        config.uart.tx_pin,
        config.uart.baud_rate,
        config.pwm_frequency_hz
    );

    // ── 3. Adapters + control core ────────────────────────────
    let mut hardware = HardwareAdapter::new();
    let mut sink = LogEventSink::new();
    let mut control = ControlLoop::new(config);

    // ── 4. Session loop ───────────────────────────────────────
    loop {
        match control.run(&mut hardware, &NOTICES, &mut sink) {
            Ok(SessionEnd::Shutdown) => break,
            Ok(end) => info!("Session ended ({:?}), reconnecting", end),
            // A shutdown posted meanwhile is seen by the next `run`.
            Err(e) => warn!("Session setup failed ({}), retrying", e),
        }
        std::thread::sleep(RECONNECT_PAUSE);
    }

    let stats = control.stats();
    info!(
        "Shutdown: {} sessions, {} bytes, {} frames, {} resyncs",
        hardware.sessions_opened(),
        stats.bytes,
        stats.frames,
        stats.resyncs
    );
    Ok(())
}
