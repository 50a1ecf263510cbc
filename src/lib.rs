//! IronTrack rover controller library.
//!
//! Decodes the radio bridge's serial command frames and drives the
//! rover's pulse-width actuators.  Everything except the peripheral
//! calls in `drivers::hw_init` runs on the host, so the whole control
//! path is testable against fakes.  ESP-IDF code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod pins;
pub mod protocol;

pub mod adapters;
pub mod drivers;

pub use error::{Error, Result};
