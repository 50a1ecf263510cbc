//! Actuator dispatch.
//!
//! Turns a decoded `(command, value)` pair into exactly one pulse-width
//! write on the matching actuator.  No batching, no debouncing: every
//! completed frame is applied as it arrives.

use log::{debug, error, warn};

use crate::config::{ControlConfig, PulseLimits};
use crate::error::DispatchError;
use crate::protocol::Command;

use super::ports::{ActuatorBank, PulseOutput};

/// Convert a decoded value to a pulse width in microseconds.
///
/// Truncates toward zero and saturates at the `i32` range; NaN maps
/// to 0.
pub fn pulse_width_from_value(value: f32) -> i32 {
    value as i32
}

/// Routes decoded frames to actuators.
pub struct Dispatcher {
    limits: [Option<PulseLimits>; Command::COUNT],
}

impl Dispatcher {
    /// Take each channel's limits, keyed by the channel's own command.
    pub fn new(config: &ControlConfig) -> Self {
        let mut limits = [None; Command::COUNT];
        for ch in &config.channels {
            limits[ch.command.index()] = ch.limits;
        }
        Self { limits }
    }

    /// Write `value` to the actuator for `command`.
    ///
    /// Returns the pulse width written.
    pub fn dispatch<O: PulseOutput>(
        &self,
        command: Command,
        value: f32,
        actuators: &mut ActuatorBank<O>,
    ) -> Result<i32, DispatchError> {
        let Some(output) = actuators.get_mut(command) else {
            error!("dispatch: no open actuator for {} (value {})", command, value);
            return Err(DispatchError::Unmapped(command));
        };

        let mut micros = pulse_width_from_value(value);
        if let Some(limits) = self.limits[command.index()] {
            let clamped = limits.clamp(micros);
            if clamped != micros {
                warn!("dispatch: {} {}us clamped to {}us", command, micros, clamped);
                micros = clamped;
            }
        }

        debug!("dispatch: {} <- {}us", command, micros);
        output
            .set_pulse_width(micros)
            .map_err(|e| DispatchError::from_output(command, e))?;
        Ok(micros)
    }
}
