//! Servo / ESC pulse driver.
//!
//! Turns a pulse width in microseconds into a raw duty cycle on any
//! `embedded_hal::pwm::SetDutyCycle` channel running at a fixed update
//! rate.  At 100 Hz the period is 10 000 us, so a 1500 us pulse is 15 %
//! duty.
//!
//! ## Dual-target design
//!
//! On ESP-IDF the channel is an LEDC channel from hw_init.
//! On host/test any `SetDutyCycle` fake works.

use embedded_hal::pwm::{Error as _, SetDutyCycle};
use log::{trace, warn};

use crate::app::ports::PulseOutput;
use crate::error::OutputError;

/// Pulse-width output over one PWM channel.
pub struct ServoOutput<P: SetDutyCycle> {
    pwm: P,
    period_us: u32,
    last_us: Option<i32>,
}

impl<P: SetDutyCycle> ServoOutput<P> {
    /// Wrap `pwm`, which must already be running at `update_rate_hz`.
    pub fn new(pwm: P, update_rate_hz: u32) -> Self {
        Self {
            pwm,
            period_us: 1_000_000 / update_rate_hz.max(1),
            last_us: None,
        }
    }

    /// PWM period in microseconds.
    pub fn period_us(&self) -> u32 {
        self.period_us
    }

    /// Last pulse width accepted, before saturation.
    pub fn last_pulse_us(&self) -> Option<i32> {
        self.last_us
    }

    /// Raw duty for `micros`, saturated to `[0, period]`.
    pub fn duty_for(&self, micros: i32) -> u16 {
        let period = u64::from(self.period_us);
        let us = u64::from(micros.max(0).unsigned_abs()).min(period);
        let max = u64::from(self.pwm.max_duty_cycle());
        (us * max / period) as u16
    }

    /// The wrapped PWM channel.
    pub fn inner(&self) -> &P {
        &self.pwm
    }
}

impl<P: SetDutyCycle> PulseOutput for ServoOutput<P> {
    fn set_pulse_width(&mut self, micros: i32) -> Result<(), OutputError> {
        if micros < 0 || micros.unsigned_abs() > self.period_us {
            warn!("servo: {}us outside 0..={}us, saturating", micros, self.period_us);
        }
        let duty = self.duty_for(micros);
        self.pwm.set_duty_cycle(duty).map_err(|e| {
            warn!("servo: duty write failed: {:?}", e.kind());
            OutputError::WriteFailed
        })?;
        trace!("servo: {}us -> duty {}", micros, duty);
        self.last_us = Some(micros);
        Ok(())
    }
}

impl<P: SetDutyCycle> Drop for ServoOutput<P> {
    fn drop(&mut self) {
        // Stop pulsing; ESCs read a missing signal as neutral.
        let _ = self.pwm.set_duty_cycle_fully_off();
    }
}
