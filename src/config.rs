//! Controller configuration.
//!
//! Link parameters, actuator channels and their idle pulse widths, and
//! the wire tag bindings.  Values can be overridden by a JSON document
//! (provisioning) or a postcard blob kept in NVS (see
//! [`adapters::nvs`](crate::adapters::nvs)).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pins;
use crate::protocol::{Command, TagTable};

/// Serial command link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UartConfig {
    pub port: i32,
    pub rx_pin: i32,
    pub tx_pin: i32,
    pub baud_rate: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            port: pins::CMD_UART_PORT,
            rx_pin: pins::CMD_UART_RX_GPIO,
            tx_pin: pins::CMD_UART_TX_GPIO,
            baud_rate: pins::CMD_UART_BAUD,
        }
    }
}

/// Optional clamp window for a channel, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseLimits {
    pub min_us: i32,
    pub max_us: i32,
}

impl PulseLimits {
    /// Clamp `micros` into the window.  An inverted window (rejected by
    /// `validate`) resolves to `max_us` instead of panicking.
    pub fn clamp(&self, micros: i32) -> i32 {
        micros.max(self.min_us).min(self.max_us)
    }
}

/// One pulse-width actuator channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub command: Command,
    pub pin: i32,
    /// Width written when a session starts.
    pub idle_pulse_us: i32,
    /// Disabled channels are never opened.
    pub enabled: bool,
    /// `None` forwards decoded widths untouched.
    pub limits: Option<PulseLimits>,
}

impl ChannelConfig {
    const fn new(command: Command, pin: i32, idle_pulse_us: i32) -> Self {
        Self {
            command,
            pin,
            idle_pulse_us,
            enabled: true,
            limits: None,
        }
    }
}

/// Core controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlConfig {
    pub uart: UartConfig,
    /// Update rate requested for every actuator channel.
    pub pwm_frequency_hz: u32,
    /// Indexed by [`Command::index`].
    pub channels: [ChannelConfig; Command::COUNT],
    pub tags: TagTable,
    /// Pause after each loop iteration; 0 only yields the thread.
    pub loop_pause_ms: u32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            uart: UartConfig::default(),
            pwm_frequency_hz: pins::SERVO_PWM_FREQ_HZ,
            channels: [
                ChannelConfig::new(Command::Pan, pins::PAN_PWM_GPIO, 1550),
                ChannelConfig::new(Command::Tilt, pins::TILT_PWM_GPIO, 1800),
                ChannelConfig::new(Command::Motor, pins::MOTOR_PWM_GPIO, 1500),
                ChannelConfig::new(Command::Wheels, pins::WHEELS_PWM_GPIO, 1475),
            ],
            tags: TagTable::default(),
            loop_pause_ms: 1,
        }
    }
}

impl ControlConfig {
    /// Channel entry for `command` (channels are in command order once validated).
    pub fn channel(&self, command: Command) -> &ChannelConfig {
        &self.channels[command.index()]
    }

    /// PWM period in microseconds.
    pub fn pwm_period_us(&self) -> u32 {
        1_000_000 / self.pwm_frequency_hz.max(1)
    }

    /// Check every field; rejects rather than clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uart.baud_rate == 0 {
            return Err(ConfigError::Invalid("uart.baud_rate must be non-zero"));
        }
        if !(pins::SERVO_PWM_FREQ_MIN_HZ..=pins::SERVO_PWM_FREQ_MAX_HZ).contains(&self.pwm_frequency_hz) {
            return Err(ConfigError::Invalid("pwm_frequency_hz outside the LEDC timer range"));
        }

        let period = self.pwm_period_us() as i32;
        for (i, ch) in self.channels.iter().enumerate() {
            if ch.command.index() != i {
                return Err(ConfigError::Invalid("channels must be in pan/tilt/motor/wheels order"));
            }
            if ch.idle_pulse_us < 0 || ch.idle_pulse_us > period {
                return Err(ConfigError::Invalid("idle_pulse_us must fit in one PWM period"));
            }
            if let Some(l) = ch.limits {
                if l.min_us > l.max_us {
                    return Err(ConfigError::Invalid("limits.min_us above limits.max_us"));
                }
            }
        }

        self.tags
            .check()
            .map_err(|_| ConfigError::Invalid("tags must be unique and not '/'"))?;
        for b in self.tags.bindings() {
            if !self.channel(b.command).enabled {
                return Err(ConfigError::Invalid("tag bound to a disabled channel"));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| {
            log::warn!("config: JSON rejected: {}", e);
            ConfigError::Parse
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Decode and validate a postcard blob (flash copy).
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        let cfg: Self = postcard::from_bytes(bytes).map_err(|e| {
            log::warn!("config: postcard blob rejected: {}", e);
            ConfigError::Parse
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate, then encode for flash.
    pub fn to_postcard(&self) -> Result<Vec<u8>, ConfigError> {
        self.validate()?;
        postcard::to_allocvec(self).map_err(|e| {
            log::warn!("config: postcard encode failed: {}", e);
            ConfigError::Storage
        })
    }
}
