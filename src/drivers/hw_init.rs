//! Peripheral bring-up for the command UART and the servo LEDC channels.
//!
//! Raw ESP-IDF sys calls on target.  On the host every function is a
//! simulation stub: channels accept writes, the UART reports no link.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use embedded_hal::pwm::{ErrorKind, ErrorType, SetDutyCycle};
use log::info;

use crate::config::UartConfig;
use crate::pins;

// ── Error types ───────────────────────────────────────────────

/// Errors during peripheral setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    UartConfigFailed(i32),
    UartDriverFailed(i32),
    LedcTimerFailed(i32),
    LedcChannelFailed(i32),
    /// Only a handful of LEDC channels exist.
    NoSuchChannel(u32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UartConfigFailed(rc)  => write!(f, "UART param/pin config failed (rc={})", rc),
            Self::UartDriverFailed(rc)  => write!(f, "UART driver install failed (rc={})", rc),
            Self::LedcTimerFailed(rc)   => write!(f, "LEDC timer config failed (rc={})", rc),
            Self::LedcChannelFailed(rc) => write!(f, "LEDC channel config failed (rc={})", rc),
            Self::NoSuchChannel(ch)     => write!(f, "LEDC channel {} out of range", ch),
        }
    }
}

/// Outcome of a failed UART read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartReadError {
    /// Driver gone (deleted, or never installed).
    NotConnected,
    /// The driver returned an error code.
    Failed(i32),
}

// ── UART ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const UART_RX_BUF_SIZE: i32 = 256;

#[cfg(target_os = "espidf")]
const UART_PIN_NO_CHANGE: i32 = -1;

/// Install the UART driver with `cfg`.
#[cfg(target_os = "espidf")]
pub fn uart_open(cfg: &UartConfig) -> Result<(), HwInitError> {
    let uart_cfg = uart_config_t {
        baud_rate: cfg.baud_rate as i32,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };

    // SAFETY: the port is owned by the caller's session; no other code
    // touches this UART between open and close.
    unsafe {
        let ret = uart_param_config(cfg.port, &uart_cfg);
        if ret != ESP_OK as i32 { return Err(HwInitError::UartConfigFailed(ret)); }

        let ret = uart_set_pin(cfg.port, cfg.tx_pin, cfg.rx_pin, UART_PIN_NO_CHANGE, UART_PIN_NO_CHANGE);
        if ret != ESP_OK as i32 { return Err(HwInitError::UartConfigFailed(ret)); }

        let ret = uart_driver_install(cfg.port, UART_RX_BUF_SIZE, 0, 0, core::ptr::null_mut(), 0);
        if ret != ESP_OK as i32 { return Err(HwInitError::UartDriverFailed(ret)); }
    }

    info!("hw_init: UART{} open (rx={}, tx={}, {} baud)", cfg.port, cfg.rx_pin, cfg.tx_pin, cfg.baud_rate);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn uart_open(cfg: &UartConfig) -> Result<(), HwInitError> {
    info!("hw_init(sim): UART{} open skipped", cfg.port);
    Ok(())
}

/// Block until one byte arrives.
#[cfg(target_os = "espidf")]
pub fn uart_read_byte(port: i32) -> Result<u8, UartReadError> {
    let mut byte = 0u8;
    // SAFETY: `byte` outlives the call; length 1 matches the buffer.
    let n = unsafe {
        uart_read_bytes(port, (&raw mut byte).cast(), 1, TickType_t::MAX)
    };
    match n {
        1 => Ok(byte),
        // Blocking forever only returns early if the driver went away.
        0 => Err(UartReadError::NotConnected),
        rc if unsafe { uart_is_driver_installed(port) } => Err(UartReadError::Failed(rc)),
        _ => Err(UartReadError::NotConnected),
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn uart_read_byte(_port: i32) -> Result<u8, UartReadError> {
    Err(UartReadError::NotConnected)
}

/// Remove the UART driver.
#[cfg(target_os = "espidf")]
pub fn uart_close(port: i32) {
    // SAFETY: deleting a driver that is not installed is a checked no-op.
    let ret = unsafe { uart_driver_delete(port) };
    if ret != ESP_OK as i32 {
        log::warn!("hw_init: UART{} delete returned {}", port, ret);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn uart_close(_port: i32) {}

// ── LEDC servo channels ───────────────────────────────────────

/// Usable LEDC channels (low-speed group).
pub const LEDC_CHANNELS: u32 = 8;

/// Maximum raw duty at the servo timer resolution.
pub const SERVO_MAX_DUTY: u16 = ((1u32 << pins::SERVO_PWM_RESOLUTION_BITS) - 1) as u16;

#[cfg(target_os = "espidf")]
fn ledc_timer_init(freq_hz: u32) -> Result<(), HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_14_BIT,
        freq_hz,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: reconfiguring timer 0 with identical settings is idempotent;
    // only session setup calls this, from the control thread.
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcTimerFailed(ret)); }
    Ok(())
}

/// Configure `channel` on `gpio` for servo pulses at `freq_hz`.
#[cfg(target_os = "espidf")]
pub fn ledc_servo_channel(channel: u32, gpio: i32, freq_hz: u32) -> Result<LedcChannel, HwInitError> {
    if channel >= LEDC_CHANNELS {
        return Err(HwInitError::NoSuchChannel(channel));
    }
    ledc_timer_init(freq_hz)?;

    // SAFETY: channel index checked above; timer 0 configured.
    let ret = unsafe { ledc_channel_config(&ledc_channel_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        channel,
        timer_sel: ledc_timer_t_LEDC_TIMER_0,
        gpio_num: gpio,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    }) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcChannelFailed(ret)); }

    info!("hw_init: LEDC CH{} on GPIO{} at {} Hz", channel, gpio, freq_hz);
    Ok(LedcChannel { channel })
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_servo_channel(channel: u32, gpio: i32, freq_hz: u32) -> Result<LedcChannel, HwInitError> {
    if channel >= LEDC_CHANNELS {
        return Err(HwInitError::NoSuchChannel(channel));
    }
    info!("hw_init(sim): LEDC CH{} on GPIO{} at {} Hz", channel, gpio, freq_hz);
    Ok(LedcChannel { channel, duty: 0 })
}

/// One configured LEDC channel.  Stops its output when dropped.
#[derive(Debug)]
pub struct LedcChannel {
    channel: u32,
    #[cfg(not(target_os = "espidf"))]
    duty: u16,
}

impl LedcChannel {
    /// LEDC channel number.
    pub fn channel(&self) -> u32 {
        self.channel
    }

    /// Last raw duty written (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_duty(&self) -> u16 {
        self.duty
    }
}

/// Raw ESP-IDF error code from an LEDC call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedcError(pub i32);

impl embedded_hal::pwm::Error for LedcError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl ErrorType for LedcChannel {
    type Error = LedcError;
}

impl SetDutyCycle for LedcChannel {
    fn max_duty_cycle(&self) -> u16 {
        SERVO_MAX_DUTY
    }

    #[cfg(target_os = "espidf")]
    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), LedcError> {
        // SAFETY: channel configured in ledc_servo_channel(); only the
        // control thread writes duty registers.
        unsafe {
            let ret = ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, self.channel, u32::from(duty));
            if ret != ESP_OK as i32 { return Err(LedcError(ret)); }
            let ret = ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, self.channel);
            if ret != ESP_OK as i32 { return Err(LedcError(ret)); }
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), LedcError> {
        self.duty = duty;
        Ok(())
    }
}

impl Drop for LedcChannel {
    fn drop(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: stopping a configured channel; output idles low.
            let ret = unsafe { ledc_stop(ledc_mode_t_LEDC_LOW_SPEED_MODE, self.channel, 0) };
            if ret != ESP_OK as i32 {
                log::warn!("hw_init: LEDC CH{} stop returned {}", self.channel, ret);
            }
        }
        #[cfg(not(target_os = "espidf"))]
        log::debug!("hw_init(sim): LEDC CH{} released", self.channel);
    }
}
