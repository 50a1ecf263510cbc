//! GPIO / peripheral assignments for the IronTrack controller board.
//!
//! Defaults for [`ControlConfig`](crate::config::ControlConfig); every
//! driver takes its pin from config rather than from here.

// ---------------------------------------------------------------------------
// Command link (UART from the radio bridge)
// ---------------------------------------------------------------------------

/// UART peripheral carrying the command stream.
pub const CMD_UART_PORT: i32 = 1;
/// Receive pin (controller TX).
pub const CMD_UART_RX_GPIO: i32 = 5;
/// Transmit pin, unused by the protocol.
pub const CMD_UART_TX_GPIO: i32 = 4;
/// 8N1.
pub const CMD_UART_BAUD: u32 = 9600;

// ---------------------------------------------------------------------------
// Pulse-width outputs (servo / ESC headers)
// ---------------------------------------------------------------------------

/// Camera pan servo.
pub const PAN_PWM_GPIO: i32 = 10;
/// Camera tilt servo.
pub const TILT_PWM_GPIO: i32 = 6;
/// Drive motor ESC (screw terminal).
pub const MOTOR_PWM_GPIO: i32 = 11;
/// Front-wheel steering servo.
pub const WHEELS_PWM_GPIO: i32 = 12;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Servo update rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 100;
/// LEDC timer resolution (bits).  14 bits at 100 Hz gives ~0.6 µs steps.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;

/// Clock feeding the servo LEDC timer (APB).
pub const LEDC_SOURCE_CLOCK_HZ: u32 = 80_000_000;
/// Fastest rate the timer reaches at full resolution.
pub const SERVO_PWM_FREQ_MAX_HZ: u32 = LEDC_SOURCE_CLOCK_HZ >> SERVO_PWM_RESOLUTION_BITS;
/// Slowest rate: the timer's integer divider tops out at 1024.
pub const SERVO_PWM_FREQ_MIN_HZ: u32 = SERVO_PWM_FREQ_MAX_HZ / 1024 + 1;
