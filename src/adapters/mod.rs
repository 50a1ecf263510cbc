//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                    |
//! |------------|--------------|--------------------------------|
//! | `hardware` | HardwarePort | ESP32 UART driver, LEDC PWM    |
//! |            | ByteSource   |                                |
//! | `log_sink` | EventSink    | Serial log output              |
//! | `nvs`      | ConfigPort   | NVS / in-memory store          |
//! | `reader`   | ByteSource   | Any `std::io::Read` stream     |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod reader;
