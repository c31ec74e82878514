//! GPIO / peripheral pin assignments for the PulseNode board
//! (ESP32-S3 Feather-style layout).
//!
//! Every driver references this module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Pulse input
// ---------------------------------------------------------------------------

/// Monitored signal (e.g. an S0 meter output).  Counted on rising edges.
pub const PULSE_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// I²C bus (STEMMA QT connector)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 3;
pub const I2C_SCL_GPIO: i32 = 4;
/// Standard-mode clock.
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Status LED (discrete RGB on LEDC)
// ---------------------------------------------------------------------------

pub const LED_R_GPIO: i32 = 11;
pub const LED_G_GPIO: i32 = 12;
pub const LED_B_GPIO: i32 = 13;

/// LEDC frequency for the RGB status LED.
pub const LED_PWM_FREQ_HZ: u32 = 1_000;
