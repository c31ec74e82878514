//! Sensor subsystem.
//!
//! - [`climate`]: optional SHT4x temperature/humidity sensor (I2C).
//! - [`pulse`]: free-running edge counter and its wrap policy.

pub mod climate;
pub mod pulse;
