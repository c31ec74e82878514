//! Hardware initialisation, the status LED and the watchdog.

pub mod hw_init;
pub mod status_led;
pub mod watchdog;
