//! Blocking delay adapter.
//!
//! - **`target_os = "espidf"`**: `FreeRtos::delay_ms`, which yields the
//!   calling task to the scheduler instead of spinning.
//! - **`not(target_os = "espidf")`**: `std::thread::sleep`.

use core::time::Duration;

use crate::app::ports::DelayPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDelay;

impl SystemDelay {
    pub fn new() -> Self {
        Self
    }
}

impl DelayPort for SystemDelay {
    #[cfg(target_os = "espidf")]
    fn sleep(&mut self, duration: Duration) {
        let ms = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(target_os = "espidf"))]
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
