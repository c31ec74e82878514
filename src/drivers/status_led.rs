//! RGB status LED driver.
//!
//! Three LEDC PWM channels (CH0-2) drive a common-cathode RGB LED.  The node
//! only uses it to blink once per acquisition cycle.
//!
//! On ESP-IDF the duty registers are written through [`hw_init::ledc_set`];
//! on host the colour is tracked in memory only.

use crate::app::ports::IndicatorPort;
use crate::drivers::hw_init;

#[derive(Default)]
pub struct StatusLed {
    current: (u8, u8, u8),
}

impl StatusLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_colour(&self) -> (u8, u8, u8) {
        self.current
    }

    pub fn is_lit(&self) -> bool {
        self.current != (0, 0, 0)
    }
}

impl IndicatorPort for StatusLed {
    fn set_colour(&mut self, r: u8, g: u8, b: u8) {
        hw_init::ledc_set(hw_init::LEDC_CH_LED_R, r);
        hw_init::ledc_set(hw_init::LEDC_CH_LED_G, g);
        hw_init::ledc_set(hw_init::LEDC_CH_LED_B, b);
        self.current = (r, g, b);
    }

    fn off(&mut self) {
        self.set_colour(0, 0, 0);
    }
}
