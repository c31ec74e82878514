//! Hardware adapter: bridges the node's local peripherals to domain port traits.
//!
//! Bundles the climate sensor, the status LED and a blocking delay so the
//! acquisition loop can take a single `&mut` for all three.  The pulse
//! counter is kept apart: it is owned by the loop itself.

use core::time::Duration;

use crate::app::ports::{DelayPort, IndicatorPort, Measurements, SensorPort};
use crate::error::SensorError;

/// Concrete adapter that combines the local hardware behind port traits.
pub struct HardwareAdapter<S, L, D> {
    sensor: S,
    led: L,
    delay: D,
}

impl<S, L, D> HardwareAdapter<S, L, D>
where
    S: SensorPort,
    L: IndicatorPort,
    D: DelayPort,
{
    pub fn new(sensor: S, led: L, delay: D) -> Self {
        Self { sensor, led, delay }
    }

    pub fn led(&self) -> &L {
        &self.led
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<S: SensorPort, L, D> SensorPort for HardwareAdapter<S, L, D> {
    fn get_measurements(&mut self) -> Result<Measurements, SensorError> {
        self.sensor.get_measurements()
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl<S, L: IndicatorPort, D> IndicatorPort for HardwareAdapter<S, L, D> {
    fn set_colour(&mut self, r: u8, g: u8, b: u8) {
        self.led.set_colour(r, g, b);
    }

    fn off(&mut self) {
        self.led.off();
    }
}

// ── DelayPort implementation ──────────────────────────────────

impl<S, L, D: DelayPort> DelayPort for HardwareAdapter<S, L, D> {
    fn sleep(&mut self, duration: Duration) {
        self.delay.sleep(duration);
    }
}

/// Stand-in for an unpopulated sensor socket; always reports nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSensor;

impl SensorPort for NoSensor {
    fn get_measurements(&mut self) -> Result<Measurements, SensorError> {
        Ok(Measurements::default())
    }
}

/// A sensor whose bus could not be brought up reads as absent.
impl<S: SensorPort> SensorPort for Option<S> {
    fn get_measurements(&mut self) -> Result<Measurements, SensorError> {
        match self {
            Some(sensor) => sensor.get_measurements(),
            None => Ok(Measurements::default()),
        }
    }
}
