//! Acquisition loop: one sample/publish/feed cycle, repeated forever.
//!
//! ```text
//!  sensors ─▶ pulse policy ─▶ Reading ─▶ publish ─▶ feed ─▶ blink ─▶ sleep
//! ```
//!
//! Every step propagates its fault with `?`; there is no per-cycle retry.
//! A failed publish aborts the whole process and the supervisor decides
//! how to restart it.  The feed comes after the publish, so a publish
//! that blocks past the window is reported as an expiry instead of being
//! fed over.

use core::convert::Infallible;
use core::time::Duration;

use log::LevelFilter;

use crate::config::{BLINK_DURATION, MAX_BLINK_DURATION};
use crate::diagnostics;
use crate::error::Fault;
use crate::sensors::pulse::PulseCounter;

use super::events::AppEvent;
use super::ports::{
    DelayPort, EdgeCounter, EventSink, IndicatorPort, SensorPort, TelemetryPort, WatchdogPort,
};
use super::reading::Reading;

/// Liveness colour: blue at 30 % brightness.
pub const BLINK_COLOUR: (u8, u8, u8) = (0, 0, 76);

/// Diagnostics mirror target.
struct Mirror {
    topic: String,
    level: LevelFilter,
}

pub struct AcquisitionLoop<C: EdgeCounter> {
    counter: PulseCounter<C>,
    mqtt_topic: String,
    sleep_duration: Duration,
    blink_duration: Duration,
    mirror: Option<Mirror>,
}

impl<C: EdgeCounter> AcquisitionLoop<C> {
    pub fn new(counter: C, mqtt_topic: impl Into<String>, sleep_duration: Duration) -> Self {
        Self {
            counter: PulseCounter::new(counter),
            mqtt_topic: mqtt_topic.into(),
            sleep_duration,
            blink_duration: BLINK_DURATION,
            mirror: None,
        }
    }

    /// Override the blink length.  Capped so the indication can never
    /// eat into the watchdog window.
    pub fn set_blink_duration(&mut self, duration: Duration) {
        self.blink_duration = duration.min(MAX_BLINK_DURATION);
    }

    pub fn blink_duration(&self) -> Duration {
        self.blink_duration
    }

    /// Mirror every event at or above `level` to `topic`.
    pub fn attach_mirror(&mut self, topic: impl Into<String>, level: LevelFilter) {
        self.mirror = Some(Mirror {
            topic: topic.into(),
            level,
        });
    }

    /// Run cycles until one of them faults.
    pub fn run<H, N, W, S>(
        &mut self,
        hw: &mut H,
        net: &mut N,
        watchdog: &mut W,
        sink: &mut S,
    ) -> Result<Infallible, Fault>
    where
        H: SensorPort + IndicatorPort + DelayPort,
        N: TelemetryPort,
        W: WatchdogPort,
        S: EventSink,
    {
        loop {
            self.run_cycle(hw, net, watchdog, sink)?;
        }
    }

    /// One full cycle.  Returns the reading that was built.
    pub fn run_cycle<H, N, W, S>(
        &mut self,
        hw: &mut H,
        net: &mut N,
        watchdog: &mut W,
        sink: &mut S,
    ) -> Result<Reading, Fault>
    where
        H: SensorPort + IndicatorPort + DelayPort,
        N: TelemetryPort,
        W: WatchdogPort,
        S: EventSink,
    {
        watchdog.check()?;

        // 1. Sensors (absence is not an error)
        let measurements = hw.get_measurements()?;
        self.report(AppEvent::Measurements(measurements), net, sink)?;

        // 2. Pulse counter, reset-on-negative before the read
        let sample = self.counter.read();
        if let Some(previous) = sample.reset_from {
            self.report(AppEvent::CounterReset { previous }, net, sink)?;
        }
        self.report(AppEvent::PulseCount(sample.count), net, sink)?;

        // 3. Reading
        let reading = Reading::new(sample.count, measurements);

        // 4. Publish.  The emptiness guard cannot trigger while `pulses`
        // is mandatory; it stays so a schema without mandatory fields
        // still never publishes `{}`.
        if reading.is_empty() {
            self.report(AppEvent::PublishSkipped, net, sink)?;
        } else {
            let payload = reading.to_payload()?;
            self.report(
                AppEvent::Publishing {
                    topic: self.mqtt_topic.clone(),
                    payload: payload.clone(),
                },
                net,
                sink,
            )?;
            net.publish(&self.mqtt_topic, &payload)?;
        }

        // 5. Feed, only once the publish has returned.  An expiry that
        // happened while it blocked is delivered instead.
        watchdog.check()?;
        self.report(AppEvent::WatchdogFed, net, sink)?;
        watchdog.feed();

        // 6. Liveness blink, bounded
        self.report(AppEvent::Blink, net, sink)?;
        let (r, g, b) = BLINK_COLOUR;
        hw.set_colour(r, g, b);
        hw.sleep(self.blink_duration);
        hw.off();
        diagnostics::record_cycle();

        // 7. Sleep
        self.report(AppEvent::Sleeping(self.sleep_duration), net, sink)?;
        hw.sleep(self.sleep_duration);

        Ok(reading)
    }

    /// Emit locally and, when attached, mirror to the log topic.
    fn report<N: TelemetryPort, S: EventSink>(
        &self,
        event: AppEvent,
        net: &mut N,
        sink: &mut S,
    ) -> Result<(), Fault> {
        sink.emit(&event);
        if let Some(mirror) = &self.mirror {
            if event.level() <= mirror.level {
                net.publish(&mirror.topic, &event.to_string())?;
            }
        }
        Ok(())
    }
}
