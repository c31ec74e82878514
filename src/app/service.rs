//! Node service: bring-up plus the acquisition loop.
//!
//! This is the body the [`FaultSupervisor`](super::supervisor::FaultSupervisor)
//! runs.  Everything from config loading onwards happens inside the
//! supervised boundary, so a missing secret, a radio that will not
//! associate or a broker that never answers all end up classified and
//! recovered from like a fault in the loop itself.
//!
//! ```text
//!  deferred fault? ─▶ config ─▶ arm watchdog ─▶ Wi-Fi ─▶ broker ─▶ mirror? ─▶ loop
//! ```

use core::convert::Infallible;

use log::info;

use crate::config::{ESTIMATED_RUN_TIME, WIFI_CONNECT_TIMEOUT};
use crate::error::Fault;

use super::acquisition::AcquisitionLoop;
use super::events::AppEvent;
use super::ports::{
    ConfigPort, ConnectivityPort, DelayPort, EdgeCounter, EventSink, IndicatorPort, SensorPort,
    TelemetryPort, WatchdogConfig, WatchdogMode, WatchdogPort,
};

/// Watchdog settings for one process instance.
pub const WATCHDOG: WatchdogConfig = WatchdogConfig {
    timeout: ESTIMATED_RUN_TIME,
    mode: WatchdogMode::RaiseOnExpiry,
};

pub struct NodeService<P: ConfigPort, C: EdgeCounter> {
    config: P,
    counter: C,
}

impl<P: ConfigPort, C: EdgeCounter> NodeService<P, C> {
    pub fn new(config: P, counter: C) -> Self {
        Self { config, counter }
    }

    /// Bring the node up and run the loop.  Only returns with a fault.
    pub fn start<H, K, N, W, S>(
        self,
        hw: &mut H,
        wifi: &mut K,
        net: &mut N,
        watchdog: &mut W,
        sink: &mut S,
    ) -> Result<Infallible, Fault>
    where
        H: SensorPort + IndicatorPort + DelayPort,
        K: ConnectivityPort,
        N: TelemetryPort,
        W: WatchdogPort,
        S: EventSink,
    {
        sink.emit(&AppEvent::Started);

        // A fault from early driver bring-up (typically an allocation
        // failure while starting the radio) is raised here, where the
        // supervisor can see it.
        if let Some(fault) = wifi.take_deferred_fault() {
            return Err(fault);
        }

        let config = self.config.load()?;
        log::set_max_level(config.log_level);
        info!("Log level: {}", config.log_level);

        watchdog.arm(WATCHDOG);
        sink.emit(&AppEvent::WatchdogArmed(WATCHDOG));

        wifi.connect(&config.ssid, &config.password, WIFI_CONNECT_TIMEOUT)?;
        sink.emit(&AppEvent::WifiConnected {
            ssid: config.ssid.clone(),
        });
        watchdog.check()?;

        net.connect(&config.broker, config.broker_port)?;
        sink.emit(&AppEvent::BrokerConnected {
            broker: config.broker.clone(),
            port: config.broker_port,
        });
        watchdog.check()?;

        let mut acquisition =
            AcquisitionLoop::new(self.counter, config.mqtt_topic.clone(), config.sleep_duration);
        if let Some(topic) = &config.log_topic {
            acquisition.attach_mirror(topic.clone(), config.log_level);
            sink.emit(&AppEvent::MirrorAttached {
                topic: topic.clone(),
            });
        }

        acquisition.run(hw, net, watchdog, sink)
    }
}
