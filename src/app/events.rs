//! Outbound application events.
//!
//! The acquisition loop and the fault supervisor emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to the console, mirror to the
//! broker's log topic, or record them in a test.

use core::fmt;
use core::time::Duration;

use log::Level;

use crate::diagnostics::RuntimeMetrics;
use crate::error::Fault;

use super::ports::{Measurements, WatchdogConfig};
use super::supervisor::{FaultClass, RecoveryAction};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The node entered its supervised boundary.
    Started,

    /// The watchdog was armed for this process instance.
    WatchdogArmed(WatchdogConfig),

    /// The station associated with its access point.
    WifiConnected { ssid: heapless::String<32> },

    /// The broker acknowledged the connection.
    BrokerConnected { broker: String, port: u16 },

    /// Diagnostics are now mirrored to the broker.
    MirrorAttached { topic: String },

    /// Climate sensor output for this cycle.
    Measurements(Measurements),

    /// The pulse register read negative and was zeroed.
    CounterReset { previous: i32 },

    /// The pulse count that goes into this cycle's reading.
    PulseCount(i32),

    /// A reading is about to be published.
    Publishing { topic: String, payload: String },

    /// The reading had no fields, nothing was published.
    PublishSkipped,

    WatchdogFed,

    /// Liveness blink.
    Blink,

    /// The loop is about to sleep until the next cycle.
    Sleeping(Duration),

    /// A fault crossed the supervised boundary and was classified.
    FaultClassified { fault: Fault, class: FaultClass },

    /// The supervisor is about to wait, then restart.
    Recovering {
        action: RecoveryAction,
        metrics: RuntimeMetrics,
    },
}

impl AppEvent {
    /// Severity used for local logging and mirror filtering.
    pub fn level(&self) -> Level {
        match self {
            Self::FaultClassified { .. } => Level::Error,
            Self::Recovering { .. } => Level::Warn,
            Self::PublishSkipped | Self::MirrorAttached { .. } => Level::Debug,
            _ => Level::Info,
        }
    }
}

impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "Running"),
            Self::WatchdogArmed(cfg) => write!(
                f,
                "Watchdog armed: {}s, {:?}",
                cfg.timeout.as_secs(),
                cfg.mode
            ),
            Self::WifiConnected { ssid } => write!(f, "Connected to {ssid}"),
            Self::BrokerConnected { broker, port } => {
                write!(f, "Connected to MQTT broker {broker}:{port}")
            }
            Self::MirrorAttached { topic } => write!(f, "Mirroring diagnostics to {topic}"),
            Self::Measurements(m) => {
                match m.temperature {
                    Some(t) => write!(f, "Temperature: {t:.1} C")?,
                    None => write!(f, "Temperature: n/a")?,
                }
                match m.humidity {
                    Some(h) => write!(f, ", Humidity: {h:.1} %"),
                    None => write!(f, ", Humidity: n/a"),
                }
            }
            Self::CounterReset { previous } => {
                write!(f, "Counter is negative ({previous}), resetting")
            }
            Self::PulseCount(n) => write!(f, "Got pulse count: {n}"),
            Self::Publishing { topic, payload } => write!(f, "Publishing to {topic}: {payload}"),
            Self::PublishSkipped => write!(f, "Empty reading, nothing to publish"),
            Self::WatchdogFed => write!(f, "Feeding the watchdog"),
            Self::Blink => write!(f, "Blinking the status LED"),
            Self::Sleeping(d) => write!(f, "Entering sleep for {:.1} seconds", d.as_secs_f32()),
            Self::FaultClassified { fault, class } => write!(f, "Got fault: {fault} ({class:?})"),
            Self::Recovering { action, metrics } => write!(
                f,
                "Performing {action} (uptime {}s, cycles {}, heap {}/{} B free)",
                metrics.uptime_secs, metrics.cycles, metrics.heap_free, metrics.heap_min_free
            ),
        }
    }
}
