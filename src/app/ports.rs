//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AcquisitionLoop / FaultSupervisor (domain)
//! ```
//!
//! Driven adapters (sensors, counter, radio, broker, watchdog, reset
//! controller) implement these traits.  The domain core consumes them via
//! generics, so it never touches hardware directly and every ordering
//! rule can be checked against recording mocks on the host.

use core::time::Duration;

use crate::config::NodeConfig;
use crate::error::{ConfigError, ConnectivityError, Fault, SensorError};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One climate sample.  `None` means the sensor is absent, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measurements {
    pub humidity: Option<f32>,
    pub temperature: Option<f32>,
}

/// Read-side port for the optional temperature/humidity sensor.
pub trait SensorPort {
    fn get_measurements(&mut self) -> Result<Measurements, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Pulse counter port
// ───────────────────────────────────────────────────────────────

/// A free-running edge counter register.
///
/// The register counts up and may wrap to a negative value when it
/// overflows its bit width.  The upper bound is not under our control.
pub trait EdgeCounter {
    /// Current raw register value.
    fn count(&self) -> i32;

    /// Zero the register.
    fn reset(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Liveness indicator and delay
// ───────────────────────────────────────────────────────────────

/// Status light used for the per-cycle liveness blink.
pub trait IndicatorPort {
    fn set_colour(&mut self, r: u8, g: u8, b: u8);

    fn off(&mut self);
}

/// Blocking delay.
pub trait DelayPort {
    fn sleep(&mut self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Network ports
// ───────────────────────────────────────────────────────────────

/// Wireless link.
pub trait ConnectivityPort {
    /// Associate with the access point, blocking up to `timeout`.
    fn connect(
        &mut self,
        ssid: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<(), ConnectivityError>;

    /// A fault raised while the driver was being brought up, held back
    /// until the supervised boundary is entered.
    fn take_deferred_fault(&mut self) -> Option<Fault> {
        None
    }
}

/// Connection-oriented publish transport (MQTT).
///
/// Errors are full [`Fault`]s: a publish can fail on the network
/// (`Connectivity`) or on allocation (`ResourceExhausted`).
pub trait TelemetryPort {
    fn connect(&mut self, broker: &str, port: u16) -> Result<(), Fault>;

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), Fault>;
}

// ───────────────────────────────────────────────────────────────
// Watchdog port
// ───────────────────────────────────────────────────────────────

/// What the watchdog does when its deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogMode {
    /// Supervision disabled.
    Off,
    /// Deliver a [`Fault::WatchdogExpired`] into the running code path.
    RaiseOnExpiry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogConfig {
    pub timeout: Duration,
    pub mode: WatchdogMode,
}

/// The dead-man's switch.
pub trait WatchdogPort {
    /// Configure and start the countdown.
    fn arm(&mut self, config: WatchdogConfig);

    /// Restart the countdown.
    fn feed(&mut self);

    /// Cancel supervision.  Required before blocking longer than the
    /// timeout.
    fn disarm(&mut self);

    /// Deliver a pending expiry.  Returns `Err(Fault::WatchdogExpired)`
    /// once the deadline has passed in `RaiseOnExpiry` mode.
    fn check(&self) -> Result<(), Fault>;
}

// ───────────────────────────────────────────────────────────────
// Platform reset port
// ───────────────────────────────────────────────────────────────

/// Host-platform restart primitives.
///
/// On hardware neither method returns.  Test doubles record the call
/// and return so the supervisor's decision can be asserted.
pub trait RestartPort {
    /// Restart from the entry point without a power cycle.
    fn soft_restart(&mut self);

    /// Full hardware reset.
    fn hard_restart(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads the node configuration.
///
/// Implementations MUST validate before returning; a missing or invalid
/// key is a startup fault.
pub trait ConfigPort {
    fn load(&self) -> Result<NodeConfig, ConfigError>;
}
