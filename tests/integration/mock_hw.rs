//! Mock adapters for integration tests.
//!
//! Every mock appends to one shared [`Journal`], so a test can assert on
//! the relative order of calls made to *different* ports (publish before
//! feed, disarm before the recovery delay, reset before the read).

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use pulsenode::app::events::AppEvent;
use pulsenode::app::ports::{
    ConfigPort, ConnectivityPort, DelayPort, EdgeCounter, EventSink, IndicatorPort, Measurements,
    RestartPort, SensorPort, TelemetryPort, WatchdogConfig, WatchdogPort,
};
use pulsenode::config::NodeConfig;
use pulsenode::error::{ConfigError, ConnectivityError, Fault, SensorError};

// ── Call journal ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Measure,
    CounterReset,
    SetColour(u8, u8, u8),
    LedOff,
    Sleep(Duration),
    WifiConnect { ssid: String },
    BrokerConnect { broker: String, port: u16 },
    Publish { topic: String, payload: String },
    Arm(WatchdogConfig),
    Feed,
    Disarm,
    SoftRestart,
    HardRestart,
    Emit(AppEvent),
}

#[derive(Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Call>>>);

#[allow(dead_code)]
impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    /// Index of the first call matching `pred`.
    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.0.borrow().iter().position(pred)
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Payloads published to `topic`, in order.
    pub fn published_to(&self, topic: &str) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Publish { topic: t, payload } if t == topic => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn events(&self) -> Vec<AppEvent> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Emit(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }
}

// ── Sensor ────────────────────────────────────────────────────

pub struct MockSensor {
    journal: Journal,
    pub result: Result<Measurements, SensorError>,
}

impl MockSensor {
    pub fn new(journal: &Journal, humidity: Option<f32>, temperature: Option<f32>) -> Self {
        Self {
            journal: journal.clone(),
            result: Ok(Measurements {
                humidity,
                temperature,
            }),
        }
    }
}

impl SensorPort for MockSensor {
    fn get_measurements(&mut self) -> Result<Measurements, SensorError> {
        self.journal.push(Call::Measure);
        self.result
    }
}

// ── Pulse register ────────────────────────────────────────────

/// Edge counter whose register the test can move between cycles.
#[derive(Clone)]
pub struct MockCounter {
    journal: Journal,
    pub register: Rc<Cell<i32>>,
}

impl MockCounter {
    pub fn new(journal: &Journal, value: i32) -> Self {
        Self {
            journal: journal.clone(),
            register: Rc::new(Cell::new(value)),
        }
    }
}

impl EdgeCounter for MockCounter {
    fn count(&self) -> i32 {
        self.register.get()
    }

    fn reset(&mut self) {
        self.journal.push(Call::CounterReset);
        self.register.set(0);
    }
}

// ── LED and delay ─────────────────────────────────────────────

pub struct MockLed(Journal);

impl MockLed {
    pub fn new(journal: &Journal) -> Self {
        Self(journal.clone())
    }
}

impl IndicatorPort for MockLed {
    fn set_colour(&mut self, r: u8, g: u8, b: u8) {
        self.0.push(Call::SetColour(r, g, b));
    }

    fn off(&mut self) {
        self.0.push(Call::LedOff);
    }
}

/// Records the requested delay and returns immediately.
pub struct MockDelay(Journal);

impl MockDelay {
    pub fn new(journal: &Journal) -> Self {
        Self(journal.clone())
    }
}

impl DelayPort for MockDelay {
    fn sleep(&mut self, duration: Duration) {
        self.0.push(Call::Sleep(duration));
    }
}

// ── Wi-Fi ─────────────────────────────────────────────────────

pub struct MockWifi {
    journal: Journal,
    pub fail: Option<ConnectivityError>,
    pub deferred: Option<Fault>,
}

impl MockWifi {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            fail: None,
            deferred: None,
        }
    }
}

impl ConnectivityPort for MockWifi {
    fn connect(
        &mut self,
        ssid: &str,
        _password: &str,
        _timeout: Duration,
    ) -> Result<(), ConnectivityError> {
        self.journal.push(Call::WifiConnect {
            ssid: ssid.to_owned(),
        });
        match self.fail {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn take_deferred_fault(&mut self) -> Option<Fault> {
        self.deferred.take()
    }
}

// ── Broker ────────────────────────────────────────────────────

pub struct MockBroker {
    journal: Journal,
    pub connect_fault: Option<Fault>,
    /// Publishes that succeed before `publish_fault` is returned.
    pub publish_budget: Option<usize>,
    pub publish_fault: Fault,
    /// Set after every publish.  Share it with [`MockWatchdog::expired`]
    /// to model a publish that blocks past the watchdog window.
    pub stall: Option<Rc<Cell<bool>>>,
}

impl MockBroker {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            connect_fault: None,
            publish_budget: None,
            publish_fault: Fault::Connectivity(ConnectivityError::PublishFailed),
            stall: None,
        }
    }

    /// Fail every publish after the first `n` with `fault`.
    pub fn failing_after(mut self, n: usize, fault: Fault) -> Self {
        self.publish_budget = Some(n);
        self.publish_fault = fault;
        self
    }
}

impl TelemetryPort for MockBroker {
    fn connect(&mut self, broker: &str, port: u16) -> Result<(), Fault> {
        self.journal.push(Call::BrokerConnect {
            broker: broker.to_owned(),
            port,
        });
        match self.connect_fault {
            Some(f) => Err(f),
            None => Ok(()),
        }
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), Fault> {
        if let Some(budget) = self.publish_budget.as_mut() {
            if *budget == 0 {
                return Err(self.publish_fault);
            }
            *budget -= 1;
        }
        self.journal.push(Call::Publish {
            topic: topic.to_owned(),
            payload: payload.to_owned(),
        });
        if let Some(stall) = &self.stall {
            stall.set(true);
        }
        Ok(())
    }
}

// ── Watchdog ──────────────────────────────────────────────────

/// Expires when the shared `expired` flag is set, e.g. by a stalling
/// broker.
pub struct MockWatchdog {
    journal: Journal,
    pub expired: Rc<Cell<bool>>,
}

impl MockWatchdog {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            expired: Rc::new(Cell::new(false)),
        }
    }
}

impl WatchdogPort for MockWatchdog {
    fn arm(&mut self, config: WatchdogConfig) {
        self.journal.push(Call::Arm(config));
    }

    fn feed(&mut self) {
        self.journal.push(Call::Feed);
    }

    fn disarm(&mut self) {
        self.journal.push(Call::Disarm);
        self.expired.set(false);
    }

    fn check(&self) -> Result<(), Fault> {
        if self.expired.get() {
            Err(Fault::WatchdogExpired)
        } else {
            Ok(())
        }
    }
}

// ── Restart ───────────────────────────────────────────────────

pub struct MockRestart(Journal);

impl MockRestart {
    pub fn new(journal: &Journal) -> Self {
        Self(journal.clone())
    }
}

impl RestartPort for MockRestart {
    fn soft_restart(&mut self) {
        self.0.push(Call::SoftRestart);
    }

    fn hard_restart(&mut self) {
        self.0.push(Call::HardRestart);
    }
}

// ── Config ────────────────────────────────────────────────────

pub struct MockConfig(pub Result<NodeConfig, ConfigError>);

impl MockConfig {
    pub fn from_json(doc: &str) -> Self {
        Self(NodeConfig::from_json(doc))
    }
}

impl ConfigPort for MockConfig {
    fn load(&self) -> Result<NodeConfig, ConfigError> {
        self.0.clone()
    }
}

// ── Event sink ────────────────────────────────────────────────

pub struct RecordingSink(Journal);

impl RecordingSink {
    pub fn new(journal: &Journal) -> Self {
        Self(journal.clone())
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.0.push(Call::Emit(event.clone()));
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub const SECRETS: &str = r#"{
    "ssid": "greenhouse",
    "password": "correct horse",
    "broker": "mqtt.lan",
    "broker_port": 1883,
    "mqtt_topic": "sensors/meter",
    "sleep_duration": 30,
    "log_level": "info"
}"#;

pub const SECRETS_WITH_LOG_TOPIC: &str = r#"{
    "ssid": "greenhouse",
    "password": "correct horse",
    "broker": "mqtt.lan",
    "broker_port": 1883,
    "mqtt_topic": "sensors/meter",
    "log_topic": "logs/meter",
    "sleep_duration": 30,
    "log_level": "info"
}"#;
