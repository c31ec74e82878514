//! End-to-end tests: fault supervisor → node bring-up → acquisition loop,
//! all against recording mocks.  Each scenario runs until a fault escapes
//! and checks the recovery the supervisor chose and the order it acted in.

use std::time::Duration;

use pulsenode::adapters::hardware::HardwareAdapter;
use pulsenode::app::events::AppEvent;
use pulsenode::app::service::{NodeService, WATCHDOG};
use pulsenode::app::supervisor::{
    FaultClass, FaultSupervisor, RecoveryAction, RecoveryPolicy, SupervisorState,
};
use pulsenode::error::{ConfigError, ConnectivityError, Fault, SensorError};

use super::mock_hw::{
    Call, Journal, MockBroker, MockConfig, MockCounter, MockDelay, MockLed, MockRestart,
    MockSensor, MockWatchdog, MockWifi, RecordingSink, SECRETS, SECRETS_WITH_LOG_TOPIC,
};

const TOPIC: &str = "sensors/meter";

struct Node {
    journal: Journal,
    config: MockConfig,
    counter: MockCounter,
    sensor: MockSensor,
    wifi: MockWifi,
    net: MockBroker,
    watchdog: MockWatchdog,
}

impl Node {
    fn new(secrets: &str, pulses: i32) -> Self {
        let journal = Journal::new();
        Self {
            config: MockConfig::from_json(secrets),
            counter: MockCounter::new(&journal, pulses),
            sensor: MockSensor::new(&journal, None, None),
            wifi: MockWifi::new(&journal),
            // Stop the otherwise endless loop after two cycles.
            net: MockBroker::new(&journal)
                .failing_after(2, Fault::Connectivity(ConnectivityError::PublishFailed)),
            watchdog: MockWatchdog::new(&journal),
            journal,
        }
    }

    /// Run under the supervisor; returns the action and the final state.
    fn run(self) -> (Journal, RecoveryAction, SupervisorState) {
        let Self {
            journal,
            config,
            counter,
            sensor,
            mut wifi,
            mut net,
            watchdog,
        } = self;
        let mut hw = HardwareAdapter::new(sensor, MockLed::new(&journal), MockDelay::new(&journal));
        let mut supervisor = FaultSupervisor::new(
            watchdog,
            MockRestart::new(&journal),
            MockDelay::new(&journal),
        );
        let mut node_sink = RecordingSink::new(&journal);

        let action = supervisor.supervise(&mut RecordingSink::new(&journal), |wd| {
            NodeService::new(config, counter).start(&mut hw, &mut wifi, &mut net, wd, &mut node_sink)
        });
        (journal, action, supervisor.state())
    }
}

fn classified(journal: &Journal) -> Option<(Fault, FaultClass)> {
    journal.events().into_iter().find_map(|e| match e {
        AppEvent::FaultClassified { fault, class } => Some((fault, class)),
        _ => None,
    })
}

fn pos(journal: &Journal, call: &Call) -> usize {
    journal
        .position(|c| c == call)
        .unwrap_or_else(|| panic!("{call:?} not in journal"))
}

/// Disarm, then report, then the recovery delay, then the restart.
fn assert_recovery_order(journal: &Journal, action: RecoveryAction) {
    let disarm = pos(journal, &Call::Disarm);
    let report = journal
        .position(|c| matches!(c, Call::Emit(AppEvent::FaultClassified { .. })))
        .expect("fault report");
    let delay = pos(journal, &Call::Sleep(action.delay()));
    let (restart, other) = match action {
        RecoveryAction::SoftReload(_) => (Call::SoftRestart, Call::HardRestart),
        RecoveryAction::HardReset(_) => (Call::HardRestart, Call::SoftRestart),
    };
    let restart = pos(journal, &restart);
    assert!(
        disarm < report && report < delay && delay < restart,
        "disarm {disarm}, report {report}, delay {delay}, restart {restart}"
    );
    assert_eq!(journal.count(|c| *c == Call::Disarm), 1);
    assert_eq!(journal.count(|c| *c == other), 0);
}

// ── Bring-up ──────────────────────────────────────────────────

#[test]
fn bring_up_arms_then_connects_then_publishes() {
    let (journal, _, _) = Node::new(SECRETS, 128).run();

    let arm = pos(&journal, &Call::Arm(WATCHDOG));
    let wifi = pos(
        &journal,
        &Call::WifiConnect {
            ssid: "greenhouse".into(),
        },
    );
    let broker = pos(
        &journal,
        &Call::BrokerConnect {
            broker: "mqtt.lan".into(),
            port: 1883,
        },
    );
    let publish = journal
        .position(|c| matches!(c, Call::Publish { .. }))
        .expect("publish");
    assert!(arm < wifi && wifi < broker && broker < publish);
    assert_eq!(journal.events().first(), Some(&AppEvent::Started));
}

#[test]
fn two_cycles_publish_the_exact_payload_then_fault() {
    let (journal, action, state) = Node::new(SECRETS, 128).run();

    assert_eq!(
        journal.published_to(TOPIC),
        vec![r#"{"pulses":128}"#.to_owned(), r#"{"pulses":128}"#.to_owned()]
    );
    assert_eq!(journal.count(|c| *c == Call::Feed), 2);
    assert_eq!(action, RecoveryAction::HardReset(Duration::from_secs(15)));
    assert_eq!(state, SupervisorState::Terminated(action));
}

// ── Connectivity → hard reset ─────────────────────────────────

#[test]
fn publish_failure_disarms_reports_waits_then_hard_resets() {
    let mut node = Node::new(SECRETS, 128);
    node.net = MockBroker::new(&node.journal)
        .failing_after(0, Fault::Connectivity(ConnectivityError::PublishFailed));
    let (journal, action, _) = node.run();

    assert_eq!(action, RecoveryAction::HardReset(Duration::from_secs(15)));
    assert_eq!(journal.count(|c| *c == Call::Feed), 0);

    assert_recovery_order(&journal, action);

    assert_eq!(
        classified(&journal),
        Some((
            Fault::Connectivity(ConnectivityError::PublishFailed),
            FaultClass::ConnectivityLost
        ))
    );
}

#[test]
fn association_failure_hard_resets_without_touching_the_broker() {
    let mut node = Node::new(SECRETS, 0);
    node.wifi.fail = Some(ConnectivityError::AssociationFailed);
    let (journal, action, _) = node.run();

    assert_eq!(action, RecoveryAction::HardReset(Duration::from_secs(15)));
    assert_recovery_order(&journal, action);
    assert_eq!(journal.count(|c| matches!(c, Call::BrokerConnect { .. })), 0);
}

#[test]
fn broker_connect_failure_hard_resets() {
    let mut node = Node::new(SECRETS, 0);
    node.net.connect_fault = Some(Fault::Connectivity(ConnectivityError::BrokerConnectFailed));
    let (journal, action, _) = node.run();

    assert_eq!(action, RecoveryAction::HardReset(Duration::from_secs(15)));
    assert_recovery_order(&journal, action);
    assert!(journal.published_to(TOPIC).is_empty());
}

// ── Resource exhaustion ───────────────────────────────────────

#[test]
fn deferred_allocation_failure_is_raised_first() {
    let mut node = Node::new(SECRETS, 0);
    node.wifi.deferred = Some(Fault::ResourceExhausted("wifi driver"));
    let (journal, action, _) = node.run();

    assert_eq!(action, RecoveryAction::HardReset(Duration::from_secs(15)));
    // Disarm runs even though nothing was armed yet.
    assert_recovery_order(&journal, action);
    assert_eq!(journal.count(|c| matches!(c, Call::Arm(_))), 0);
    assert_eq!(journal.count(|c| matches!(c, Call::WifiConnect { .. })), 0);
    assert_eq!(
        classified(&journal),
        Some((Fault::ResourceExhausted("wifi driver"), FaultClass::ResourceExhausted))
    );
}

#[test]
fn allocation_failure_while_publishing_hard_resets() {
    let mut node = Node::new(SECRETS, 0);
    node.net = MockBroker::new(&node.journal).failing_after(1, Fault::ResourceExhausted("mqtt publish"));
    let (journal, action, _) = node.run();

    assert_eq!(action, RecoveryAction::HardReset(Duration::from_secs(15)));
    assert_recovery_order(&journal, action);
}

// ── Watchdog expiry ───────────────────────────────────────────

#[test]
fn stalled_publish_expires_the_watchdog_and_hard_resets() {
    let mut node = Node::new(SECRETS, 0);
    node.net.stall = Some(node.watchdog.expired.clone());
    let (journal, action, _) = node.run();

    assert_eq!(action, RecoveryAction::HardReset(Duration::from_secs(15)));
    assert_recovery_order(&journal, action);
    assert_eq!(journal.count(|c| *c == Call::Feed), 0);
    assert_eq!(
        classified(&journal),
        Some((Fault::WatchdogExpired, FaultClass::WatchdogExpired))
    );
}

// ── Everything else → soft reload ─────────────────────────────

#[test]
fn missing_config_key_soft_reloads_after_ten_seconds() {
    let secrets = SECRETS.replace(r#""broker": "mqtt.lan","#, "");
    let (journal, action, _) = Node::new(&secrets, 0).run();

    assert_eq!(action, RecoveryAction::SoftReload(Duration::from_secs(10)));
    assert_recovery_order(&journal, action);
    assert_eq!(journal.count(|c| matches!(c, Call::WifiConnect { .. })), 0);

    let (fault, class) = classified(&journal).expect("classified");
    assert_eq!(fault, Fault::Config(ConfigError::MissingKey("broker")));
    assert_eq!(class, FaultClass::Unknown(fault));
}

#[test]
fn sensor_fault_soft_reloads() {
    let mut node = Node::new(SECRETS, 0);
    node.sensor.result = Err(SensorError::BusError);
    let (journal, action, _) = node.run();

    assert_eq!(action, RecoveryAction::SoftReload(Duration::from_secs(10)));
    assert_recovery_order(&journal, action);
    assert!(journal.published_to(TOPIC).is_empty());
}

#[test]
fn recovery_event_carries_the_action() {
    let (journal, action, _) = Node::new(SECRETS, 0).run();

    let recovering = journal.events().into_iter().find_map(|e| match e {
        AppEvent::Recovering { action, .. } => Some(action),
        _ => None,
    });
    assert_eq!(recovering, Some(action));
}

#[test]
fn every_fault_class_disarms_before_its_delay() {
    let policy = RecoveryPolicy::new(Duration::from_secs(2), Duration::from_secs(3)).expect("policy");
    for fault in [
        Fault::Connectivity(ConnectivityError::Disconnected),
        Fault::ResourceExhausted("mqtt client"),
        Fault::WatchdogExpired,
        Fault::Peripheral("ledc"),
    ] {
        let journal = Journal::new();
        let mut supervisor = FaultSupervisor::with_policy(
            MockWatchdog::new(&journal),
            MockRestart::new(&journal),
            MockDelay::new(&journal),
            policy,
        );
        let action = supervisor.recover(fault, &mut RecordingSink::new(&journal));

        assert_eq!(action, policy.action_for(&FaultClass::of(&fault)), "{fault}");
        assert_recovery_order(&journal, action);
        assert_eq!(supervisor.state(), SupervisorState::Terminated(action));
    }
}

// ── Diagnostics mirror ────────────────────────────────────────

#[test]
fn log_topic_mirrors_cycle_diagnostics() {
    let mut node = Node::new(SECRETS_WITH_LOG_TOPIC, 128);
    // The mirror publishes too; give it room for one full cycle.
    node.net = MockBroker::new(&node.journal)
        .failing_after(20, Fault::Connectivity(ConnectivityError::PublishFailed));
    let (journal, _, _) = node.run();

    assert!(journal.events().contains(&AppEvent::MirrorAttached {
        topic: "logs/meter".into()
    }));
    let mirrored = journal.published_to("logs/meter");
    assert!(mirrored.iter().any(|line| line == "Got pulse count: 128"));
    assert!(!journal.published_to(TOPIC).is_empty());
}

#[test]
fn without_log_topic_nothing_is_mirrored() {
    let (journal, _, _) = Node::new(SECRETS, 128).run();
    assert!(journal.published_to("logs/meter").is_empty());
}
