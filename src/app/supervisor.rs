//! Fault supervisor: the top-level recovery state machine.
//!
//! ```text
//!   Idle ──supervise()──▶ Running ──fault──▶ Classifying ──▶ Recovering ──▶ Terminated(action)
//! ```
//!
//! The acquisition loop runs inside [`FaultSupervisor::supervise`] and
//! only ever returns a [`Fault`].  The supervisor classifies it (first
//! match wins), picks a [`RecoveryAction`], and then, always in this
//! order: disarms the watchdog, emits the diagnostic record, waits the
//! action's delay and restarts the platform.  Both restarts are terminal
//! for this process instance.
//!
//! | Fault                         | Class             | Action      |
//! |-------------------------------|-------------------|-------------|
//! | radio / DNS / socket / broker | ConnectivityLost  | HardReset   |
//! | allocation failure            | ResourceExhausted | HardReset   |
//! | watchdog deadline missed      | WatchdogExpired   | HardReset   |
//! | anything else                 | Unknown           | SoftReload  |
//!
//! A constrained radio stack can wedge in states only a full reset
//! clears, so the known "radio botched" classes go straight to the
//! expensive tier.  Unknown faults are assumed rare and transient and get
//! the cheap tier with a shorter back-off.

use core::convert::Infallible;
use core::fmt;
use core::time::Duration;

use log::info;

use crate::config::{HARD_RESET_DELAY, SOFT_RELOAD_DELAY};
use crate::diagnostics::RuntimeMetrics;
use crate::error::{ConfigError, Fault};

use super::events::AppEvent;
use super::ports::{DelayPort, EventSink, RestartPort, WatchdogPort};

// ───────────────────────────────────────────────────────────────
// Classification
// ───────────────────────────────────────────────────────────────

/// Failure class, derived when a fault crosses the supervised boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    ConnectivityLost,
    ResourceExhausted,
    WatchdogExpired,
    Unknown(Fault),
}

impl FaultClass {
    /// Classify a fault.  First match wins.
    pub fn of(fault: &Fault) -> Self {
        match fault {
            Fault::Connectivity(_) => Self::ConnectivityLost,
            Fault::ResourceExhausted(_) => Self::ResourceExhausted,
            Fault::WatchdogExpired => Self::WatchdogExpired,
            other => Self::Unknown(*other),
        }
    }
}

/// What the supervisor does about a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Restart from the entry point after the delay, no power cycle.
    SoftReload(Duration),
    /// Full hardware reset after the delay.
    HardReset(Duration),
}

impl RecoveryAction {
    pub fn delay(&self) -> Duration {
        match self {
            Self::SoftReload(d) | Self::HardReset(d) => *d,
        }
    }

    pub fn is_hard_reset(&self) -> bool {
        matches!(self, Self::HardReset(_))
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SoftReload(d) => write!(f, "soft reload in {} seconds", d.as_secs()),
            Self::HardReset(d) => write!(f, "hard reset in {} seconds", d.as_secs()),
        }
    }
}

/// Delays for the two recovery tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    soft_reload_delay: Duration,
    hard_reset_delay: Duration,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            soft_reload_delay: SOFT_RELOAD_DELAY,
            hard_reset_delay: HARD_RESET_DELAY,
        }
    }
}

impl RecoveryPolicy {
    /// A hard reset costs more than a reload, so it is throttled harder.
    pub fn new(soft_reload_delay: Duration, hard_reset_delay: Duration) -> Result<Self, ConfigError> {
        if soft_reload_delay >= hard_reset_delay {
            return Err(ConfigError::Invalid(
                "soft reload delay must be shorter than hard reset delay",
            ));
        }
        Ok(Self {
            soft_reload_delay,
            hard_reset_delay,
        })
    }

    /// Pure mapping from class to action.
    pub fn action_for(&self, class: &FaultClass) -> RecoveryAction {
        match class {
            FaultClass::ConnectivityLost
            | FaultClass::ResourceExhausted
            | FaultClass::WatchdogExpired => RecoveryAction::HardReset(self.hard_reset_delay),
            FaultClass::Unknown(_) => RecoveryAction::SoftReload(self.soft_reload_delay),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Running,
    Classifying,
    Recovering,
    Terminated(RecoveryAction),
}

/// Owns the watchdog handle, the restart primitives and a delay.
///
/// The watchdog is lent to the supervised body for the duration of the
/// run and comes back to the supervisor when a fault escapes, so the
/// disarm in the recovery path always acts on the same handle the loop
/// was feeding.
pub struct FaultSupervisor<W, R, D> {
    watchdog: W,
    platform: R,
    delay: D,
    policy: RecoveryPolicy,
    state: SupervisorState,
}

impl<W: WatchdogPort, R: RestartPort, D: DelayPort> FaultSupervisor<W, R, D> {
    pub fn new(watchdog: W, platform: R, delay: D) -> Self {
        Self::with_policy(watchdog, platform, delay, RecoveryPolicy::default())
    }

    pub fn with_policy(watchdog: W, platform: R, delay: D, policy: RecoveryPolicy) -> Self {
        Self {
            watchdog,
            platform,
            delay,
            policy,
            state: SupervisorState::Idle,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Run `body` inside the supervised boundary.
    ///
    /// `body` never returns `Ok` (its success type is uninhabited); any
    /// fault it returns is classified and recovered from.  On hardware
    /// this function does not return.  Test doubles return the action
    /// that was performed.
    pub fn supervise<S, F>(&mut self, sink: &mut S, body: F) -> RecoveryAction
    where
        S: EventSink,
        F: FnOnce(&mut W) -> Result<Infallible, Fault>,
    {
        self.transition(SupervisorState::Running);
        let fault = match body(&mut self.watchdog) {
            Ok(never) => match never {},
            Err(fault) => fault,
        };
        self.recover(fault, sink)
    }

    /// Classify `fault` and perform the matching recovery.
    pub fn recover(&mut self, fault: Fault, sink: &mut impl EventSink) -> RecoveryAction {
        self.transition(SupervisorState::Classifying);
        let class = FaultClass::of(&fault);
        let action = self.policy.action_for(&class);

        self.transition(SupervisorState::Recovering);
        // Disarm before anything that may block: the delay below is
        // longer than any sane watchdog window.
        self.watchdog.disarm();
        sink.emit(&AppEvent::FaultClassified { fault, class });
        sink.emit(&AppEvent::Recovering {
            action,
            metrics: RuntimeMetrics::collect(),
        });
        self.delay.sleep(action.delay());

        self.transition(SupervisorState::Terminated(action));
        match action {
            RecoveryAction::SoftReload(_) => self.platform.soft_restart(),
            RecoveryAction::HardReset(_) => self.platform.hard_restart(),
        }
        action
    }

    fn transition(&mut self, next: SupervisorState) {
        info!("Supervisor: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
