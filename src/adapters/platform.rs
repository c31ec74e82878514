//! Platform restart adapter.
//!
//! Implements [`RestartPort`]:
//!
//! - **soft restart**: `esp_restart()`, a software CPU reset.  RTC memory
//!   and the RTC domain survive.
//! - **hard restart**: a 100 ms deep-sleep cycle.  The digital domain,
//!   including the radio and its driver state, is powered down and the
//!   chip boots from reset, the closest thing to a power cycle the
//!   firmware can trigger on itself.
//!
//! On host targets both calls are recorded and return.

use log::warn;

use crate::app::ports::RestartPort;

/// Deep-sleep duration used for a hard restart.
pub const HARD_RESTART_SLEEP_US: u64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartKind {
    Soft,
    Hard,
}

#[derive(Debug, Default)]
pub struct PlatformRestart {
    #[cfg(not(target_os = "espidf"))]
    requested: Option<RestartKind>,
}

impl PlatformRestart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulation: the restart that would have happened.
    #[cfg(not(target_os = "espidf"))]
    pub fn requested(&self) -> Option<RestartKind> {
        self.requested
    }
}

#[cfg(target_os = "espidf")]
impl RestartPort for PlatformRestart {
    fn soft_restart(&mut self) {
        warn!("Restart: software reset");
        // SAFETY: esp_restart never returns; no locks are held by this task.
        unsafe { esp_idf_svc::sys::esp_restart() }
    }

    fn hard_restart(&mut self) {
        warn!("Restart: deep-sleep power cycle");
        // SAFETY: timer wakeup is the only wake source; deep sleep never
        // returns and the chip reboots through the ROM bootloader.
        unsafe {
            esp_idf_svc::sys::esp_sleep_enable_timer_wakeup(HARD_RESTART_SLEEP_US);
            esp_idf_svc::sys::esp_deep_sleep_start();
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl RestartPort for PlatformRestart {
    fn soft_restart(&mut self) {
        warn!("Restart(sim): software reset");
        self.requested = Some(RestartKind::Soft);
    }

    fn hard_restart(&mut self) {
        warn!("Restart(sim): deep-sleep power cycle");
        self.requested = Some(RestartKind::Hard);
    }
}
