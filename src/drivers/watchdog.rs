//! Watchdog driver.
//!
//! Two layers:
//!
//! 1. A software deadline, checked by the acquisition loop at every step
//!    boundary.  In `RaiseOnExpiry` mode a missed deadline is delivered as
//!    [`Fault::WatchdogExpired`] so the supervisor can classify it and
//!    pick the recovery tier.
//! 2. On ESP-IDF, the Task Watchdog Timer (TWDT) at twice the timeout
//!    with panic-on-trigger.  It catches a task wedged inside a call that
//!    never returns to a step boundary.
//!
//! Disarming cancels both layers.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{WatchdogConfig, WatchdogMode, WatchdogPort};
use crate::error::Fault;

pub struct Watchdog {
    config: WatchdogConfig,
    /// Monotonic deadline in microseconds; `None` while disarmed.
    due_us: Option<u64>,
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    /// Create a disarmed watchdog.
    pub fn new() -> Self {
        Self {
            config: WatchdogConfig {
                timeout: core::time::Duration::ZERO,
                mode: WatchdogMode::Off,
            },
            due_us: None,
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            #[cfg(target_os = "espidf")]
            subscribed: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.due_us.is_some()
    }

    #[cfg(target_os = "espidf")]
    fn now_us(&self) -> u64 {
        (unsafe { esp_timer_get_time() }) as u64
    }

    #[cfg(not(target_os = "espidf"))]
    fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    fn timeout_us(&self) -> u64 {
        self.config.timeout.as_micros() as u64
    }

    // ── Deadline bookkeeping (time passed in) ─────────────────

    pub fn arm_at(&mut self, config: WatchdogConfig, now_us: u64) {
        self.config = config;
        self.due_us = match config.mode {
            WatchdogMode::Off => None,
            WatchdogMode::RaiseOnExpiry => Some(now_us.saturating_add(self.timeout_us())),
        };
    }

    pub fn feed_at(&mut self, now_us: u64) {
        if self.due_us.is_some() {
            self.due_us = Some(now_us.saturating_add(self.timeout_us()));
        }
    }

    pub fn check_at(&self, now_us: u64) -> Result<(), Fault> {
        match self.due_us {
            Some(due) if now_us > due => Err(Fault::WatchdogExpired),
            _ => Ok(()),
        }
    }

    // ── Hardware backstop ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn backstop_arm(&mut self) {
        // SAFETY: TWDT calls are made from the single main task only.
        unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms: (self.config.timeout.as_millis() as u32).saturating_mul(2),
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK {
                warn!("TWDT reconfigure returned {} (may already be configured)", ret);
            }
            if !self.subscribed {
                let ret = esp_task_wdt_add(core::ptr::null_mut());
                self.subscribed = ret == ESP_OK;
                if !self.subscribed {
                    warn!("Watchdog: TWDT subscribe failed ({})", ret);
                }
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn backstop_arm(&mut self) {}

    #[cfg(target_os = "espidf")]
    fn backstop_feed(&self) {
        if self.subscribed {
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn backstop_feed(&self) {}

    #[cfg(target_os = "espidf")]
    fn backstop_disarm(&mut self) {
        if self.subscribed {
            let ret = unsafe { esp_task_wdt_delete(core::ptr::null_mut()) };
            if ret != ESP_OK {
                warn!("Watchdog: TWDT unsubscribe failed ({})", ret);
            }
            self.subscribed = false;
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn backstop_disarm(&mut self) {}
}

impl WatchdogPort for Watchdog {
    fn arm(&mut self, config: WatchdogConfig) {
        let now = self.now_us();
        self.arm_at(config, now);
        match config.mode {
            WatchdogMode::Off => self.backstop_disarm(),
            WatchdogMode::RaiseOnExpiry => {
                self.backstop_arm();
                info!("Watchdog: armed ({}s, raise on expiry)", config.timeout.as_secs());
            }
        }
    }

    fn feed(&mut self) {
        let now = self.now_us();
        self.feed_at(now);
        self.backstop_feed();
    }

    fn disarm(&mut self) {
        if self.due_us.take().is_some() {
            info!("Watchdog: disarmed");
        }
        self.config.mode = WatchdogMode::Off;
        self.backstop_disarm();
    }

    fn check(&self) -> Result<(), Fault> {
        self.check_at(self.now_us())
    }
}
