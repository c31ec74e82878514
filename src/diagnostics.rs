//! Runtime diagnostics.
//!
//! Metrics (uptime, completed cycles, heap) are collected on demand and
//! attached to the supervisor's fault record so a resource-exhaustion
//! reset can be told apart from a radio one in the console log.  A panic
//! hook logs the same snapshot before the default handler resets the chip.
//!
//! Nothing here is persisted: a reset starts from a clean slate.

use core::sync::atomic::{AtomicU32, Ordering};

/// Cycles completed since boot.  32-bit: the Xtensa cores have no
/// 64-bit atomics.
static CYCLES: AtomicU32 = AtomicU32::new(0);

/// Count one completed acquisition cycle.
pub fn record_cycle() {
    CYCLES.fetch_add(1, Ordering::Relaxed);
}

/// Cycles completed since boot.
pub fn cycles() -> u32 {
    CYCLES.load(Ordering::Relaxed)
}

#[cfg(target_os = "espidf")]
pub fn uptime_secs() -> u64 {
    // SAFETY: esp_timer_get_time is a plain counter read.
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000_000
}

#[cfg(not(target_os = "espidf"))]
pub fn uptime_secs() -> u64 {
    static BOOT: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    BOOT.get_or_init(std::time::Instant::now).elapsed().as_secs()
}

/// Runtime diagnostics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeMetrics {
    pub uptime_secs: u64,
    pub cycles: u32,
    pub heap_free: u32,
    pub heap_min_free: u32,
}

impl RuntimeMetrics {
    #[cfg(target_os = "espidf")]
    pub fn collect() -> Self {
        use esp_idf_svc::sys::*;
        let heap_free = unsafe { esp_get_free_heap_size() };
        let heap_min_free = unsafe { esp_get_minimum_free_heap_size() };
        Self {
            uptime_secs: uptime_secs(),
            cycles: cycles(),
            heap_free,
            heap_min_free,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn collect() -> Self {
        // Synthetic heap figures so host runs exercise the same paths.
        // Heap "decays" slightly with uptime to model fragmentation.
        let uptime_secs = uptime_secs();
        let base_free: u32 = 163_840;
        let decay = (uptime_secs / 60) as u32 * 256;
        let heap_free = base_free.saturating_sub(decay);
        Self {
            uptime_secs,
            cycles: cycles(),
            heap_free,
            heap_min_free: (heap_free as f32 * 0.85) as u32,
        }
    }
}

/// Install a panic hook that logs the reason and a metrics snapshot.
///
/// Call once during bring-up, after the logger.
pub fn install_panic_handler() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        let m = RuntimeMetrics::collect();
        log::error!(
            "PANIC: {} (uptime {}s, cycles {}, heap {}/{} B free)",
            reason,
            m.uptime_secs,
            m.cycles,
            m.heap_free,
            m.heap_min_free
        );
        default_hook(info);
    }));
}
