//! Pulse input: the free-running edge counter and its wrap policy.
//!
//! A GPIO ISR increments an atomic register on each rising edge of the
//! monitored signal.  The register is never cleared per cycle: the
//! downstream time-series store treats the value as a counter and does its
//! own reset detection.  It only gets zeroed once it has wrapped negative.
//!
//! Zeroing on a negative read loses the pulses counted between the wrap
//! and the reset.  Guessing the wrap modulus instead would corrupt the
//! long-term series far worse than an occasional dip.

use core::sync::atomic::{AtomicI32, Ordering};

use crate::app::ports::EdgeCounter;

/// Register incremented by the GPIO ISR.  `static` because ESP-IDF ISR
/// callbacks cannot capture.
static PULSE_REGISTER: AtomicI32 = AtomicI32::new(0);

/// Called from the GPIO ISR on each rising edge.  Atomic adds wrap on
/// overflow, so the register goes negative past `i32::MAX`.
pub fn pulse_isr_handler() {
    PULSE_REGISTER.fetch_add(1, Ordering::Relaxed);
}

/// [`EdgeCounter`] over the ISR-maintained register.
pub struct IsrEdgeCounter {
    _gpio: i32,
}

impl IsrEdgeCounter {
    /// The ISR itself is registered by `hw_init::init_isr_service`.
    pub fn new(gpio: i32) -> Self {
        Self { _gpio: gpio }
    }
}

impl EdgeCounter for IsrEdgeCounter {
    fn count(&self) -> i32 {
        PULSE_REGISTER.load(Ordering::Relaxed)
    }

    fn reset(&mut self) {
        PULSE_REGISTER.store(0, Ordering::Relaxed);
    }
}

/// One application of the wrap policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseSample {
    /// Value reported downstream.
    pub count: i32,
    /// The negative value that triggered a reset, if one happened.
    pub reset_from: Option<i32>,
}

/// Wraps an [`EdgeCounter`] with the reset-on-negative policy.
pub struct PulseCounter<C: EdgeCounter> {
    counter: C,
}

impl<C: EdgeCounter> PulseCounter<C> {
    pub fn new(counter: C) -> Self {
        Self { counter }
    }

    /// Take this cycle's reading.
    ///
    /// A negative register is zeroed *before* the reading is taken.
    /// The value is otherwise reported raw, with no local accumulation.
    /// Reporting the reset is left to the caller via `reset_from`.
    pub fn read(&mut self) -> PulseSample {
        let current = self.counter.count();
        let reset_from = if current < 0 {
            self.counter.reset();
            Some(current)
        } else {
            None
        };
        PulseSample {
            count: self.counter.count(),
            reset_from,
        }
    }

    pub fn inner(&self) -> &C {
        &self.counter
    }
}
