//! Application core: pure domain logic, zero I/O.
//!
//! The acquisition loop, the node bring-up and the fault supervisor.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod acquisition;
pub mod events;
pub mod ports;
pub mod reading;
pub mod service;
pub mod supervisor;
