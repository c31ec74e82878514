//! One cycle's reading and its JSON payload.
//!
//! Payload shape:
//!
//! ```json
//! {"pulses":128,"temperature":"21.3","humidity":"45.6"}
//! ```
//!
//! `temperature` and `humidity` are omitted (not `null`) when the sensor
//! gave nothing, and are one-decimal strings rather than numbers so the
//! downstream parser sees exactly what the device logged.

use serde::{Serialize, Serializer};

use super::ports::Measurements;
use crate::error::Fault;

/// Immutable per-cycle reading.  Built, serialized and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pulses: i32,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "one_decimal")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "one_decimal")]
    humidity: Option<f32>,
}

fn one_decimal<S: Serializer>(value: &Option<f32>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => s.serialize_str(&format!("{v:.1}")),
        None => s.serialize_none(),
    }
}

impl Reading {
    pub fn new(pulses: i32, measurements: Measurements) -> Self {
        // NaN means the conversion produced garbage; treat it as absent.
        let defined = |v: Option<f32>| v.filter(|x| x.is_finite());
        Self {
            pulses,
            temperature: defined(measurements.temperature),
            humidity: defined(measurements.humidity),
        }
    }

    pub fn pulses(&self) -> i32 {
        self.pulses
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn humidity(&self) -> Option<f32> {
        self.humidity
    }

    /// Number of fields that will appear in the payload.
    pub fn field_count(&self) -> usize {
        // `pulses` is mandatory today.
        1 + usize::from(self.temperature.is_some()) + usize::from(self.humidity.is_some())
    }

    /// Whether the payload would carry no fields at all.  Unreachable
    /// while `pulses` is mandatory; the publish guard still checks it.
    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }

    /// Serialize to the compact JSON payload.
    pub fn to_payload(&self) -> Result<String, Fault> {
        serde_json::to_string(self).map_err(|_| Fault::ResourceExhausted("payload encoding"))
    }
}
