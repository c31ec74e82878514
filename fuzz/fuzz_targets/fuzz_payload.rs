//! Fuzz target: reading payload encoder
//!
//! Builds a `Reading` from arbitrary pulse count and raw float bits
//! (NaN and infinities included) and verifies:
//! - Encoding never fails or panics
//! - The payload is a JSON object with `pulses` and no `null` values
//! - Non-finite climate values are left out
//!
//! cargo fuzz run fuzz_payload

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsenode::app::ports::Measurements;
use pulsenode::app::reading::Reading;

fn take_f32(bytes: &[u8], flag: u8) -> Option<f32> {
    (flag & 1 == 1).then(|| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 13 {
        return;
    }
    let pulses = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let humidity = take_f32(&data[4..8], data[12]);
    let temperature = take_f32(&data[8..12], data[12] >> 1);

    let reading = Reading::new(pulses, Measurements { humidity, temperature });
    let payload = reading.to_payload().expect("encoding a reading cannot fail");

    let value: serde_json::Value = serde_json::from_str(&payload).expect("payload is JSON");
    let object = value.as_object().expect("payload is an object");
    assert_eq!(object.len(), reading.field_count());
    assert_eq!(object["pulses"].as_i64(), Some(i64::from(pulses)));
    assert!(object.values().all(|v| !v.is_null()));
    if humidity.is_some_and(|h| !h.is_finite()) {
        assert!(!object.contains_key("humidity"));
    }
    if temperature.is_some_and(|t| !t.is_finite()) {
        assert!(!object.contains_key("temperature"));
    }
});
