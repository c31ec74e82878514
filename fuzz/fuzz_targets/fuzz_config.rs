//! Fuzz target: secrets document parser
//!
//! Feeds arbitrary bytes to `NodeConfig::from_json` and verifies:
//! - No panics under arbitrary input
//! - Every accepted config satisfies the validation rules
//!
//! cargo fuzz run fuzz_config

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsenode::config::{NodeConfig, MAX_SLEEP_DURATION, MIN_SLEEP_DURATION};

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(cfg) = NodeConfig::from_json(doc) else {
        return;
    };

    assert!(!cfg.ssid.is_empty() && cfg.ssid.len() <= 32);
    assert!(cfg.password.is_empty() || (8..=64).contains(&cfg.password.len()));
    assert!(cfg.broker_port != 0);
    assert!(!cfg.mqtt_topic.is_empty() && !cfg.mqtt_topic.contains(['+', '#']));
    if let Some(topic) = &cfg.log_topic {
        assert!(!topic.is_empty() && !topic.contains(['+', '#']));
    }
    assert!(cfg.sleep_duration >= MIN_SLEEP_DURATION);
    assert!(cfg.sleep_duration <= MAX_SLEEP_DURATION);
});
