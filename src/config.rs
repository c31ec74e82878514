//! Node configuration.
//!
//! The node is configured from a JSON "secrets" document holding the
//! Wi-Fi credentials, broker endpoint, topics and cadence.  Fixed timing
//! constants live here too so every module reads them from one place.

use core::time::Duration;

use log::LevelFilter;
use serde::Deserialize;

use crate::error::ConfigError;

// --- Timing ---

/// Estimated worst-case run time of one cycle, with room to spare.
/// Used as the watchdog timeout.
pub const ESTIMATED_RUN_TIME: Duration = Duration::from_secs(60);
/// Wi-Fi association timeout.
pub const WIFI_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Time allowed for the broker to acknowledge a connection.
pub const BROKER_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// How long the liveness LED stays lit each cycle.
pub const BLINK_DURATION: Duration = Duration::from_millis(500);
/// Upper bound for any liveness indication.
pub const MAX_BLINK_DURATION: Duration = Duration::from_secs(1);

/// Shortest accepted pause between cycles.
pub const MIN_SLEEP_DURATION: Duration = Duration::from_secs(1);
/// Longest accepted pause between cycles.  The window between two feeds
/// spans the blink, the sleep and the next cycle's sensor read and
/// publishes; the publish side is budgeted at one broker timeout.
pub const MAX_SLEEP_DURATION: Duration = Duration::from_secs(
    ESTIMATED_RUN_TIME.as_secs() - MAX_BLINK_DURATION.as_secs() - BROKER_CONNECT_TIMEOUT.as_secs(),
);

// --- Recovery ---

/// Delay before a soft reload.
pub const SOFT_RELOAD_DELAY: Duration = Duration::from_secs(10);
/// Delay before a hard reset.
pub const HARD_RESET_DELAY: Duration = Duration::from_secs(15);

/// Validated node configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
    /// Broker host name or address.
    pub broker: String,
    pub broker_port: u16,
    /// Topic receiving the JSON readings.
    pub mqtt_topic: String,
    /// Optional topic mirroring diagnostics.
    pub log_topic: Option<String>,
    /// Pause between cycles.
    pub sleep_duration: Duration,
    pub log_level: LevelFilter,
}

/// Wire shape of the secrets document.  Every field is optional here so
/// that a missing key is reported by name instead of as a parse error.
#[derive(Debug, Default, Deserialize)]
struct Secrets {
    ssid: Option<String>,
    password: Option<String>,
    broker: Option<String>,
    broker_port: Option<u16>,
    mqtt_topic: Option<String>,
    log_topic: Option<String>,
    sleep_duration: Option<f64>,
    log_level: Option<String>,
}

fn required<T>(value: Option<T>, key: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::MissingKey(key))
}

impl NodeConfig {
    /// Parse and validate a secrets document.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        let secrets: Secrets = serde_json::from_str(doc).map_err(|_| ConfigError::Malformed)?;
        Self::from_secrets(secrets)
    }

    fn from_secrets(s: Secrets) -> Result<Self, ConfigError> {
        let ssid = required(s.ssid, "ssid")?;
        let password = required(s.password, "password")?;
        let broker = required(s.broker, "broker")?;
        let broker_port = required(s.broker_port, "broker_port")?;
        let mqtt_topic = required(s.mqtt_topic, "mqtt_topic")?;
        let sleep_secs = required(s.sleep_duration, "sleep_duration")?;
        let log_level = parse_log_level(&required(s.log_level, "log_level")?)?;

        check_ssid(&ssid).map_err(ConfigError::Invalid)?;
        check_password(&password).map_err(ConfigError::Invalid)?;
        if broker.trim().is_empty() {
            return Err(ConfigError::Invalid("broker must not be empty"));
        }
        if broker_port == 0 {
            return Err(ConfigError::Invalid("broker_port must be non-zero"));
        }
        validate_topic(&mqtt_topic)?;
        // An empty log topic means "not configured".
        let log_topic = s.log_topic.filter(|t| !t.is_empty());
        if let Some(topic) = &log_topic {
            validate_topic(topic)?;
        }
        let sleep_duration = validate_sleep(sleep_secs)?;

        Ok(Self {
            ssid: heapless::String::try_from(ssid.as_str())
                .map_err(|_| ConfigError::Invalid("ssid too long"))?,
            password: heapless::String::try_from(password.as_str())
                .map_err(|_| ConfigError::Invalid("password too long"))?,
            broker,
            broker_port,
            mqtt_topic,
            log_topic,
            sleep_duration,
            log_level,
        })
    }
}

/// Map a level name to a `log` filter.  Accepts the usual names in any case.
pub fn parse_log_level(name: &str) -> Result<LevelFilter, ConfigError> {
    match name.trim().to_ascii_uppercase().as_str() {
        "NOTSET" | "TRACE" => Ok(LevelFilter::Trace),
        "DEBUG" => Ok(LevelFilter::Debug),
        "INFO" => Ok(LevelFilter::Info),
        "WARNING" | "WARN" => Ok(LevelFilter::Warn),
        "ERROR" | "CRITICAL" => Ok(LevelFilter::Error),
        "OFF" => Ok(LevelFilter::Off),
        _ => Err(ConfigError::Invalid("log_level is not a known level")),
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Station-mode SSID rule: 1-32 printable ASCII bytes.
pub fn check_ssid(ssid: &str) -> Result<(), &'static str> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err("ssid must be 1-32 printable ASCII bytes");
    }
    Ok(())
}

/// WPA2 passphrase rule: 8-64 bytes, or empty for an open network.
pub fn check_password(password: &str) -> Result<(), &'static str> {
    if !password.is_empty() && !(8..=64).contains(&password.len()) {
        return Err("password must be 8-64 bytes, or empty for an open network");
    }
    Ok(())
}

fn validate_topic(topic: &str) -> Result<(), ConfigError> {
    if topic.is_empty() || topic.contains(['+', '#']) {
        return Err(ConfigError::Invalid(
            "topic must be non-empty and free of wildcards",
        ));
    }
    Ok(())
}

fn validate_sleep(secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite()
        || secs < MIN_SLEEP_DURATION.as_secs_f64()
        || secs > MAX_SLEEP_DURATION.as_secs_f64()
    {
        return Err(ConfigError::Invalid(
            "sleep_duration must leave room for a full cycle inside the watchdog window",
        ));
    }
    Ok(Duration::from_secs_f64(secs))
}
