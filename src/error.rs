//! Unified fault types for the PulseNode firmware.
//!
//! Every fallible operation funnels into [`Fault`], the explicit error
//! channel returned from the acquisition loop's entry point.  The fault
//! supervisor pattern-matches it into a recovery tier; nothing in the
//! loop recovers locally.  All variants are `Copy` so a fault can be
//! logged, classified and recorded without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level fault
// ---------------------------------------------------------------------------

/// Any failure that can escape the acquisition loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Radio, association, DNS, socket or broker failure.
    Connectivity(ConnectivityError),
    /// An allocation failed (heap or driver-internal pool).
    ResourceExhausted(&'static str),
    /// The watchdog deadline passed without a feed.
    WatchdogExpired,
    /// The climate sensor returned a bad frame.
    Sensor(SensorError),
    /// Configuration is missing or invalid.
    Config(ConfigError),
    /// A peripheral could not be initialised.
    Peripheral(&'static str),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connectivity(e) => write!(f, "connectivity: {e}"),
            Self::ResourceExhausted(what) => write!(f, "out of memory: {what}"),
            Self::WatchdogExpired => write!(f, "watchdog expired"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Peripheral(msg) => write!(f, "peripheral: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Connectivity errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    /// The Wi-Fi driver refused to start.
    RadioFailed,
    /// Association with the access point failed or timed out.
    AssociationFailed,
    /// The station lost its access point.
    Disconnected,
    /// The broker host name did not resolve.
    DnsLookupFailed,
    /// A socket operation failed.
    SocketError,
    /// The broker did not acknowledge the connection in time.
    BrokerConnectFailed,
    /// A publish was rejected by the client or transport.
    PublishFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RadioFailed => write!(f, "radio start failed"),
            Self::AssociationFailed => write!(f, "Wi-Fi association failed"),
            Self::Disconnected => write!(f, "Wi-Fi disconnected"),
            Self::DnsLookupFailed => write!(f, "DNS lookup failed"),
            Self::SocketError => write!(f, "socket error"),
            Self::BrokerConnectFailed => write!(f, "MQTT broker connect failed"),
            Self::PublishFailed => write!(f, "MQTT publish failed"),
        }
    }
}

impl From<ConnectivityError> for Fault {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The I2C transaction failed after the sensor was detected.
    BusError,
    /// A measurement word failed its CRC-8 check.
    CrcMismatch,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusError => write!(f, "I2C bus error"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
        }
    }
}

impl From<SensorError> for Fault {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No secrets document was found in storage or in the image.
    NotFound,
    /// The secrets document is not valid JSON of the expected shape.
    Malformed,
    /// A required key is absent.
    MissingKey(&'static str),
    /// A key is present but its value is out of range.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no secrets document"),
            Self::Malformed => write!(f, "secrets document malformed"),
            Self::MissingKey(key) => write!(f, "missing key '{key}'"),
            Self::Invalid(msg) => write!(f, "invalid value: {msg}"),
        }
    }
}

impl From<ConfigError> for Fault {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// ESP-IDF error codes
// ---------------------------------------------------------------------------

/// Map a raw `esp_err_t` from the network stack.  Allocation failures
/// keep their own tier; anything else is reported as `otherwise`.
pub fn from_esp_code(code: i32, otherwise: ConnectivityError, what: &'static str) -> Fault {
    // ESP_ERR_NO_MEM
    const NO_MEM: i32 = 0x101;
    if code == NO_MEM {
        Fault::ResourceExhausted(what)
    } else {
        Fault::Connectivity(otherwise)
    }
}

#[cfg(target_os = "espidf")]
pub fn from_esp(err: esp_idf_svc::sys::EspError, otherwise: ConnectivityError, what: &'static str) -> Fault {
    from_esp_code(err.code(), otherwise, what)
}
