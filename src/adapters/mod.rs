//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to                  |
//! |-------------|--------------------|------------------------------|
//! | `delay`     | DelayPort          | FreeRTOS delay               |
//! | `hardware`  | SensorPort         | SHT4x over I2C               |
//! |             | IndicatorPort      | RGB status LED (LEDC)        |
//! |             | DelayPort          |                              |
//! | `log_sink`  | EventSink          | Serial log output            |
//! | `mqtt`      | TelemetryPort      | ESP-IDF MQTT client          |
//! | `nvs`       | ConfigPort         | NVS / built-in secrets       |
//! | `platform`  | RestartPort        | esp_restart / deep sleep     |
//! | `wifi`      | ConnectivityPort   | ESP-IDF WiFi STA             |

pub mod delay;
pub mod device_id;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod platform;
pub mod wifi;
