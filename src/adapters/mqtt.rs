//! MQTT telemetry adapter.
//!
//! Implements [`TelemetryPort`] over the ESP-IDF MQTT client.  Readings
//! and mirrored diagnostics go out at QoS 0, not retained.
//!
//! The client connects asynchronously; [`TelemetryPort::connect`] blocks
//! until the broker's CONNACK sets the connected flag or
//! [`BROKER_CONNECT_TIMEOUT`] passes.  A later disconnect clears the flag
//! and the next publish fails with `Disconnected`.
//!
//! On host targets a simulation records every publish.

use log::info;
#[cfg(target_os = "espidf")]
use log::{error, warn};

use crate::adapters::device_id::{self, ClientIdString};
use crate::app::ports::TelemetryPort;
#[cfg(target_os = "espidf")]
use crate::config::BROKER_CONNECT_TIMEOUT;
use crate::error::{ConnectivityError, Fault};

#[cfg(target_os = "espidf")]
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};

/// Broker URL for a plain-TCP connection.
pub fn broker_url(broker: &str, port: u16) -> String {
    format!("mqtt://{}:{}", broker, port)
}

pub struct MqttTelemetry {
    client_id: ClientIdString,
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    connected: Arc<AtomicBool>,
    /// Simulation: every `(topic, payload)` published, in order.
    #[cfg(not(target_os = "espidf"))]
    published: Vec<(String, String)>,
    #[cfg(not(target_os = "espidf"))]
    connected: bool,
}

impl Default for MqttTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl MqttTelemetry {
    pub fn new() -> Self {
        Self {
            client_id: device_id::client_id(&device_id::read_mac()),
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(target_os = "espidf")]
            connected: Arc::new(AtomicBool::new(false)),
            #[cfg(not(target_os = "espidf"))]
            published: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            connected: false,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn published(&self) -> &[(String, String)] {
        &self.published
    }
}

#[cfg(target_os = "espidf")]
impl TelemetryPort for MqttTelemetry {
    fn connect(&mut self, broker: &str, port: u16) -> Result<(), Fault> {
        let url = broker_url(broker, port);
        info!("MQTT: connecting to {} as '{}'", url, self.client_id);

        let conf = MqttClientConfiguration {
            client_id: Some(self.client_id.as_str()),
            ..Default::default()
        };
        let flag = self.connected.clone();
        let client = EspMqttClient::new_cb(&url, &conf, move |event| match event.payload() {
            EventPayload::Connected(_) => flag.store(true, Ordering::Release),
            EventPayload::Disconnected => {
                flag.store(false, Ordering::Release);
                warn!("MQTT: broker disconnected");
            }
            EventPayload::Error(e) => warn!("MQTT: client error {:?}", e),
            _ => {}
        })
        .map_err(|e| {
            error!("MQTT: client init failed: {}", e);
            crate::error::from_esp(e, ConnectivityError::BrokerConnectFailed, "mqtt client")
        })?;
        self.client = Some(client);

        let step = core::time::Duration::from_millis(100);
        let mut waited = core::time::Duration::ZERO;
        while !self.connected.load(Ordering::Acquire) {
            if waited >= BROKER_CONNECT_TIMEOUT {
                error!("MQTT: no CONNACK within {}s", BROKER_CONNECT_TIMEOUT.as_secs());
                return Err(ConnectivityError::BrokerConnectFailed.into());
            }
            esp_idf_svc::hal::delay::FreeRtos::delay_ms(step.as_millis() as u32);
            waited += step;
        }
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), Fault> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(ConnectivityError::Disconnected.into());
        }
        let client = self
            .client
            .as_mut()
            .ok_or(Fault::Connectivity(ConnectivityError::Disconnected))?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes())
            .map(|_| ())
            .map_err(|e| crate::error::from_esp(e, ConnectivityError::PublishFailed, "mqtt publish"))
    }
}

#[cfg(not(target_os = "espidf"))]
impl TelemetryPort for MqttTelemetry {
    fn connect(&mut self, broker: &str, port: u16) -> Result<(), Fault> {
        info!("MQTT(sim): connected to {} as '{}'", broker_url(broker, port), self.client_id);
        self.connected = true;
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), Fault> {
        if !self.connected {
            return Err(ConnectivityError::Disconnected.into());
        }
        self.published.push((topic.to_owned(), payload.to_owned()));
        Ok(())
    }
}
