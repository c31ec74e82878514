//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the hexagonal boundary for the
//! wireless link.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stub for host-side tests.
//!
//! ## Deferred bring-up fault
//!
//! The driver is constructed in `main()`, before the fault supervisor
//! exists.  If construction fails (most often `ESP_ERR_NO_MEM` while the
//! radio allocates its buffers) the fault is stored and handed over by
//! [`ConnectivityPort::take_deferred_fault`] once the supervised
//! boundary is entered.

use core::time::Duration;

use log::{error, info};

use crate::app::ports::ConnectivityPort;
use crate::config::{check_password, check_ssid};
use crate::error::{ConnectivityError, Fault};

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};

fn validate_credentials(ssid: &str, password: &str) -> Result<(), ConnectivityError> {
    check_ssid(ssid)
        .and_then(|()| check_password(password))
        .map_err(|reason| {
            error!("WiFi: {}", reason);
            ConnectivityError::AssociationFailed
        })
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    #[cfg(target_os = "espidf")]
    wifi: Option<BlockingWifi<EspWifi<'static>>>,
    deferred: Option<Fault>,
    connected: bool,
}

impl WifiAdapter {
    /// Bring the radio driver up.  Never fails; a construction error is
    /// held as a deferred fault.
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Self {
        let driver = EspWifi::new(modem, sysloop.clone(), nvs)
            .and_then(|wifi| BlockingWifi::wrap(wifi, sysloop));
        match driver {
            Ok(wifi) => Self {
                wifi: Some(wifi),
                deferred: None,
                connected: false,
            },
            Err(e) => {
                error!("WiFi: driver init failed: {}", e);
                Self {
                    wifi: None,
                    deferred: Some(crate::error::from_esp(
                        e,
                        ConnectivityError::RadioFailed,
                        "wifi driver",
                    )),
                    connected: false,
                }
            }
        }
    }

    /// Simulated radio that associates with any valid credentials.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulated() -> Self {
        Self {
            deferred: None,
            connected: false,
        }
    }

    /// Simulated radio whose bring-up already failed.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulated_failure(fault: Fault) -> Self {
        error!("WiFi(sim): driver init failed: {}", fault);
        Self {
            deferred: Some(fault),
            connected: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(
        &mut self,
        ssid: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<(), ConnectivityError> {
        let wifi = self.wifi.as_mut().ok_or(ConnectivityError::RadioFailed)?;

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| ConnectivityError::AssociationFailed)?,
            password: password
                .try_into()
                .map_err(|_| ConnectivityError::AssociationFailed)?,
            auth_method,
            ..Default::default()
        }))
        .map_err(|_| ConnectivityError::RadioFailed)?;

        wifi.start().map_err(|_| ConnectivityError::RadioFailed)?;
        wifi.wifi_mut()
            .connect()
            .map_err(|_| ConnectivityError::AssociationFailed)?;

        let wifi = &*wifi;
        wifi.wifi_wait_while(|| wifi.is_connected().map(|c| !c), Some(timeout))
            .map_err(|_| ConnectivityError::AssociationFailed)?;
        wifi.ip_wait_while(|| wifi.is_up().map(|up| !up), Some(timeout))
            .map_err(|_| ConnectivityError::AssociationFailed)?;

        if let Ok(ip) = wifi.wifi().sta_netif().get_ip_info() {
            log::debug!("WiFi: address {}", ip.ip);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(
        &mut self,
        ssid: &str,
        _password: &str,
        _timeout: Duration,
    ) -> Result<(), ConnectivityError> {
        log::debug!("WiFi(sim): associated with '{}'", ssid);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(
        &mut self,
        ssid: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<(), ConnectivityError> {
        validate_credentials(ssid, password)?;

        info!("WiFi: connecting to '{}'", ssid);
        match self.platform_connect(ssid, password, timeout) {
            Ok(()) => {
                self.connected = true;
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.connected = false;
                Err(e)
            }
        }
    }

    fn take_deferred_fault(&mut self) -> Option<Fault> {
        self.deferred.take()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
