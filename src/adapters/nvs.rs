//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] for the node.  The secrets document is a JSON
//! blob stored under namespace `pulsenode`, key `secrets`.  When NVS holds
//! no document the one baked into the image at build time (the
//! `PULSENODE_SECRETS` environment variable) is used instead.
//!
//! Every document is parsed and validated by [`NodeConfig::from_json`]
//! before it is handed to the node.

use log::{info, warn};

use crate::app::ports::ConfigPort;
use crate::config::NodeConfig;
use crate::error::ConfigError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::EspDefaultNvsPartition;
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

pub const SECRETS_NAMESPACE: &str = "pulsenode";
pub const SECRETS_KEY: &str = "secrets";

const MAX_BLOB_SIZE: usize = 4000;

/// NVS namespace and key names are at most 15 bytes plus the NUL.
#[cfg(any(target_os = "espidf", test))]
const NVS_NAME_SIZE: usize = 16;

/// NUL-terminated copy of an NVS name, truncated to fit.
#[cfg(any(target_os = "espidf", test))]
fn nvs_name(name: &str) -> [u8; NVS_NAME_SIZE] {
    let mut buf = [0u8; NVS_NAME_SIZE];
    let len = name.len().min(NVS_NAME_SIZE - 1);
    buf[..len].copy_from_slice(&name.as_bytes()[..len]);
    buf
}

/// Secrets document compiled into the image, if any.
pub const BUILTIN_SECRETS: Option<&str> = option_env!("PULSENODE_SECRETS");

pub struct NvsAdapter {
    /// Held so the default partition stays initialised for raw handle access.
    #[cfg(target_os = "espidf")]
    _partition: EspDefaultNvsPartition,
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<Option<Vec<u8>>>,
    fallback: Option<&'static str>,
}

impl NvsAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(partition: EspDefaultNvsPartition) -> Self {
        info!("NvsAdapter: ESP-IDF NVS backend");
        Self {
            _partition: partition,
            fallback: BUILTIN_SECRETS,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        info!("NvsAdapter: simulation backend");
        Self {
            store: std::cell::RefCell::new(None),
            fallback: BUILTIN_SECRETS,
        }
    }

    /// Replace the build-time fallback document.
    pub fn with_fallback(mut self, fallback: Option<&'static str>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Simulation: place a secrets document in the store.
    #[cfg(not(target_os = "espidf"))]
    pub fn store_secrets(&self, json: &str) {
        *self.store.borrow_mut() = Some(json.as_bytes().to_vec());
    }

    /// Raw secrets blob from storage; `Ok(None)` when none is stored.
    #[cfg(not(target_os = "espidf"))]
    fn read_secrets(&self) -> Result<Option<Vec<u8>>, i32> {
        Ok(self.store.borrow().clone())
    }

    #[cfg(target_os = "espidf")]
    fn read_secrets(&self) -> Result<Option<Vec<u8>>, i32> {
        let result = Self::with_nvs_handle(SECRETS_NAMESPACE, |handle| {
            let key_cstr = nvs_name(SECRETS_KEY);
            let mut size: usize = 0;

            // First call: get size
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_cstr.as_ptr() as *const _,
                    core::ptr::null_mut(),
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(ESP_ERR_INVALID_SIZE);
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_cstr.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            buf.truncate(size);
            Ok(buf)
        });

        match result {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Open an NVS namespace read-only, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns_buf = nvs_name(namespace);

        let mut handle: nvs_handle_t = 0;
        let ret = unsafe {
            nvs_open(
                ns_buf.as_ptr() as *const _,
                nvs_open_mode_t_NVS_READONLY,
                &mut handle,
            )
        };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for NvsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<NodeConfig, ConfigError> {
        match self.read_secrets() {
            Ok(Some(bytes)) => {
                info!("NvsAdapter: loaded secrets from NVS ({} bytes)", bytes.len());
                let json = core::str::from_utf8(&bytes).map_err(|_| ConfigError::Malformed)?;
                return NodeConfig::from_json(json);
            }
            Ok(None) => {}
            Err(e) => warn!("NvsAdapter: NVS read error {}, trying built-in secrets", e),
        }

        match self.fallback {
            Some(json) => {
                info!("NvsAdapter: using built-in secrets");
                NodeConfig::from_json(json)
            }
            None => Err(ConfigError::NotFound),
        }
    }
}
