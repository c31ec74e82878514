//! SHT4x temperature/humidity sensor on the board's I2C bus.
//!
//! The sensor is optional.  It is probed once with a soft reset; when it
//! does not acknowledge, every cycle reports `(None, None)` and the
//! reading simply omits both fields.  Once detected, a failed transfer or
//! a CRC mismatch is a [`SensorError`] and propagates like any other fault.
//!
//! Measurement frame (high repeatability, command 0xFD):
//!
//! ```text
//!  T_msb T_lsb T_crc RH_msb RH_lsb RH_crc
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, info};

use crate::app::ports::{Measurements, SensorPort};
use crate::error::SensorError;

/// Default 7-bit address (SHT40-AD1B).
pub const SHT4X_ADDR: u8 = 0x44;

const CMD_MEASURE_HIGH_PRECISION: u8 = 0xFD;
const CMD_SOFT_RESET: u8 = 0x94;

/// Max measurement duration at high repeatability is 8.3 ms.
const MEASURE_WAIT_MS: u32 = 10;
const RESET_WAIT_MS: u32 = 1;

/// Sensirion CRC-8: polynomial 0x31, init 0xFF, no reflection.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn word(chunk: &[u8]) -> Result<u16, SensorError> {
    if crc8(&chunk[..2]) != chunk[2] {
        return Err(SensorError::CrcMismatch);
    }
    Ok(u16::from_be_bytes([chunk[0], chunk[1]]))
}

fn celsius(raw: u16) -> f32 {
    -45.0 + 175.0 * f32::from(raw) / 65535.0
}

fn relative_humidity(raw: u16) -> f32 {
    (-6.0 + 125.0 * f32::from(raw) / 65535.0).clamp(0.0, 100.0)
}

/// Climate sensor driver.
pub struct ClimateSensor<I2C, D> {
    bus: I2C,
    delay: D,
    address: u8,
    present: bool,
}

impl<I2C: I2c, D: DelayNs> ClimateSensor<I2C, D> {
    /// Take ownership of the bus and probe for the sensor.
    pub fn new(bus: I2C, delay: D) -> Self {
        Self::with_address(bus, delay, SHT4X_ADDR)
    }

    pub fn with_address(bus: I2C, delay: D, address: u8) -> Self {
        let mut sensor = Self {
            bus,
            delay,
            address,
            present: false,
        };
        sensor.present = sensor.bus.write(address, &[CMD_SOFT_RESET]).is_ok();
        if sensor.present {
            sensor.delay.delay_ms(RESET_WAIT_MS);
            info!("Climate sensor found at 0x{:02x}", address);
        } else {
            info!("No climate sensor at 0x{:02x}, readings will omit climate fields", address);
        }
        sensor
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    fn measure(&mut self) -> Result<Measurements, SensorError> {
        self.bus
            .write(self.address, &[CMD_MEASURE_HIGH_PRECISION])
            .map_err(|_| SensorError::BusError)?;
        self.delay.delay_ms(MEASURE_WAIT_MS);

        let mut frame = [0u8; 6];
        self.bus
            .read(self.address, &mut frame)
            .map_err(|_| SensorError::BusError)?;

        let t_raw = word(&frame[0..3])?;
        let rh_raw = word(&frame[3..6])?;
        let m = Measurements {
            humidity: Some(relative_humidity(rh_raw)),
            temperature: Some(celsius(t_raw)),
        };
        debug!("SHT4x raw T=0x{:04x} RH=0x{:04x}", t_raw, rh_raw);
        Ok(m)
    }
}

impl<I2C: I2c, D: DelayNs> SensorPort for ClimateSensor<I2C, D> {
    fn get_measurements(&mut self) -> Result<Measurements, SensorError> {
        if !self.present {
            return Ok(Measurements::default());
        }
        self.measure()
    }
}
