//! PulseNode Firmware: Main Entry Point
//!
//! Counts pulses on a GPIO, samples an optional SHT4x and publishes both
//! to an MQTT broker every cycle, under a fault supervisor that turns any
//! escaped fault into a timed soft reload or hard reset.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   PlatformRestart │
//! │  (Sensor+LED+Delay)(EventSink)    (Config)     (Restart)       │
//! │  WifiAdapter       MqttTelemetry  Watchdog                     │
//! │  (Connectivity)    (Telemetry)    (WatchdogPort)               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  FaultSupervisor ─▶ NodeService ─▶ AcquisitionLoop     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::Delay;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use pulsenode::adapters::delay::SystemDelay;
use pulsenode::adapters::hardware::HardwareAdapter;
use pulsenode::adapters::log_sink::LogEventSink;
use pulsenode::adapters::mqtt::MqttTelemetry;
use pulsenode::adapters::nvs::NvsAdapter;
use pulsenode::adapters::platform::PlatformRestart;
use pulsenode::adapters::wifi::WifiAdapter;
use pulsenode::app::service::NodeService;
use pulsenode::app::supervisor::FaultSupervisor;
use pulsenode::diagnostics;
use pulsenode::drivers::{hw_init, status_led::StatusLed, watchdog::Watchdog};
use pulsenode::error::Fault;
use pulsenode::pins;
use pulsenode::sensors::{climate::ClimateSensor, pulse::IsrEdgeCounter};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("PulseNode v{}", env!("CARGO_PKG_VERSION"));
    diagnostics::install_panic_handler();

    // ── 2. Raw peripherals (pulse input, LEDC, ISR) ───────────
    // A failure here is raised inside the supervised boundary so it gets
    // the same timed recovery as any other fault.
    let init_fault: Option<Fault> = hw_init::init_peripherals()
        .and_then(|()| hw_init::init_isr_service())
        .err()
        .map(Fault::from);
    if let Some(fault) = &init_fault {
        error!("Peripheral init failed: {}", fault);
    }

    // ── 3. HAL singletons ─────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ── 4. Construct adapters ─────────────────────────────────
    // SDA/SCL match pins::I2C_SDA_GPIO / pins::I2C_SCL_GPIO.
    let i2c_config = I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ));
    let climate = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio3,
        peripherals.pins.gpio4,
        &i2c_config,
    )
    .map(|bus| ClimateSensor::new(bus, Delay::new_default()))
    .map_err(|e| warn!("I2C init failed ({}), running without climate sensor", e))
    .ok();

    let mut hw = HardwareAdapter::new(climate, StatusLed::new(), SystemDelay::new());
    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, Some(nvs_partition.clone()));
    let mut mqtt = MqttTelemetry::new();
    let config = NvsAdapter::new(nvs_partition);
    let counter = IsrEdgeCounter::new(pins::PULSE_GPIO);

    // ── 5. Supervised run ─────────────────────────────────────
    let mut supervisor =
        FaultSupervisor::new(Watchdog::new(), PlatformRestart::new(), SystemDelay::new());
    let action = supervisor.supervise(&mut LogEventSink::new(), |watchdog| {
        if let Some(fault) = init_fault {
            return Err(fault);
        }
        NodeService::new(config, counter).start(
            &mut hw,
            &mut wifi,
            &mut mqtt,
            watchdog,
            &mut LogEventSink::new(),
        )
    });

    // Both restart paths diverge on hardware.
    error!("{} did not take effect", action);
    Ok(())
}
