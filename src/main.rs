//! pumpctl firmware — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  EspHttpServer ──▶ http::handle       WifiAdapter            │
//! │                        │              (Connectivity)         │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                        ▼                                     │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │  RelayScheduler ──▶ CycleHandle × N (pinned tasks) │      │
//! │  └────────────────────────────────────────────────────┘      │
//! │                        │                                     │
//! │                        ▼                                     │
//! │            PinBank (OutputPort, GPIO 23/22/21)               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! After setup the main task only supervises: it polls Wi-Fi for
//! reconnects and feeds the task watchdog.  Relay work happens on the
//! HTTP task and the per-relay cycle tasks.
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::{AnyOutputPin, Output, OutputPin as _, PinDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{info, warn};

use pumpctl::adapters::pin_bank::PinBank;
use pumpctl::adapters::wifi::{ConnectivityPort, WifiAdapter};
use pumpctl::app::relay::RelayId;
use pumpctl::config::SystemConfig;
use pumpctl::drivers::watchdog::Watchdog;
use pumpctl::http;
use pumpctl::scheduler::{RelayScheduler, SchedulerLimits};

type RelayPin = PinDriver<'static, AnyOutputPin, Output>;

fn load_config() -> SystemConfig {
    let Some(json) = option_env!("PUMPCTL_CONFIG") else {
        return SystemConfig::default();
    };
    match SystemConfig::from_json(json) {
        Ok(cfg) => {
            info!("Config: using PUMPCTL_CONFIG override");
            cfg
        }
        Err(e) => {
            warn!("Config: {} — using defaults", e);
            SystemConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("pumpctl v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config();
    let peripherals = Peripherals::take()?;

    // ── 2. Relay outputs, driven low before anything else ─────
    let pins: [RelayPin; 3] = [
        PinDriver::output(peripherals.pins.gpio23.downgrade_output())?,
        PinDriver::output(peripherals.pins.gpio22.downgrade_output())?,
        PinDriver::output(peripherals.pins.gpio21.downgrade_output())?,
    ];
    let bank = Arc::new(PinBank::new(pins)?);
    for relay in RelayId::ALL {
        info!("{} on GPIO {}", relay, relay.gpio());
    }

    let scheduler = Arc::new(RelayScheduler::new(bank, SchedulerLimits::from(&config)));

    // ── 3. Wi-Fi station ──────────────────────────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let driver = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;
    let mut wifi = WifiAdapter::new(driver);
    match wifi.set_credentials(config.wifi_ssid.as_str(), config.wifi_password.as_str()) {
        Ok(()) => {
            // A failed first attempt is retried by `poll` with backoff.
            if let Err(e) = wifi.connect() {
                warn!("WiFi: initial connect failed ({})", e);
            }
        }
        Err(e) => warn!("WiFi: {} — HTTP control unavailable", e),
    }

    // ── 4. HTTP command surface ───────────────────────────────
    let _server = http::server::start(scheduler.clone(), &config)?;

    // ── 5. Supervisor loop ────────────────────────────────────
    let watchdog = Watchdog::new(config.watchdog_timeout_ms);
    let tick = std::time::Duration::from_millis(u64::from(config.supervisor_interval_ms));
    info!("System ready. Entering supervisor loop.");

    loop {
        wifi.poll(config.supervisor_interval_ms);
        watchdog.feed();
        std::thread::sleep(tick);
    }
}
