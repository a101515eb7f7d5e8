//! System configuration parameters
//!
//! All tunable parameters for the relay controller.  Wi-Fi credentials
//! default to the `WIFI_SSID` / `WIFI_PASS` environment variables captured
//! at build time; everything else has a compiled-in default.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound accepted for `max_phase_ms` itself (7 days).
const MAX_PHASE_CEILING_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// Smallest httpd task stack accepted (KiB).
const MIN_HTTP_STACK_KB: usize = 4;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Network ---
    /// Station SSID to join
    pub wifi_ssid: heapless::String<32>,
    /// WPA2 passphrase (empty for open networks)
    pub wifi_password: heapless::String<64>,
    /// HTTP listen port
    pub http_port: u16,
    /// HTTP server task stack (KiB)
    pub http_stack_kb: usize,

    // --- Cycles ---
    /// Longest accepted on or off phase (milliseconds)
    pub max_phase_ms: u64,
    /// FreeRTOS priority of cycle tasks
    pub cycle_task_priority: u8,
    /// Stack for each cycle task (KiB)
    pub cycle_task_stack_kb: usize,

    // --- Supervision ---
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,
    /// Main supervisor loop period (milliseconds)
    pub supervisor_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Network
            wifi_ssid: env_string(option_env!("WIFI_SSID")),
            wifi_password: env_string(option_env!("WIFI_PASS")),
            http_port: 80,
            http_stack_kb: 8,

            // Cycles
            max_phase_ms: 24 * 60 * 60 * 1000, // 24 h
            cycle_task_priority: 5,
            cycle_task_stack_kb: 4,

            // Supervision
            watchdog_timeout_ms: 10_000,
            supervisor_interval_ms: 1_000, // 1 Hz
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<()> {
        if self.http_port == 0 {
            return Err(Error::Config("http_port must be non-zero"));
        }
        if self.http_stack_kb < MIN_HTTP_STACK_KB {
            return Err(Error::Config("http_stack_kb must be at least 4"));
        }
        if self.max_phase_ms == 0 || self.max_phase_ms > MAX_PHASE_CEILING_MS {
            return Err(Error::Config("max_phase_ms must be within 1 ms ..= 7 days"));
        }
        if self.cycle_task_stack_kb < 2 {
            return Err(Error::Config("cycle_task_stack_kb must be at least 2"));
        }
        if self.cycle_task_priority == 0 || self.cycle_task_priority >= 25 {
            return Err(Error::Config("cycle_task_priority must be within 1..25"));
        }
        if self.supervisor_interval_ms == 0
            || self.supervisor_interval_ms >= self.watchdog_timeout_ms
        {
            return Err(Error::Config(
                "supervisor_interval_ms must be non-zero and below watchdog_timeout_ms",
            ));
        }
        Ok(())
    }

    /// Parse a JSON override on top of the defaults and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed config JSON"))?;
        config.validate()?;
        Ok(config)
    }
}

/// Build-time credential; values longer than the field are dropped.
fn env_string<const N: usize>(value: Option<&str>) -> heapless::String<N> {
    let mut s = heapless::String::new();
    if let Some(v) = value {
        if s.push_str(v).is_err() {
            s.clear();
        }
    }
    s
}
