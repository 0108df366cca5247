pub mod read_config;

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

pub type BaudRate = u32;
pub const DEFAULT_BAUD_RATE: BaudRate = 9_600;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1_000;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

pub const DEFAULT_PATH_TOKEN: &str = "usb";
pub const DEFAULT_VENDOR_TOKEN: &str = "arduino";

pub const DEFAULT_FLOW: f64 = 10.0;
pub const DEFAULT_ON_SECS: f64 = 5.0;
pub const DEFAULT_OFF_SECS: f64 = 5.0;

pub const CONFIG_FILE_NAME: &str = "pumpconsole.json";

/// Link constants, discovery tokens and form defaults.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub baud_rate: BaudRate,
    pub read_timeout_ms: u64,
    pub settle_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub path_token: String,
    pub vendor_token: String,
    pub default_flow: f64,
    pub default_on_secs: f64,
    pub default_off_secs: f64,
    pub session_log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            path_token: DEFAULT_PATH_TOKEN.to_string(),
            vendor_token: DEFAULT_VENDOR_TOKEN.to_string(),
            default_flow: DEFAULT_FLOW,
            default_on_secs: DEFAULT_ON_SECS,
            default_off_secs: DEFAULT_OFF_SECS,
            session_log_dir: None,
        }
    }
}

impl Config {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_device_firmware() {
        let cfg = Config::default();
        assert_eq!(cfg.baud_rate, 9600);
        assert_eq!(cfg.read_timeout(), Duration::from_secs(1));
        assert_eq!(cfg.settle_delay(), Duration::from_secs(2));
        assert_eq!(cfg.poll_interval(), Duration::from_millis(100));
        assert_eq!(cfg.session_log_dir, None);
    }
}
