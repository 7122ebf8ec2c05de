//! Static configuration loaded once at startup
//!
//! Stands in for the board description: serial link parameters plus the PWM
//! channels handed to thermal control. Read-only after startup.

use serde::{Deserialize, Serialize};

use crate::board::{BoardConfig, DefaultBoard};

/// Serial link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Serial device path
    pub device: String,
    /// Baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Reply timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_baud_rate() -> u32 {
    DefaultBoard::BAUD_RATE
}

fn default_timeout_ms() -> u64 {
    DefaultBoard::DEFAULT_TIMEOUT_MS
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyS1".to_string(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Polling monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between two polls of every attribute
    pub interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { interval_secs: 2 }
    }
}

/// One PWM channel handed to thermal control
///
/// The channel stays a raw number here; it is validated when the cooling
/// device is registered so a bad entry only fails itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoolingConfig {
    /// PWM channel (0 or 1)
    pub channel: u8,
    /// Per-level duty values, must not be empty
    #[serde(default)]
    pub cooling_levels: Vec<u8>,
}

impl CoolingConfig {
    pub fn new(channel: u8, cooling_levels: Vec<u8>) -> Self {
        Self {
            channel,
            cooling_levels,
        }
    }
}

/// Static configuration for the MCU monitor.
///
/// Located at `~/.config/puzzle/config.toml` by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticConfig {
    /// Serial link configuration
    #[serde(default)]
    pub serial: SerialConfig,

    /// Polling monitor configuration
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// PWM channels under thermal control
    #[serde(default)]
    pub cooling: Vec<CoolingConfig>,
}

impl StaticConfig {
    /// Parse StaticConfig from TOML string.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize StaticConfig to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
