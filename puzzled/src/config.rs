//! Configuration loading
//!
//! Resolves the config path (CLI flag > `PUZZLE_CONFIG` > default), reads the
//! TOML file, and applies command-line overrides.

use puzzle_core::{default_config_path, PuzzleError, Result, StaticConfig};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "PUZZLE_CONFIG";

/// Pick the configuration file to load
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    cli_path.unwrap_or_else(|| {
        std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path())
    })
}

/// Load static config from a TOML file
///
/// A missing file is not an error: the defaults describe a board with no
/// cooling channels on the default serial port.
pub async fn load_config(path: &Path) -> Result<StaticConfig> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        info!(
            "Config not found at {}. Using defaults.",
            path.display()
        );
        return Ok(StaticConfig::default());
    }

    info!("Loading configuration from: {}", path.display());

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| PuzzleError::Config(format!("Failed to read config file: {}", e)))?;

    let config = StaticConfig::from_toml(&content)
        .map_err(|e| PuzzleError::Config(format!("Failed to parse config file: {}", e)))?;

    debug!(
        "Configuration loaded: device={}, {} cooling channel(s)",
        config.serial.device,
        config.cooling.len()
    );
    Ok(config)
}

/// Apply command-line overrides on top of the file configuration
pub fn apply_overrides(mut config: StaticConfig, device: Option<String>) -> StaticConfig {
    if let Some(device) = device {
        config.serial.device = device;
    }
    config
}
