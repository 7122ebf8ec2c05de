//! PUZZLE Core Library
//!
//! Shared types, protocol constants, and configuration for the WT61P803
//! PUZZLE MCU monitoring core. Used by the hardware crate and the `puzzled`
//! front end.

pub mod board;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use board::*;
pub use config::{default_config_path, CoolingConfig, MonitorConfig, SerialConfig, StaticConfig};
pub use error::*;
pub use types::*;
