//! Configuration types
//!
//! - [`StaticConfig`] - serial link, monitor and cooling channel settings,
//!   loaded once at startup
//! - [`CoolingConfig`] - one PWM channel under thermal control

mod paths;
mod static_config;

pub use paths::default_config_path;
pub use static_config::{CoolingConfig, MonitorConfig, SerialConfig, StaticConfig};
