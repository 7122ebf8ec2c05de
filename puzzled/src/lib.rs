//! puzzled
//!
//! Command-line front end for the WT61P803 PUZZLE MCU. Opens the serial link
//! (or a simulated MCU), registers the configured cooling devices and exposes
//! the sensor attributes.

// Internal CLI implementation - not part of public API
#[doc(hidden)]
pub mod cli;

/// Configuration file loading and overrides.
pub mod config;

/// Transport, facade and cooling devices assembled from configuration.
pub mod device;

// Internal formatting functions - not part of public API
#[doc(hidden)]
pub mod format;
