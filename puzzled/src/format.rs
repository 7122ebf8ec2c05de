//! Output formatting utilities for the CLI
//!
//! Provides table and JSON formatting with colors.

use crate::cli::OutputFormat;
use anyhow::Result;
use colored::*;
use puzzle_core::{AttributeReading, CoolingStatus, SensorKind};
use tabled::{settings::Style, Table, Tabled};

/// Human-readable value with its unit
fn display_value(kind: SensorKind, value: i64) -> String {
    match kind {
        SensorKind::Temperature => format!("{:.1} °C", value as f64 / 1000.0),
        SensorKind::Fan => format!("{} RPM", value),
        SensorKind::Pwm => format!("{} ({}%)", value, value * 100 / 255),
    }
}

/// Format attribute readings
pub fn format_readings(readings: &[AttributeReading], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(readings)?),
        OutputFormat::Table => {
            #[derive(Tabled)]
            struct ReadingRow {
                #[tabled(rename = "Attribute")]
                name: String,
                #[tabled(rename = "Value")]
                value: String,
                #[tabled(rename = "Mode")]
                mode: String,
            }

            let rows: Vec<ReadingRow> = readings
                .iter()
                .map(|r| ReadingRow {
                    name: r.name.cyan().to_string(),
                    value: match (r.value, &r.error) {
                        (Some(v), _) => display_value(r.kind, v).green().to_string(),
                        (None, Some(e)) => format!("error: {}", e).red().to_string(),
                        (None, None) => "-".dimmed().to_string(),
                    },
                    mode: format!("{:o}", r.access.mode()).dimmed().to_string(),
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", "Sensors:".bold(), table))
        }
    }
}

/// Format a single attribute reading
pub fn format_reading(reading: &AttributeReading, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reading)?),
        OutputFormat::Table => Ok(match reading.value {
            Some(v) => format!(
                "{}: {}",
                reading.name.cyan(),
                display_value(reading.kind, v).green()
            ),
            None => format!(
                "{}: {}",
                reading.name.cyan(),
                reading.error.as_deref().unwrap_or("no value").red()
            ),
        }),
    }
}

/// Format cooling device states
pub fn format_cooling(devices: &[CoolingStatus], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(devices)?),
        OutputFormat::Table => {
            if devices.is_empty() {
                return Ok("No cooling devices configured".yellow().to_string());
            }

            #[derive(Tabled)]
            struct CoolingRow {
                #[tabled(rename = "Device")]
                name: String,
                #[tabled(rename = "Channel")]
                channel: String,
                #[tabled(rename = "State")]
                state: String,
                #[tabled(rename = "Levels")]
                levels: String,
            }

            let rows: Vec<CoolingRow> = devices
                .iter()
                .map(|d| CoolingRow {
                    name: d.name.cyan().to_string(),
                    channel: d.channel.to_string(),
                    state: match (d.current_state, &d.error) {
                        (Some(s), _) => format!("{}/{}", s, d.max_state).green().to_string(),
                        (None, Some(e)) => format!("error: {}", e).red().to_string(),
                        (None, None) => "-".dimmed().to_string(),
                    },
                    levels: d
                        .cooling_levels
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", "Cooling Devices:".bold(), table))
        }
    }
}

/// Format a success message
pub fn format_success(message: &str) -> String {
    format!("{} {}", "✓".green(), message)
}
