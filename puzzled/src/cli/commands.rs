//! CLI command and subcommand definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// WT61P803 PUZZLE MCU monitor
#[derive(Parser, Debug)]
#[command(name = "puzzled")]
#[command(version, about = "WT61P803 PUZZLE MCU sensor and fan control", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Serial device path (overrides config file)
    #[arg(short, long, global = true)]
    pub device: Option<String>,

    /// Run against a simulated MCU instead of the serial port
    #[arg(long, global = true)]
    pub mock: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty table output
    Table,
    /// JSON output
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read every temperature, fan and PWM attribute once
    Sensors,

    /// Read one attribute (e.g. temp1_input, fan2_input, pwm1)
    Get {
        /// Attribute name
        attribute: String,
    },

    /// Write a PWM attribute (e.g. pwm2 128)
    Set {
        /// Attribute name
        attribute: String,
        /// Raw duty 0-255
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },

    /// Show cooling devices and their current state
    Cooling,

    /// Set the state of a cooling device, as a governor would
    CoolingSet {
        /// PWM channel of the cooling device (0 or 1)
        channel: u8,
        /// State 0-255
        state: u64,
    },

    /// Poll every attribute periodically until interrupted
    Monitor {
        /// Seconds between polls (overrides config file)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// List serial ports
    Ports,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_set_command() {
        let cli = Cli::parse_from(["puzzled", "--mock", "set", "pwm2", "128"]);
        assert!(cli.mock);
        match cli.command {
            Commands::Set { attribute, value } => {
                assert_eq!(attribute, "pwm2");
                assert_eq!(value, 128);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["puzzled", "sensors", "--format", "json", "-d", "/dev/ttyS3"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.device.as_deref(), Some("/dev/ttyS3"));
    }

    #[test]
    fn test_negative_value_reaches_validation() {
        let cli = Cli::parse_from(["puzzled", "set", "pwm1", "-5"]);
        assert!(matches!(cli.command, Commands::Set { value: -5, .. }));
    }
}
