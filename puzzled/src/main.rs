//! PUZZLE MCU monitor
//!
//! Reads temperatures and fan speeds, drives the PWM outputs and the cooling
//! devices of a WT61P803 PUZZLE board over its UART.

use anyhow::Result;
use clap::Parser;
use puzzled::cli::{
    handle_cooling, handle_cooling_set, handle_get, handle_monitor, handle_ports, handle_sensors,
    handle_set, Cli, Commands,
};
use puzzled::config::{apply_overrides, load_config, resolve_config_path};
use puzzled::device::Device;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Port listing needs neither configuration nor a device
    if let Commands::Ports = cli.command {
        return exit_on_error(handle_ports(cli.format).await, cli.verbose);
    }

    // Determine config path: CLI flag > env var > default
    let config_path = resolve_config_path(cli.config.clone());
    info!("Configuration file: {}", config_path.display());

    let config = match load_config(&config_path).await {
        Ok(config) => apply_overrides(config, cli.device.clone()),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let device = {
        let config = config.clone();
        let (mock, verbose) = (cli.mock, cli.verbose);
        tokio::task::spawn_blocking(move || Device::open(&config, mock, verbose)).await?
    };
    let device = match device {
        Ok(device) => Arc::new(device),
        Err(e) => {
            eprintln!("Error: Cannot open MCU at {}", config.serial.device);
            eprintln!("Connection error: {}", e);
            std::process::exit(1);
        }
    };

    let format = cli.format;
    let result = match cli.command {
        Commands::Sensors => handle_sensors(&device, format).await,
        Commands::Get { attribute } => handle_get(&device, &attribute, format).await,
        Commands::Set { attribute, value } => handle_set(&device, &attribute, value, format).await,
        Commands::Cooling => handle_cooling(&device, format).await,
        Commands::CoolingSet { channel, state } => {
            handle_cooling_set(&device, channel, state, format).await
        }
        Commands::Monitor { interval } => {
            let interval = interval.unwrap_or(config.monitor.interval_secs);
            handle_monitor(&device, interval, format).await
        }
        Commands::Ports => handle_ports(format).await,
    };

    exit_on_error(result, cli.verbose)
}

fn exit_on_error(result: Result<()>, verbose: bool) -> Result<()> {
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if verbose {
            eprintln!("Error details: {:?}", e);
        }
        std::process::exit(1);
    }
    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
