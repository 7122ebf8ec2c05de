//! Command execution handlers
//!
//! Every MCU exchange blocks on the serial line, so handlers move the work
//! onto the blocking pool and keep the runtime free for signal handling.

use anyhow::{anyhow, bail, Result};
use puzzle_core::Attribute;
use puzzle_hardware::{available_ports, CoolingDevice};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

use crate::device::Device;
use crate::format::{format_cooling, format_reading, format_readings, format_success};

use super::commands::OutputFormat;

/// Run a closure against the device on the blocking pool
async fn blocking<F, R>(device: &Arc<Device>, f: F) -> Result<R>
where
    F: FnOnce(&Device) -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    let device = Arc::clone(device);
    tokio::task::spawn_blocking(move || f(&device))
        .await
        .map_err(|e| anyhow!("Device task failed: {}", e))?
}

/// Handle sensors command
pub async fn handle_sensors(device: &Arc<Device>, format: OutputFormat) -> Result<()> {
    let readings = blocking(device, |dev| Ok(dev.hwmon.read_all())).await?;
    println!("{}", format_readings(&readings, format)?);
    Ok(())
}

/// Handle get command
pub async fn handle_get(device: &Arc<Device>, attribute: &str, format: OutputFormat) -> Result<()> {
    let attr: Attribute = attribute.parse()?;
    let reading = blocking(device, move |dev| Ok(dev.hwmon.snapshot(attr))).await?;

    if let Some(err) = &reading.error {
        bail!("Failed to read {}: {}", reading.name, err);
    }

    println!("{}", format_reading(&reading, format)?);
    Ok(())
}

/// Handle set command
pub async fn handle_set(
    device: &Arc<Device>,
    attribute: &str,
    value: i64,
    format: OutputFormat,
) -> Result<()> {
    let attr: Attribute = attribute.parse()?;
    blocking(device, move |dev| Ok(dev.hwmon.write(attr, value)?)).await?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "attribute": attr.name(), "value": value, "status": "ok" })
        ),
        OutputFormat::Table => {
            println!("{}", format_success(&format!("Set {} to {}", attr, value)))
        }
    }
    Ok(())
}

/// Handle cooling command
pub async fn handle_cooling(device: &Arc<Device>, format: OutputFormat) -> Result<()> {
    let statuses = blocking(device, |dev| {
        Ok(dev.cooling.iter().map(|c| c.status()).collect::<Vec<_>>())
    })
    .await?;
    println!("{}", format_cooling(&statuses, format)?);
    Ok(())
}

/// Handle cooling-set command
pub async fn handle_cooling_set(
    device: &Arc<Device>,
    channel: u8,
    state: u64,
    format: OutputFormat,
) -> Result<()> {
    let name = blocking(device, move |dev| {
        let cooling = dev
            .cooling_device(channel)
            .ok_or_else(|| anyhow!("No cooling device registered on channel {}", channel))?;
        cooling.set_current_state(state)?;
        Ok(cooling.name().to_string())
    })
    .await?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "device": name, "state": state, "status": "ok" })
        ),
        OutputFormat::Table => {
            println!("{}", format_success(&format!("Set {} to state {}", name, state)))
        }
    }
    Ok(())
}

/// Handle monitor command
///
/// Polls every attribute at a fixed interval until Ctrl+C or SIGTERM.
pub async fn handle_monitor(
    device: &Arc<Device>,
    interval_secs: u64,
    format: OutputFormat,
) -> Result<()> {
    if interval_secs == 0 {
        bail!("Monitor interval must be at least 1 second");
    }

    info!("Monitoring every {}s, press Ctrl+C to stop", interval_secs);
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let readings = blocking(device, |dev| Ok(dev.hwmon.read_all())).await?;
                println!("{}", format_readings(&readings, format)?);
            }
            _ = &mut shutdown => break,
        }
    }

    info!("Monitor stopped");
    Ok(())
}

/// Handle ports command
pub async fn handle_ports(format: OutputFormat) -> Result<()> {
    let ports = tokio::task::spawn_blocking(available_ports)
        .await
        .map_err(|e| anyhow!("Port enumeration task failed: {}", e))??;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ports)?),
        OutputFormat::Table => {
            if ports.is_empty() {
                println!("No serial ports found");
            }
            for port in ports {
                println!("{}", port);
            }
        }
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, stopping..."),
        _ = terminate => info!("Received SIGTERM, stopping..."),
    }
}
