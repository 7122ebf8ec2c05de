//! Serial driver for low-level MCU communication
//!
//! Frames commands onto the UART, fills in the XOR checksum, and collects one
//! reply per command. A reply ends when the line goes idle.

use crate::gateway::McuTransport;
use puzzle_core::protocol::checksum;
use puzzle_core::{PuzzleError, Result};
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio_serial::SerialPort;
use tracing::{debug, error, warn};

/// Silence on the line that ends a reply
const INTER_BYTE_GAP: Duration = Duration::from_millis(10);

/// Blocking serial transport to the MCU
pub struct SerialDriver {
    port: Box<dyn SerialPort>,
    timeout_duration: Duration,
    debug_uart: bool,
}

impl SerialDriver {
    /// Open the serial port
    ///
    /// # Arguments
    /// * `port_path` - Path to the serial device (e.g., "/dev/ttyS1")
    /// * `baud_rate` - Line speed, normally `BoardConfig::BAUD_RATE`
    /// * `timeout_ms` - How long to wait for the first reply byte
    /// * `debug_uart` - Enable UART debug logging
    ///
    /// A device node that does not exist is reported as `DeviceNotFound`.
    pub fn new(port_path: &str, baud_rate: u32, timeout_ms: u64, debug_uart: bool) -> Result<Self> {
        debug!("Opening serial port: {} at {} baud", port_path, baud_rate);

        let port = tokio_serial::new(port_path, baud_rate)
            .timeout(INTER_BYTE_GAP)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open()
            .map_err(|e| {
                error!("Failed to open serial port {}: {}", port_path, e);
                if is_missing_device(port_path, &e) {
                    PuzzleError::DeviceNotFound(port_path.to_string())
                } else {
                    PuzzleError::Serial(format!("Failed to open serial port: {}", e))
                }
            })?;

        debug!("Serial port opened successfully");

        Ok(Self {
            port,
            timeout_duration: Duration::from_millis(timeout_ms),
            debug_uart,
        })
    }

    fn send(&mut self, command: &[u8]) -> Result<()> {
        let mut wire = command.to_vec();
        if let Some((slot, body)) = wire.split_last_mut() {
            *slot = checksum(body);
        }

        if self.debug_uart {
            debug!("TX: {:02X?}", wire);
        }

        self.port.write_all(&wire).map_err(|e| {
            error!("Write failed: {}", e);
            PuzzleError::Serial(format!("Write failed: {}", e))
        })?;
        self.port
            .flush()
            .map_err(|e| PuzzleError::Serial(format!("Flush failed: {}", e)))
    }

    /// Read until the line is idle after at least one byte, or the reply
    /// buffer is full
    fn read_reply(&mut self, reply: &mut [u8]) -> Result<usize> {
        let deadline = Instant::now() + self.timeout_duration;
        let mut len = 0;

        while len < reply.len() {
            match self.port.read(&mut reply[len..]) {
                Ok(0) => {
                    warn!("Serial port returned EOF - device may have been disconnected");
                    return Err(PuzzleError::Serial("Serial port returned EOF".to_string()));
                }
                Ok(n) => len += n,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    if len > 0 {
                        break;
                    }
                    if Instant::now() >= deadline {
                        error!("Read timeout");
                        return Err(PuzzleError::Timeout(
                            "No reply from MCU".to_string(),
                        ));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("Read error: {}", e);
                    return Err(PuzzleError::Serial(format!("Read error: {}", e)));
                }
            }
        }

        if self.debug_uart {
            debug!("RX: {:02X?}", &reply[..len]);
        }

        verify_checksum(&reply[..len])?;
        Ok(len)
    }

    fn clear_input_buffer(&mut self) -> Result<()> {
        self.port
            .clear(tokio_serial::ClearBuffer::Input)
            .map_err(|e| {
                warn!("Failed to clear input buffer: {}", e);
                PuzzleError::Serial(format!("Failed to clear buffer: {}", e))
            })
    }
}

impl McuTransport for SerialDriver {
    fn write_command(&mut self, command: &[u8], reply: &mut [u8]) -> Result<usize> {
        // Drop stale bytes from an earlier timed-out reply
        self.clear_input_buffer()?;
        self.send(command)?;
        self.read_reply(reply)
    }
}

fn is_missing_device(port_path: &str, err: &tokio_serial::Error) -> bool {
    match err.kind() {
        tokio_serial::ErrorKind::NoDevice => true,
        tokio_serial::ErrorKind::Io(io::ErrorKind::NotFound) => true,
        _ => cfg!(unix) && !Path::new(port_path).exists(),
    }
}

/// Check the trailing XOR checksum of a reply
pub fn verify_checksum(reply: &[u8]) -> Result<()> {
    let Some((&actual, body)) = reply.split_last() else {
        return Err(PuzzleError::Transport("empty reply".to_string()));
    };

    let expected = checksum(body);
    if actual != expected {
        warn!("Reply checksum mismatch: {:02X?}", reply);
        return Err(PuzzleError::Checksum { expected, actual });
    }
    Ok(())
}

/// List serial ports the system knows about
pub fn available_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports().map_err(|e| {
        error!("Failed to enumerate serial ports: {}", e);
        PuzzleError::Serial(format!("Failed to enumerate ports: {}", e))
    })?;

    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
