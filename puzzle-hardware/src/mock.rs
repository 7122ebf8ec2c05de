//! Simulated MCU transport
//!
//! Answers the four supported commands the way the firmware does, including
//! reply checksums, and remembers written PWM duties. Cloning shares the
//! simulated state, so a caller can keep a handle after handing a clone to a
//! gateway.

use crate::gateway::McuTransport;
use puzzle_core::protocol::{
    checksum, fan_pwm, fan_rpm, CHECKSUM_RESPONSE_OK, CMD_FAN, CMD_FAN_PWM_READ,
    CMD_FAN_PWM_WRITE, CMD_HEADER_START, CMD_RESPONSE_OK, CMD_TEMP, CMD_TEMP_ALL,
    TEMP_SENSOR_COUNT,
};
use puzzle_core::{BoardConfig, DefaultBoard, PuzzleError, Result};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

const PWM_CHANNELS: usize = DefaultBoard::PWM_CHANNELS;
const FAN_CHANNELS: usize = DefaultBoard::FAN_CHANNELS;

#[derive(Debug)]
struct MockState {
    temperatures: [u8; 2],
    tach: [u16; FAN_CHANNELS],
    pwm: [u8; PWM_CHANNELS],
    commands: Vec<Vec<u8>>,
}

/// In-process stand-in for the MCU
#[derive(Debug, Clone)]
pub struct MockMcu {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockMcu {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMcu {
    /// 40 °C / 35 °C, every tachometer at 2400 RPM, both PWM outputs at full duty
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                temperatures: [0x80 + 40, 0x80 + 35],
                tach: [80; FAN_CHANNELS],
                pwm: [255; PWM_CHANNELS],
                commands: Vec::new(),
            })),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the raw NTC bytes reported for both sensors
    pub fn set_temperatures(&self, raw: [u8; 2]) {
        self.state().temperatures = raw;
    }

    /// Set the raw tachometer count of one input
    pub fn set_tach(&self, channel: usize, count: u16) {
        self.state().tach[channel] = count;
    }

    /// Current duty of one PWM output
    pub fn pwm(&self, channel: usize) -> u8 {
        self.state().pwm[channel]
    }

    /// Every command received so far, checksum slot included
    pub fn commands(&self) -> Vec<Vec<u8>> {
        self.state().commands.clone()
    }

    fn respond(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut state = self.state();

        let mut reply = match payload {
            [CMD_HEADER_START, CMD_TEMP, CMD_TEMP_ALL] => vec![
                CMD_HEADER_START,
                CMD_TEMP,
                CMD_TEMP_ALL,
                TEMP_SENSOR_COUNT,
                state.temperatures[0],
                state.temperatures[1],
            ],
            [CMD_HEADER_START, CMD_FAN, selector] => {
                let channel = channel_index(*selector, fan_rpm(0), FAN_CHANNELS)?;
                let [hi, lo] = state.tach[channel].to_be_bytes();
                vec![CMD_HEADER_START, CMD_FAN, *selector, hi, lo, 0x00]
            }
            [CMD_HEADER_START, CMD_FAN, CMD_FAN_PWM_READ, selector] => {
                let channel = channel_index(*selector, fan_pwm(0), PWM_CHANNELS)?;
                vec![CMD_HEADER_START, CMD_FAN, CMD_FAN_PWM_READ, state.pwm[channel]]
            }
            [CMD_HEADER_START, CMD_FAN, CMD_FAN_PWM_WRITE, selector, duty] => {
                let channel = channel_index(*selector, fan_pwm(0), PWM_CHANNELS)?;
                state.pwm[channel] = *duty;
                return Ok(vec![CMD_HEADER_START, CMD_RESPONSE_OK, CHECKSUM_RESPONSE_OK]);
            }
            _ => {
                return Err(PuzzleError::Transport(format!(
                    "unsupported command {:02X?}",
                    payload
                )))
            }
        };

        reply.push(checksum(&reply));
        Ok(reply)
    }
}

fn channel_index(selector: u8, base: u8, count: usize) -> Result<usize> {
    let index = selector.wrapping_sub(base) as usize;
    if index >= count {
        return Err(PuzzleError::Transport(format!(
            "unknown channel selector 0x{:02X}",
            selector
        )));
    }
    Ok(index)
}

impl McuTransport for MockMcu {
    fn write_command(&mut self, command: &[u8], reply: &mut [u8]) -> Result<usize> {
        self.state().commands.push(command.to_vec());

        let payload = command
            .split_last()
            .map(|(_, payload)| payload)
            .ok_or_else(|| PuzzleError::Transport("empty command".to_string()))?;

        let bytes = self.respond(payload)?;
        debug!("Mock MCU reply: {:02X?}", bytes);

        reply[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }
}
