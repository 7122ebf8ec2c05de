//! Board definitions and MCU protocol constants
//!
//! The `BoardConfig` trait captures the fixed characteristics of an MCU
//! variant (channel counts, serial parameters, reply buffer size). The
//! `protocol` module holds the command bytes and reply layout the MCU
//! firmware speaks.
//!
//! Note: Actual hardware I/O is in the `puzzle-hardware` crate. This module only
//! holds per-board limits and the MCU command set.

/// Hardware board configuration trait
///
/// # Example
///
/// ```
/// use puzzle_core::board::{BoardConfig, Wt61p803Puzzle};
///
/// const PWM_CHANNELS: usize = Wt61p803Puzzle::PWM_CHANNELS;
/// const NAME: &str = Wt61p803Puzzle::NAME;
/// ```
pub trait BoardConfig: Send + Sync + 'static {
    /// Human-readable board name
    const NAME: &'static str;

    /// Number of PWM outputs
    const PWM_CHANNELS: usize;

    /// Number of fan tachometer inputs
    const FAN_CHANNELS: usize;

    /// Number of NTC temperature sensors
    const TEMP_CHANNELS: usize;

    /// Serial communication baud rate
    const BAUD_RATE: u32;

    /// Default communication timeout in milliseconds
    const DEFAULT_TIMEOUT_MS: u64;

    /// Maximum raw PWM duty value
    const MAX_PWM: u8;

    /// Size of the shared reply buffer
    const BUF_SIZE: usize;
}

/// IEI WT61P803 PUZZLE board management MCU
///
/// - 2 PWM fan outputs, raw duty 0-255
/// - 5 fan tachometer inputs
/// - 2 NTC temperature sensors reported together
/// - 115200 baud, 8N1
pub struct Wt61p803Puzzle;

impl BoardConfig for Wt61p803Puzzle {
    const NAME: &'static str = "WT61P803 PUZZLE";
    const PWM_CHANNELS: usize = 2;
    const FAN_CHANNELS: usize = 5;
    const TEMP_CHANNELS: usize = 2;
    const BAUD_RATE: u32 = 115200;
    const DEFAULT_TIMEOUT_MS: u64 = 1000;
    const MAX_PWM: u8 = 255;
    const BUF_SIZE: usize = 512;
}

/// Default board type used throughout the codebase
pub type DefaultBoard = Wt61p803Puzzle;

/// Command bytes and reply layout of the MCU firmware
pub mod protocol {
    /// Frame header for every command and for acknowledgements (`@`)
    pub const CMD_HEADER_START: u8 = 0x40;
    /// Acknowledgement status byte (`0`)
    pub const CMD_RESPONSE_OK: u8 = 0x30;
    /// Checksum of a `@0` acknowledgement
    pub const CHECKSUM_RESPONSE_OK: u8 = 0x70;

    /// Fan command group (`F`)
    pub const CMD_FAN: u8 = 0x46;
    /// PWM duty read (`Z`)
    pub const CMD_FAN_PWM_READ: u8 = 0x5A;
    /// PWM duty write (`W`)
    pub const CMD_FAN_PWM_WRITE: u8 = 0x57;
    /// First PWM channel selector (`P`)
    pub const CMD_FAN_PWM_BASE: u8 = 0x50;
    /// First tachometer selector (`A`)
    pub const CMD_FAN_RPM_BASE: u8 = 0x41;

    /// Temperature command group (`T`)
    pub const CMD_TEMP: u8 = 0x54;
    /// Query every NTC sensor at once (`A`)
    pub const CMD_TEMP_ALL: u8 = 0x41;

    /// Sensor-count marker carried by temperature replies
    pub const TEMP_SENSOR_COUNT: u8 = b'2';
    /// Offset of the sensor-count marker in a temperature reply
    pub const TEMP_COUNT_OFFSET: usize = 3;
    /// Offset of the first sensor byte in a temperature reply
    pub const TEMP_BASE_OFFSET: usize = 4;
    /// Offsets of the big-endian tachometer pair in a fan reply
    pub const FAN_HI_OFFSET: usize = 3;
    pub const FAN_LO_OFFSET: usize = 4;
    /// Offset of the echoed operation selector in a PWM read reply
    pub const PWM_ECHO_OFFSET: usize = 2;
    /// Offset of the duty byte in a PWM read reply
    pub const PWM_DUTY_OFFSET: usize = 3;

    /// Reply lengths per operation
    pub const TEMP_REPLY_LEN: usize = 7;
    pub const FAN_REPLY_LEN: usize = 7;
    pub const PWM_READ_REPLY_LEN: usize = 5;
    pub const PWM_WRITE_REPLY_LEN: usize = 3;

    /// Selector byte for a PWM channel
    #[inline]
    pub const fn fan_pwm(channel: u8) -> u8 {
        CMD_FAN_PWM_BASE + channel
    }

    /// Selector byte for a tachometer input
    #[inline]
    pub const fn fan_rpm(channel: u8) -> u8 {
        CMD_FAN_RPM_BASE + channel
    }

    /// XOR checksum the MCU uses for both commands and replies
    pub fn checksum(bytes: &[u8]) -> u8 {
        bytes.iter().fold(0, |acc, b| acc ^ b)
    }
}
