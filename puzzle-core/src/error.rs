//! Error types for the PUZZLE MCU monitoring core

use thiserror::Error;

/// Core error type for MCU monitoring operations
#[derive(Error, Debug)]
pub enum PuzzleError {
    /// The external exchange with the MCU failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serial port errors
    #[error("Serial port error: {0}")]
    Serial(String),

    /// Reply checksum did not match the reply contents
    #[error("Checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    Checksum { expected: u8, actual: u8 },

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Serial device node does not exist
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reply had the wrong length, marker, or acknowledgement
    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Channel index out of range
    #[error("Channel out of range: {channel} (must be 0-{max})", max = count - 1)]
    InvalidChannel { channel: u8, count: usize },

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Write attempted on a read-only attribute
    #[error("Attribute is read-only: {0}")]
    ReadOnly(String),
}

impl PuzzleError {
    /// Returns `true` for failures raised by the transport rather than by
    /// reply decoding or caller input.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PuzzleError::Transport(_)
                | PuzzleError::Serial(_)
                | PuzzleError::Checksum { .. }
                | PuzzleError::Timeout(_)
                | PuzzleError::DeviceNotFound(_)
                | PuzzleError::Io(_)
        )
    }
}

/// Result type alias for MCU monitoring operations
pub type Result<T> = std::result::Result<T, PuzzleError>;

impl From<toml::de::Error> for PuzzleError {
    fn from(err: toml::de::Error) -> Self {
        PuzzleError::Config(err.to_string())
    }
}
