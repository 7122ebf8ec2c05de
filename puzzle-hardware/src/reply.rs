//! Reply validation and decoding
//!
//! Every check runs before any conversion, so a malformed reply can never
//! produce an engineering value.

use puzzle_core::protocol::{
    CHECKSUM_RESPONSE_OK, CMD_FAN_PWM_READ, CMD_HEADER_START, CMD_RESPONSE_OK, FAN_HI_OFFSET,
    FAN_LO_OFFSET, FAN_REPLY_LEN, PWM_DUTY_OFFSET, PWM_ECHO_OFFSET, PWM_READ_REPLY_LEN,
    PWM_WRITE_REPLY_LEN, TEMP_BASE_OFFSET, TEMP_COUNT_OFFSET, TEMP_REPLY_LEN, TEMP_SENSOR_COUNT,
};
use puzzle_core::{Channel, PuzzleError};
use thiserror::Error;

/// Why a reply was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("sensor count marker 0x{0:02X}, expected '2'")]
    SensorCount(u8),

    #[error("echoed selector 0x{actual:02X}, expected 0x{expected:02X}")]
    Echo { expected: u8, actual: u8 },

    /// The write acknowledgement was not `@0` plus its checksum
    #[error("malformed acknowledgement {0:02X?}")]
    MalformedAck([u8; 3]),
}

impl From<DecodeError> for PuzzleError {
    fn from(err: DecodeError) -> Self {
        PuzzleError::MalformedReply(err.to_string())
    }
}

/// Raw NTC byte to milli-degrees Celsius
#[inline]
pub fn decode_temperature(raw: u8) -> i32 {
    (raw as i32 - 0x80) * 1000
}

/// Milli-degrees Celsius back to the raw NTC byte
///
/// Only values on the 1000 m°C grid between -128 000 and 127 000 have an
/// encoding.
pub fn encode_temperature(millidegrees: i32) -> Option<u8> {
    if millidegrees % 1000 != 0 {
        return None;
    }
    u8::try_from(millidegrees / 1000 + 0x80).ok()
}

/// Big-endian tachometer pair to RPM
///
/// The MCU counts two pulses per revolution over one second.
#[inline]
pub fn decode_fan(hi: u8, lo: u8) -> u32 {
    ((((hi as u32) << 8) | lo as u32) / 2) * 60
}

fn check_len(reply: &[u8], expected: usize) -> Result<(), DecodeError> {
    if reply.len() != expected {
        return Err(DecodeError::Length {
            expected,
            actual: reply.len(),
        });
    }
    Ok(())
}

/// Decode one channel out of an all-sensors temperature reply
pub fn temperature(reply: &[u8], channel: Channel) -> Result<i32, DecodeError> {
    check_len(reply, TEMP_REPLY_LEN)?;

    let count = reply[TEMP_COUNT_OFFSET];
    if count != TEMP_SENSOR_COUNT {
        return Err(DecodeError::SensorCount(count));
    }

    Ok(decode_temperature(reply[TEMP_BASE_OFFSET + channel.index()]))
}

/// Decode a tachometer reply into RPM
pub fn fan_speed(reply: &[u8]) -> Result<u32, DecodeError> {
    check_len(reply, FAN_REPLY_LEN)?;
    Ok(decode_fan(reply[FAN_HI_OFFSET], reply[FAN_LO_OFFSET]))
}

/// Decode a PWM read reply into the raw duty
pub fn pwm_read(reply: &[u8]) -> Result<u8, DecodeError> {
    check_len(reply, PWM_READ_REPLY_LEN)?;

    let echo = reply[PWM_ECHO_OFFSET];
    if echo != CMD_FAN_PWM_READ {
        return Err(DecodeError::Echo {
            expected: CMD_FAN_PWM_READ,
            actual: echo,
        });
    }

    Ok(reply[PWM_DUTY_OFFSET])
}

/// Check a PWM write acknowledgement
pub fn pwm_write_ack(reply: &[u8]) -> Result<(), DecodeError> {
    check_len(reply, PWM_WRITE_REPLY_LEN)?;

    let ack = [reply[0], reply[1], reply[2]];
    if ack != [CMD_HEADER_START, CMD_RESPONSE_OK, CHECKSUM_RESPONSE_OK] {
        return Err(DecodeError::MalformedAck(ack));
    }
    Ok(())
}
