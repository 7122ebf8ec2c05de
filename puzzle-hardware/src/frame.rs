//! Command frame builder
//!
//! Lays out the fixed byte sequences the MCU expects. Every frame ends with
//! one checksum slot left at zero; the transport fills it in before the bytes
//! go on the wire.

use puzzle_core::protocol::{
    fan_pwm, fan_rpm, CMD_FAN, CMD_FAN_PWM_READ, CMD_FAN_PWM_WRITE, CMD_HEADER_START, CMD_TEMP,
    CMD_TEMP_ALL,
};
use puzzle_core::{Channel, FanChannel};

/// Longest command frame in the protocol (PWM write plus checksum slot)
pub const MAX_FRAME_LEN: usize = 6;

/// One fixed-layout command frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; MAX_FRAME_LEN],
    len: usize,
}

impl Frame {
    fn from_payload(payload: &[u8]) -> Self {
        let mut bytes = [0u8; MAX_FRAME_LEN];
        bytes[..payload.len()].copy_from_slice(payload);
        Self {
            bytes,
            len: payload.len() + 1,
        }
    }

    /// Wire bytes, including the trailing checksum slot
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Command bytes without the checksum slot
    pub fn payload(&self) -> &[u8] {
        &self.bytes[..self.len - 1]
    }
}

/// Query every temperature sensor at once: `@ T A`
pub fn temperature_all() -> Frame {
    Frame::from_payload(&[CMD_HEADER_START, CMD_TEMP, CMD_TEMP_ALL])
}

/// Query one tachometer: `@ F <0x41 + n>`
pub fn fan_speed(channel: FanChannel) -> Frame {
    Frame::from_payload(&[CMD_HEADER_START, CMD_FAN, fan_rpm(channel.get())])
}

/// Read the duty of one PWM output: `@ F Z <0x50 + n>`
pub fn pwm_read(channel: Channel) -> Frame {
    Frame::from_payload(&[
        CMD_HEADER_START,
        CMD_FAN,
        CMD_FAN_PWM_READ,
        fan_pwm(channel.get()),
    ])
}

/// Set the duty of one PWM output: `@ F W <0x50 + n> <duty>`
pub fn pwm_write(channel: Channel, duty: u8) -> Frame {
    Frame::from_payload(&[
        CMD_HEADER_START,
        CMD_FAN,
        CMD_FAN_PWM_WRITE,
        fan_pwm(channel.get()),
        duty,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(n: u8) -> Channel {
        Channel::new(n).unwrap()
    }

    #[test]
    fn test_temperature_all_layout() {
        let frame = temperature_all();
        assert_eq!(frame.payload(), &[0x40, 0x54, 0x41]);
        assert_eq!(frame.as_bytes(), &[0x40, 0x54, 0x41, 0x00]);
        assert_eq!(frame.as_bytes().len(), 4);
    }

    #[test]
    fn test_fan_speed_layout() {
        let frame = fan_speed(FanChannel::new(0).unwrap());
        assert_eq!(frame.payload(), &[0x40, 0x46, 0x41]);

        let frame = fan_speed(FanChannel::new(4).unwrap());
        assert_eq!(frame.payload(), &[0x40, 0x46, 0x45]);
        assert_eq!(frame.as_bytes().len(), 4);
    }

    #[test]
    fn test_pwm_read_layout() {
        assert_eq!(pwm_read(ch(0)).payload(), &[0x40, 0x46, 0x5A, 0x50]);
        assert_eq!(pwm_read(ch(1)).payload(), &[0x40, 0x46, 0x5A, 0x51]);
        assert_eq!(pwm_read(ch(1)).as_bytes().len(), 5);
    }

    #[test]
    fn test_pwm_write_layout() {
        let frame = pwm_write(ch(1), 0x7F);
        assert_eq!(frame.payload(), &[0x40, 0x46, 0x57, 0x51, 0x7F]);
        assert_eq!(frame.as_bytes(), &[0x40, 0x46, 0x57, 0x51, 0x7F, 0x00]);
        assert_eq!(frame.as_bytes().len(), MAX_FRAME_LEN);
    }

    #[test]
    fn test_pwm_write_embeds_every_duty() {
        for duty in 0..=255u8 {
            assert_eq!(pwm_write(ch(0), duty).payload()[4], duty);
        }
    }
}
