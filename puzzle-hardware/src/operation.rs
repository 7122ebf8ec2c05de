//! Closed set of MCU operations
//!
//! Each variant knows its command frame and how to decode its reply. Adding a quantity means adding a variant, and every match below
//! has to learn about it.

use crate::frame::{self, Frame};
use crate::reply::{self, DecodeError};
use puzzle_core::{Attribute, Channel, FanChannel};

/// One request the MCU understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Read one temperature sensor (the MCU always reports both)
    Temperature(Channel),
    /// Read one tachometer
    FanSpeed(FanChannel),
    /// Read the duty of one PWM output
    PwmRead(Channel),
    /// Set the duty of one PWM output
    PwmWrite { channel: Channel, duty: u8 },
}

/// Decoded result of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    /// Milli-degrees Celsius
    Temperature(i32),
    /// Revolutions per minute
    FanSpeed(u32),
    /// Raw duty 0-255
    Pwm(u8),
    /// Write acknowledged
    Ack,
}

impl Operation {
    /// Read operation backing an attribute
    pub fn read(attr: Attribute) -> Self {
        match attr {
            Attribute::Temperature(ch) => Operation::Temperature(ch),
            Attribute::Fan(ch) => Operation::FanSpeed(ch),
            Attribute::Pwm(ch) => Operation::PwmRead(ch),
        }
    }

    pub fn frame(&self) -> Frame {
        match *self {
            Operation::Temperature(_) => frame::temperature_all(),
            Operation::FanSpeed(ch) => frame::fan_speed(ch),
            Operation::PwmRead(ch) => frame::pwm_read(ch),
            Operation::PwmWrite { channel, duty } => frame::pwm_write(channel, duty),
        }
    }

    pub fn decode(&self, reply: &[u8]) -> Result<Reading, DecodeError> {
        match *self {
            Operation::Temperature(ch) => reply::temperature(reply, ch).map(Reading::Temperature),
            Operation::FanSpeed(_) => reply::fan_speed(reply).map(Reading::FanSpeed),
            Operation::PwmRead(_) => reply::pwm_read(reply).map(Reading::Pwm),
            Operation::PwmWrite { .. } => reply::pwm_write_ack(reply).map(|()| Reading::Ack),
        }
    }
}

impl Reading {
    /// Value as the attribute framework reports it; an acknowledgement has none
    pub fn value(&self) -> Option<i64> {
        match *self {
            Reading::Temperature(v) => Some(v as i64),
            Reading::FanSpeed(v) => Some(v as i64),
            Reading::Pwm(v) => Some(v as i64),
            Reading::Ack => None,
        }
    }
}
