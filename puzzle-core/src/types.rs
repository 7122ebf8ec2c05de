//! Core types and data structures shared by the monitoring core and its callers

use crate::board::{BoardConfig, DefaultBoard};
use crate::{PuzzleError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Validated index into a fixed arena of `N` hardware slots
///
/// Construction is the only place a raw index is checked, so anything holding
/// a `ChannelIndex<N>` can index an `[T; N]` without further checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ChannelIndex<const N: usize>(u8);

/// PWM output / temperature sensor index (0-1)
pub type Channel = ChannelIndex<{ <DefaultBoard as BoardConfig>::PWM_CHANNELS }>;

/// Fan tachometer index (0-4)
pub type FanChannel = ChannelIndex<{ <DefaultBoard as BoardConfig>::FAN_CHANNELS }>;

impl<const N: usize> ChannelIndex<N> {
    /// Number of slots addressable by this index type
    pub const COUNT: usize = N;

    /// Validate a raw index
    ///
    /// # Errors
    ///
    /// Returns `InvalidChannel` if `raw >= N`.
    pub fn new(raw: u8) -> Result<Self> {
        if raw as usize >= N {
            return Err(PuzzleError::InvalidChannel {
                channel: raw,
                count: N,
            });
        }
        Ok(Self(raw))
    }

    /// Raw channel number as sent on the wire
    pub fn get(self) -> u8 {
        self.0
    }

    /// Channel number as an array index
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over every valid index in ascending order
    pub fn all() -> impl Iterator<Item = Self> {
        (0..N as u8).map(Self)
    }
}

impl<const N: usize> TryFrom<u8> for ChannelIndex<N> {
    type Error = PuzzleError;

    fn try_from(raw: u8) -> Result<Self> {
        Self::new(raw)
    }
}

impl<const N: usize> From<ChannelIndex<N>> for u8 {
    fn from(index: ChannelIndex<N>) -> u8 {
        index.0
    }
}

impl<const N: usize> fmt::Display for ChannelIndex<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monitoring quantity kinds exposed by the MCU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Temperature in milli-degrees Celsius
    Temperature,
    /// Fan speed in RPM
    Fan,
    /// Raw PWM duty 0-255
    Pwm,
}

/// File-permission style access mode of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    /// Unix permission bits the attribute framework exposes
    pub fn mode(self) -> u32 {
        match self {
            AccessMode::ReadOnly => 0o444,
            AccessMode::ReadWrite => 0o644,
        }
    }

    pub fn is_writable(self) -> bool {
        matches!(self, AccessMode::ReadWrite)
    }
}

/// One monitoring attribute: a quantity on a specific channel
///
/// Names follow hwmon conventions with 1-based numbering: `temp1_input`,
/// `fan3_input`, `pwm2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Temperature(Channel),
    Fan(FanChannel),
    Pwm(Channel),
}

impl Attribute {
    /// Every attribute the MCU exposes: PWM outputs, fan inputs, then
    /// temperatures.
    pub fn all() -> Vec<Attribute> {
        Channel::all()
            .map(Attribute::Pwm)
            .chain(FanChannel::all().map(Attribute::Fan))
            .chain(Channel::all().map(Attribute::Temperature))
            .collect()
    }

    pub fn kind(&self) -> SensorKind {
        match self {
            Attribute::Temperature(_) => SensorKind::Temperature,
            Attribute::Fan(_) => SensorKind::Fan,
            Attribute::Pwm(_) => SensorKind::Pwm,
        }
    }

    /// Raw channel number of the attribute
    pub fn channel(&self) -> u8 {
        match self {
            Attribute::Temperature(ch) | Attribute::Pwm(ch) => ch.get(),
            Attribute::Fan(ch) => ch.get(),
        }
    }

    /// hwmon-style attribute name
    pub fn name(&self) -> String {
        let n = self.channel() + 1;
        match self {
            Attribute::Temperature(_) => format!("temp{}_input", n),
            Attribute::Fan(_) => format!("fan{}_input", n),
            Attribute::Pwm(_) => format!("pwm{}", n),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Attribute {
    type Err = PuzzleError;

    /// Parse an hwmon-style attribute name
    ///
    /// # Examples
    ///
    /// ```
    /// use puzzle_core::types::Attribute;
    ///
    /// assert!("temp1_input".parse::<Attribute>().is_ok());
    /// assert!("pwm2".parse::<Attribute>().is_ok());
    /// assert!("pwm3".parse::<Attribute>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            PuzzleError::InvalidInput(format!(
                "Unknown attribute: '{}'. Expected tempN_input, fanN_input or pwmN",
                s
            ))
        };

        let (prefix, number) = if let Some(rest) = s.strip_prefix("temp") {
            ("temp", rest.strip_suffix("_input").ok_or_else(invalid)?)
        } else if let Some(rest) = s.strip_prefix("fan") {
            ("fan", rest.strip_suffix("_input").ok_or_else(invalid)?)
        } else if let Some(rest) = s.strip_prefix("pwm") {
            ("pwm", rest)
        } else {
            return Err(invalid());
        };

        let n: u8 = number.parse().map_err(|_| invalid())?;
        let raw = n.checked_sub(1).ok_or_else(invalid)?;

        match prefix {
            "temp" => Ok(Attribute::Temperature(Channel::new(raw)?)),
            "fan" => Ok(Attribute::Fan(FanChannel::new(raw)?)),
            _ => Ok(Attribute::Pwm(Channel::new(raw)?)),
        }
    }
}

/// Snapshot of one attribute read, as reported to callers
///
/// A failed read carries the error text and no value; there is no fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeReading {
    pub name: String,
    pub kind: SensorKind,
    pub channel: u8,
    pub access: AccessMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Governor-facing view of one cooling device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoolingStatus {
    pub name: String,
    pub channel: u8,
    pub max_state: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_state: Option<u64>,
    pub cooling_levels: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
