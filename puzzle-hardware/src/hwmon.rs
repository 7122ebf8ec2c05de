//! Sensor/actuator facade
//!
//! Operation-level API the attribute framework and the cooling devices call.
//! Every operation is an [`Operation`] run through [`McuHwmon::execute`],
//! which holds the gateway from send to decode and returns an engineering
//! value or an error; nothing is cached.

use crate::gateway::{Gateway, McuTransport};
use crate::operation::{Operation, Reading};
use puzzle_core::{
    AccessMode, Attribute, AttributeReading, BoardConfig, Channel, DefaultBoard, FanChannel,
    PuzzleError, Result,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Monitoring and control interface of the MCU
pub struct McuHwmon<T: McuTransport + ?Sized = dyn McuTransport> {
    gateway: Gateway<T>,
    cooling_owned: [AtomicBool; DefaultBoard::PWM_CHANNELS],
    cooling_bound: [AtomicBool; DefaultBoard::PWM_CHANNELS],
}

impl<T: McuTransport + ?Sized> McuHwmon<T> {
    pub fn new(transport: Box<T>) -> Self {
        Self {
            gateway: Gateway::new(transport),
            cooling_owned: Default::default(),
            cooling_bound: Default::default(),
        }
    }

    /// Temperature of one NTC sensor in milli-degrees Celsius
    pub fn read_temperature(&self, channel: Channel) -> Result<i32> {
        match self.execute(Operation::Temperature(channel))? {
            Reading::Temperature(millidegrees) => Ok(millidegrees),
            other => Err(unexpected(other)),
        }
    }

    /// Speed of one fan in RPM
    pub fn read_fan_speed(&self, channel: FanChannel) -> Result<u32> {
        match self.execute(Operation::FanSpeed(channel))? {
            Reading::FanSpeed(rpm) => Ok(rpm),
            other => Err(unexpected(other)),
        }
    }

    /// Raw duty of one PWM output
    pub fn read_pwm(&self, channel: Channel) -> Result<u8> {
        match self.execute(Operation::PwmRead(channel))? {
            Reading::Pwm(duty) => Ok(duty),
            other => Err(unexpected(other)),
        }
    }

    /// Set the raw duty of one PWM output
    ///
    /// On error the duty must not be assumed changed. Repeating a successful
    /// write re-applies the same duty.
    pub fn write_pwm(&self, channel: Channel, duty: u8) -> Result<()> {
        debug!("Setting pwm{} to {}", channel.get() + 1, duty);
        match self.execute(Operation::PwmWrite { channel, duty })? {
            Reading::Ack => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Run one operation and decode its reply while holding the gateway
    pub fn execute(&self, op: Operation) -> Result<Reading> {
        self.gateway
            .transact(&op.frame(), |reply| op.decode(reply))
            .inspect_err(|e| {
                // Transport failures are already logged by the gateway.
                if !e.is_transport() {
                    warn!("{:?} failed: {}", op, e);
                }
            })
    }

    /// Whether a cooling device drives this PWM output
    pub fn is_cooling_owned(&self, channel: Channel) -> bool {
        self.cooling_owned[channel.index()].load(Ordering::Acquire)
    }

    /// Hand a PWM output to thermal control; generic writes are refused after this
    pub(crate) fn mark_cooling_owned(&self, channel: Channel) {
        self.cooling_owned[channel.index()].store(true, Ordering::Release);
    }

    /// Whether a cooling device has been successfully bound to this output
    pub fn is_cooling_bound(&self, channel: Channel) -> bool {
        self.cooling_bound[channel.index()].load(Ordering::Acquire)
    }

    /// Record a cooling binding; false if the output was already bound
    pub(crate) fn bind_cooling(&self, channel: Channel) -> bool {
        self.cooling_bound[channel.index()]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Access mode of an attribute
    ///
    /// Temperatures and fans are read-only. A PWM output is writable unless a
    /// cooling device owns it.
    pub fn is_visible(&self, attr: Attribute) -> AccessMode {
        match attr {
            Attribute::Pwm(ch) if !self.is_cooling_owned(ch) => AccessMode::ReadWrite,
            _ => AccessMode::ReadOnly,
        }
    }

    /// Read an attribute as the attribute framework sees it
    pub fn read(&self, attr: Attribute) -> Result<i64> {
        let reading = self.execute(Operation::read(attr))?;
        reading.value().ok_or_else(|| unexpected(reading))
    }

    /// Write an attribute as the attribute framework sees it
    ///
    /// # Errors
    ///
    /// `ReadOnly` for temperatures, fans and cooling-owned PWM outputs;
    /// `InvalidInput` for a duty outside 0-255. Both are raised before any
    /// exchange.
    pub fn write(&self, attr: Attribute, value: i64) -> Result<()> {
        if !self.is_visible(attr).is_writable() {
            return Err(PuzzleError::ReadOnly(attr.name()));
        }

        let Attribute::Pwm(channel) = attr else {
            return Err(PuzzleError::ReadOnly(attr.name()));
        };

        let duty = u8::try_from(value).map_err(|_| {
            PuzzleError::InvalidInput(format!(
                "{} must be 0-{}, got {}",
                attr.name(),
                DefaultBoard::MAX_PWM,
                value
            ))
        })?;

        self.write_pwm(channel, duty)
    }

    /// Read every attribute once
    ///
    /// Each attribute carries its own outcome; one failing sensor does not
    /// hide the others.
    pub fn read_all(&self) -> Vec<AttributeReading> {
        Attribute::all()
            .into_iter()
            .map(|attr| self.snapshot(attr))
            .collect()
    }

    /// Read one attribute into a reportable snapshot
    pub fn snapshot(&self, attr: Attribute) -> AttributeReading {
        let outcome = self.read(attr);
        AttributeReading {
            name: attr.name(),
            kind: attr.kind(),
            channel: attr.channel(),
            access: self.is_visible(attr),
            value: outcome.as_ref().ok().copied(),
            error: outcome.err().map(|e| e.to_string()),
        }
    }
}

// Each operation decodes to its own reading variant; anything else is a bug
// in the operation table.
fn unexpected(reading: Reading) -> PuzzleError {
    PuzzleError::MalformedReply(format!("unexpected reading {:?}", reading))
}
