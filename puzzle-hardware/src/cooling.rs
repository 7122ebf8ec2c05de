//! Thermal cooling devices backed by PWM outputs
//!
//! A governor drives a cooling device through max/current/set state. Here the
//! state space is the raw duty space: the requested level goes straight to
//! the PWM output and the current level is read back from it on every call.
//! The per-level duty table from the configuration is kept for inspection but
//! not used to translate levels.

use crate::gateway::McuTransport;
use crate::hwmon::McuHwmon;
use puzzle_core::{
    BoardConfig, Channel, CoolingConfig, CoolingStatus, DefaultBoard, PuzzleError, Result,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Highest cooling state, the top of the raw duty range
pub const MAX_COOLING_STATE: u64 = DefaultBoard::MAX_PWM as u64;

/// Governor-facing cooling device contract
pub trait CoolingDevice: Send + Sync {
    fn name(&self) -> &str;

    fn max_state(&self) -> Result<u64>;

    fn current_state(&self) -> Result<u64>;

    fn set_current_state(&self, state: u64) -> Result<()>;
}

/// Cooling device driving one PWM output of the MCU
pub struct PwmCoolingDevice<T: McuTransport + ?Sized = dyn McuTransport> {
    hwmon: Arc<McuHwmon<T>>,
    channel: Channel,
    name: String,
    cooling_levels: Vec<u8>,
}

impl<T: McuTransport + ?Sized> PwmCoolingDevice<T> {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Per-level duty values from the configuration
    pub fn cooling_levels(&self) -> &[u8] {
        &self.cooling_levels
    }

    /// Snapshot for display; a failed read is reported, not replaced
    pub fn status(&self) -> CoolingStatus {
        let current = self.current_state();
        CoolingStatus {
            name: self.name.clone(),
            channel: self.channel.get(),
            max_state: MAX_COOLING_STATE,
            current_state: current.as_ref().ok().copied(),
            cooling_levels: self.cooling_levels.clone(),
            error: current.err().map(|e| e.to_string()),
        }
    }
}

impl<T: McuTransport + ?Sized> CoolingDevice for PwmCoolingDevice<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_state(&self) -> Result<u64> {
        Ok(MAX_COOLING_STATE)
    }

    fn current_state(&self) -> Result<u64> {
        self.hwmon.read_pwm(self.channel).map(u64::from)
    }

    fn set_current_state(&self, state: u64) -> Result<()> {
        let duty = u8::try_from(state).map_err(|_| {
            PuzzleError::InvalidInput(format!(
                "{}: state must be 0-{}, got {}",
                self.name, MAX_COOLING_STATE, state
            ))
        })?;
        self.hwmon.write_pwm(self.channel, duty)
    }
}

/// Create one cooling device per configured channel
///
/// Returns one result per entry, in configuration order. A bad entry fails
/// alone and the remaining entries are still registered. A channel is handed
/// to thermal control (and so becomes read-only to generic writes) as soon as
/// its entry names it, even if the entry is then rejected for an empty level
/// table. An output keeps its first successful binding for the life of the
/// facade; later entries for it, in this call or any other, are rejected.
pub fn register_cooling_devices<T: McuTransport + ?Sized>(
    hwmon: &Arc<McuHwmon<T>>,
    configs: &[CoolingConfig],
) -> Vec<Result<PwmCoolingDevice<T>>> {
    configs
        .iter()
        .map(|config| {
            register_one(hwmon, config).inspect_err(|e| {
                warn!("Enabling cooling device failed: {}", e);
            })
        })
        .collect()
}

fn register_one<T: McuTransport + ?Sized>(
    hwmon: &Arc<McuHwmon<T>>,
    config: &CoolingConfig,
) -> Result<PwmCoolingDevice<T>> {
    let channel = Channel::new(config.channel)
        .map_err(|e| PuzzleError::Config(format!("cooling device: {}", e)))?;

    let already_bound = || {
        PuzzleError::Config(format!(
            "cooling device for channel {} is already registered",
            channel
        ))
    };

    if hwmon.is_cooling_bound(channel) {
        return Err(already_bound());
    }

    hwmon.mark_cooling_owned(channel);

    if config.cooling_levels.is_empty() {
        return Err(PuzzleError::Config(format!(
            "cooling device for channel {}: cooling_levels must not be empty",
            channel
        )));
    }

    if !hwmon.bind_cooling(channel) {
        return Err(already_bound());
    }

    let name = format!("wt61p803_puzzle_{}", channel);
    info!(
        "Registered cooling device {} with {} levels",
        name,
        config.cooling_levels.len()
    );

    Ok(PwmCoolingDevice {
        hwmon: Arc::clone(hwmon),
        channel,
        name,
        cooling_levels: config.cooling_levels.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockMcu;
    use puzzle_core::{AccessMode, Attribute};

    fn setup() -> (MockMcu, Arc<McuHwmon<MockMcu>>) {
        let mock = MockMcu::new();
        let hwmon = Arc::new(McuHwmon::new(Box::new(mock.clone())));
        (mock, hwmon)
    }

    fn register_single(
        hwmon: &Arc<McuHwmon<MockMcu>>,
        channel: u8,
        levels: Vec<u8>,
    ) -> PwmCoolingDevice<MockMcu> {
        register_cooling_devices(hwmon, &[CoolingConfig::new(channel, levels)])
            .pop()
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_max_state_is_255() {
        let (_, hwmon) = setup();
        let dev = register_single(&hwmon, 0, vec![0, 128, 255]);
        assert_eq!(dev.max_state().unwrap(), 255);
        assert_eq!(dev.name(), "wt61p803_puzzle_0");
    }

    #[test]
    fn test_set_state_writes_duty() {
        let (mock, hwmon) = setup();
        let dev = register_single(&hwmon, 1, vec![10, 20]);

        dev.set_current_state(42).unwrap();
        assert_eq!(mock.pwm(1), 42);
        assert_eq!(dev.current_state().unwrap(), 42);
    }

    #[test]
    fn test_current_state_always_reads_hardware() {
        let (mock, hwmon) = setup();
        let dev = register_single(&hwmon, 0, vec![1]);

        dev.current_state().unwrap();
        dev.current_state().unwrap();
        let reads = mock
            .commands()
            .iter()
            .filter(|c| c[..4] == [0x40, 0x46, 0x5A, 0x50])
            .count();
        assert_eq!(reads, 2);
    }

    #[test]
    fn test_levels_are_passed_through_not_mapped() {
        // Known discrepancy: the level table is parsed but a governor level is
        // written as the raw duty, not looked up in the table.
        let (mock, hwmon) = setup();
        let dev = register_single(&hwmon, 0, vec![50, 150, 250]);

        dev.set_current_state(1).unwrap();
        assert_eq!(mock.pwm(0), 1);
        assert_eq!(dev.cooling_levels(), &[50, 150, 250]);
    }

    #[test]
    fn test_set_state_above_max_rejected() {
        let (mock, hwmon) = setup();
        let dev = register_single(&hwmon, 0, vec![1]);

        assert!(matches!(
            dev.set_current_state(256),
            Err(PuzzleError::InvalidInput(_))
        ));
        assert_eq!(mock.pwm(0), 255);
        assert!(mock.commands().is_empty());
    }

    #[test]
    fn test_empty_levels_fail_only_that_channel() {
        let (_, hwmon) = setup();
        let results = register_cooling_devices(
            &hwmon,
            &[
                CoolingConfig::new(0, vec![]),
                CoolingConfig::new(1, vec![64, 255]),
            ],
        );

        assert!(matches!(results[0], Err(PuzzleError::Config(_))));
        let dev = results[1].as_ref().unwrap();
        assert_eq!(dev.channel().get(), 1);
    }

    #[test]
    fn test_rejected_entry_still_marks_channel() {
        let (_, hwmon) = setup();
        let results = register_cooling_devices(&hwmon, &[CoolingConfig::new(0, vec![])]);
        assert!(results[0].is_err());

        let ch0 = Channel::new(0).unwrap();
        assert_eq!(hwmon.is_visible(Attribute::Pwm(ch0)), AccessMode::ReadOnly);
    }

    #[test]
    fn test_bound_channel_is_read_only() {
        let (_, hwmon) = setup();
        register_single(&hwmon, 1, vec![255]);

        let ch0 = Channel::new(0).unwrap();
        let ch1 = Channel::new(1).unwrap();
        assert_eq!(hwmon.is_visible(Attribute::Pwm(ch0)), AccessMode::ReadWrite);
        assert_eq!(hwmon.is_visible(Attribute::Pwm(ch1)), AccessMode::ReadOnly);
        assert!(matches!(
            hwmon.write(Attribute::Pwm(ch1), 3),
            Err(PuzzleError::ReadOnly(_))
        ));
    }

    #[test]
    fn test_invalid_and_duplicate_channels() {
        let (_, hwmon) = setup();
        let results = register_cooling_devices(
            &hwmon,
            &[
                CoolingConfig::new(2, vec![1]),
                CoolingConfig::new(0, vec![1]),
                CoolingConfig::new(0, vec![2]),
            ],
        );

        assert!(matches!(results[0], Err(PuzzleError::Config(_))));
        assert!(results[1].is_ok());
        assert!(matches!(results[2], Err(PuzzleError::Config(_))));
    }

    #[test]
    fn test_binding_survives_across_registrations() {
        let (_, hwmon) = setup();
        let first = register_cooling_devices(&hwmon, &[CoolingConfig::new(0, vec![1, 2])]);
        assert!(first[0].is_ok());

        let second = register_cooling_devices(
            &hwmon,
            &[
                CoolingConfig::new(0, vec![3]),
                CoolingConfig::new(1, vec![4]),
            ],
        );
        assert!(matches!(second[0], Err(PuzzleError::Config(_))));
        assert!(second[1].is_ok());
        assert!(hwmon.is_cooling_bound(Channel::new(0).unwrap()));
    }

    #[test]
    fn test_rejected_entry_does_not_bind() {
        let (_, hwmon) = setup();
        let results = register_cooling_devices(&hwmon, &[CoolingConfig::new(1, vec![])]);
        assert!(results[0].is_err());
        assert!(!hwmon.is_cooling_bound(Channel::new(1).unwrap()));

        // A later valid entry may still claim the output
        let retry = register_cooling_devices(&hwmon, &[CoolingConfig::new(1, vec![9])]);
        assert!(retry[0].is_ok());
    }

    #[test]
    fn test_status_snapshot() {
        let (mock, hwmon) = setup();
        let dev = register_single(&hwmon, 0, vec![9, 99]);
        dev.set_current_state(77).unwrap();

        let status = dev.status();
        assert_eq!(status.current_state, Some(77));
        assert_eq!(status.max_state, 255);
        assert_eq!(status.cooling_levels, vec![9, 99]);
        assert!(status.error.is_none());
        assert_eq!(mock.pwm(0), 77);
    }

    #[test]
    fn test_usable_as_trait_object() {
        let (_, hwmon) = setup();
        let dev: Box<dyn CoolingDevice> = Box::new(register_single(&hwmon, 0, vec![1]));
        dev.set_current_state(0).unwrap();
        assert_eq!(dev.current_state().unwrap(), 0);
    }
}
