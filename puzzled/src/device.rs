//! Device assembly
//!
//! Opens the transport, builds the facade and registers the configured
//! cooling devices. A cooling entry that fails is logged and skipped; the
//! rest of the device still comes up.

use puzzle_core::{Result, StaticConfig};
use puzzle_hardware::{
    register_cooling_devices, McuHwmon, McuTransport, MockMcu, PwmCoolingDevice, SerialDriver,
};
use std::sync::Arc;
use tracing::{error, info};

/// The facade plus every cooling device that registered successfully
pub struct Device {
    pub hwmon: Arc<McuHwmon>,
    pub cooling: Vec<PwmCoolingDevice>,
}

impl Device {
    /// Open the serial link, or a simulated MCU when `mock` is set
    pub fn open(config: &StaticConfig, mock: bool, debug_uart: bool) -> Result<Self> {
        let transport: Box<dyn McuTransport> = if mock {
            info!("Mock mode: using simulated MCU");
            Box::new(MockMcu::new())
        } else {
            let serial = &config.serial;
            info!("Connecting to MCU at {}...", serial.device);
            Box::new(
                SerialDriver::new(
                    &serial.device,
                    serial.baud_rate,
                    serial.timeout_ms,
                    debug_uart,
                )
                .inspect_err(|e| error!("MCU connection failed: {}. Use --mock for testing without hardware.", e))?,
            )
        };

        Ok(Self::with_transport(transport, config))
    }

    /// Assemble a device around an already opened transport
    pub fn with_transport(transport: Box<dyn McuTransport>, config: &StaticConfig) -> Self {
        let hwmon: Arc<McuHwmon> = Arc::new(McuHwmon::new(transport));

        let cooling: Vec<PwmCoolingDevice> = register_cooling_devices(&hwmon, &config.cooling)
            .into_iter()
            .filter_map(|result| result.ok())
            .collect();

        info!(
            "Device ready: {} of {} cooling device(s) registered",
            cooling.len(),
            config.cooling.len()
        );

        Self { hwmon, cooling }
    }

    /// Cooling device bound to a PWM channel
    pub fn cooling_device(&self, channel: u8) -> Option<&PwmCoolingDevice> {
        self.cooling.iter().find(|dev| dev.channel().get() == channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puzzle_core::{AccessMode, Attribute, Channel, CoolingConfig, PuzzleError};

    #[test]
    fn test_mock_device_with_cooling() {
        let mut config = StaticConfig::default();
        config.cooling = vec![
            CoolingConfig::new(0, vec![]),
            CoolingConfig::new(1, vec![0, 255]),
        ];

        let device = Device::open(&config, true, false).unwrap();
        assert_eq!(device.cooling.len(), 1);
        assert!(device.cooling_device(1).is_some());
        assert!(device.cooling_device(0).is_none());

        let pwm2 = Attribute::Pwm(Channel::new(1).unwrap());
        assert_eq!(device.hwmon.is_visible(pwm2), AccessMode::ReadOnly);
    }

    #[test]
    fn test_missing_serial_port_fails() {
        let mut config = StaticConfig::default();
        config.serial.device = "/dev/does-not-exist-puzzle".to_string();
        assert!(matches!(
            Device::open(&config, false, false),
            Err(PuzzleError::DeviceNotFound(_))
        ));
    }
}
