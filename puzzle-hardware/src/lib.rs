//! puzzle-hardware
//!
//! Command protocol and hardware access for the WT61P803 PUZZLE MCU: frame
//! building, reply decoding, the serialized channel gateway, the sensor/actuator
//! facade and the PWM cooling devices.
//!
//! Public API:
//! - `hwmon::McuHwmon` - temperature, fan and PWM operations plus attribute dispatch
//! - `cooling::PwmCoolingDevice` - governor-facing cooling device for one PWM output
//! - `gateway::McuTransport` - the byte transport contract
//! - `serial_driver::SerialDriver` - UART transport
//! - `mock::MockMcu` - simulated MCU for tests and hardware-less runs

pub mod cooling;
pub mod frame;
pub mod gateway;
pub mod hwmon;
pub mod mock;
pub mod operation;
pub mod reply;
pub mod serial_driver;

pub use cooling::{register_cooling_devices, CoolingDevice, PwmCoolingDevice, MAX_COOLING_STATE};
pub use gateway::{ExchangeGuard, Gateway, McuTransport};
pub use hwmon::McuHwmon;
pub use mock::MockMcu;
pub use operation::{Operation, Reading};
pub use serial_driver::{available_ports, SerialDriver};
