//! VESC motor controller driver.
//!
//! - [`codec`] - Short-frame encoding, CRC-16/XMODEM
//! - [`actuator`] - `MotorActuator` over a serial (or any byte) link

pub mod actuator;
pub mod codec;

pub use actuator::VescActuator;

use rover_common::hal::config::ControllerConfig;
use rover_common::hal::driver::MotorActuator;

/// Factory function to create a VESC actuator on the configured port.
pub fn create_actuator(config: &ControllerConfig) -> Box<dyn MotorActuator> {
    Box::new(VescActuator::open(&config.actuator))
}
