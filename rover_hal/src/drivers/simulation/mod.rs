//! Simulation driver module.
//!
//! Software stand-ins for the rangefinder and motor controller, for
//! development and testing without hardware.

mod actuator;
mod echo;
mod sensor;

pub use actuator::{ActuatorProbe, SimulatedActuator};
pub use echo::{SyntheticClock, SyntheticEcho, SyntheticPins};
pub use sensor::SimulatedRangeSensor;

use rover_common::hal::config::ControllerConfig;
use rover_common::hal::driver::{MotorActuator, RangeSensor, SetupError};

/// Factory function to create a simulated rangefinder.
pub fn create_sensor(config: &ControllerConfig) -> Result<Box<dyn RangeSensor>, SetupError> {
    Ok(Box::new(SimulatedRangeSensor::new(
        &config.sensor,
        &config.simulation,
    )))
}

/// Factory function to create a simulated actuator.
pub fn create_actuator(_config: &ControllerConfig) -> Box<dyn MotorActuator> {
    Box::new(SimulatedActuator::new())
}
