//! Driver implementations.
//!
//! - [`ultrasonic`] - Pulse-width measurement over the `PulsePins`/`Clock` seams
//! - [`gpio`] - Raspberry Pi rangefinder pins (`raspberry-pi` feature)
//! - [`vesc`] - VESC motor controller codec and actuator
//! - [`simulation`] - Scripted rangefinder and in-memory actuator
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `RangeSensor` or `MotorActuator` from `rover_common::hal::driver`
//! 3. Register its factory in [`register_all_drivers`]

pub mod gpio;
pub mod simulation;
pub mod ultrasonic;
pub mod vesc;

use crate::driver_registry::DriverRegistry;

/// Register all built-in drivers.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    registry.register_sensor("gpio", gpio::create_sensor);
    registry.register_sensor("simulation", simulation::create_sensor);

    registry.register_actuator("vesc", vesc::create_actuator);
    registry.register_actuator("simulation", simulation::create_actuator);
}
