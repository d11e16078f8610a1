//! Driver registry.
//!
//! Maps driver names from the configuration to sensor and actuator
//! factories. Constructed at startup and passed by value; there is no
//! global registry.

use rover_common::hal::config::ControllerConfig;
use rover_common::hal::driver::{
    ActuatorFactory, MotorActuator, RangeSensor, SensorFactory, SetupError,
};
use std::collections::HashMap;

/// Registry of available rangefinder and actuator drivers.
pub struct DriverRegistry {
    sensors: HashMap<&'static str, SensorFactory>,
    actuators: HashMap<&'static str, ActuatorFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sensors: HashMap::new(),
            actuators: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in driver.
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::new();
        crate::drivers::register_all_drivers(&mut registry);
        registry
    }

    /// Register a rangefinder factory.
    ///
    /// # Panics
    /// Panics if a sensor driver with the same name is already registered.
    pub fn register_sensor(&mut self, name: &'static str, factory: SensorFactory) {
        if self.sensors.insert(name, factory).is_some() {
            panic!("Sensor driver '{name}' is already registered");
        }
    }

    /// Register an actuator factory.
    ///
    /// # Panics
    /// Panics if an actuator driver with the same name is already registered.
    pub fn register_actuator(&mut self, name: &'static str, factory: ActuatorFactory) {
        if self.actuators.insert(name, factory).is_some() {
            panic!("Actuator driver '{name}' is already registered");
        }
    }

    /// Create the rangefinder named `name`.
    ///
    /// # Errors
    /// `SetupError::DriverNotFound` for an unknown name, or the factory's
    /// own setup error.
    pub fn create_sensor(
        &self,
        name: &str,
        config: &ControllerConfig,
    ) -> Result<Box<dyn RangeSensor>, SetupError> {
        let factory = self
            .sensors
            .get(name)
            .ok_or_else(|| SetupError::DriverNotFound(format!("sensor '{name}'")))?;
        factory(config)
    }

    /// Create the actuator named `name`.
    ///
    /// # Errors
    /// `SetupError::DriverNotFound` for an unknown name.
    pub fn create_actuator(
        &self,
        name: &str,
        config: &ControllerConfig,
    ) -> Result<Box<dyn MotorActuator>, SetupError> {
        let factory = self
            .actuators
            .get(name)
            .ok_or_else(|| SetupError::DriverNotFound(format!("actuator '{name}'")))?;
        Ok(factory(config))
    }

    /// Registered sensor driver names, sorted.
    pub fn list_sensors(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.sensors.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Registered actuator driver names, sorted.
    pub fn list_actuators(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.actuators.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
