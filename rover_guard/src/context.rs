//! Controller context.
//!
//! Owns the sensor, the actuator and the event sink. Built once at startup
//! and moved into the [`AvoidanceLoop`](crate::avoidance::AvoidanceLoop).

use rover_common::event::{EventLevel, EventSink};
use rover_common::hal::config::ControllerConfig;
use rover_common::hal::driver::{MotorActuator, RangeSensor, SetupError};
use rover_hal::DriverRegistry;
use tracing::info;

/// Driver name used for both sides in simulation mode.
pub const SIMULATION_DRIVER: &str = "simulation";

/// Everything the control loop talks to.
pub struct ControllerContext {
    /// Distance source.
    pub sensor: Box<dyn RangeSensor>,
    /// Motor stop path.
    pub actuator: Box<dyn MotorActuator>,
    /// Operator-facing event destination.
    pub sink: Box<dyn EventSink>,
}

impl ControllerContext {
    /// Assemble a context from already constructed parts.
    pub fn new(
        sensor: Box<dyn RangeSensor>,
        actuator: Box<dyn MotorActuator>,
        sink: Box<dyn EventSink>,
    ) -> Self {
        Self {
            sensor,
            actuator,
            sink,
        }
    }

    /// Create the configured drivers through `registry`.
    ///
    /// With `simulate` set, both sides use the simulation drivers
    /// regardless of the configured names.
    ///
    /// # Errors
    /// Unknown driver names and sensor setup failures. An actuator whose
    /// link cannot be opened is not an error here; it is reported as one
    /// Error event.
    pub fn from_config(
        config: &ControllerConfig,
        registry: &DriverRegistry,
        sink: Box<dyn EventSink>,
        simulate: bool,
    ) -> Result<Self, SetupError> {
        let (sensor_driver, actuator_driver) = if simulate {
            (SIMULATION_DRIVER, SIMULATION_DRIVER)
        } else {
            (
                config.sensor.driver.as_str(),
                config.actuator.driver.as_str(),
            )
        };

        let sensor = registry.create_sensor(sensor_driver, config)?;
        let actuator = registry.create_actuator(actuator_driver, config)?;
        info!(
            "Drivers ready: sensor={}, actuator={}",
            sensor.name(),
            actuator.name()
        );

        if let Some(reason) = actuator.connect_error() {
            sink.emit(
                EventLevel::Error,
                &format!("Error connecting to motor controller: {reason}"),
            );
        }
        sink.emit(EventLevel::Info, "Robot controller initialized");
        Ok(Self::new(sensor, actuator, sink))
    }
}
