//! Rangefinder / actuator traits and error types.
//!
//! This module defines:
//! - `RangeSensor` trait - Interface for distance measurement drivers
//! - `MotorActuator` trait - Interface for motor controller links
//! - `MeasurementError`, `ActuatorError`, `SetupError` - Error taxonomy
//! - `SensorFactory` / `ActuatorFactory` type aliases - Factory function types

use crate::config::ConfigError;
use crate::hal::config::ControllerConfig;
use crate::hal::types::Distance;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Echo edge a measurement was waiting for when it timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgePhase {
    /// Echo line was still high from a previous pulse.
    Settle,
    /// Waiting for the start of the return pulse (low→high).
    Rising,
    /// Waiting for the end of the return pulse (high→low).
    Falling,
}

impl fmt::Display for EdgePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EdgePhase::Settle => "stale echo to clear",
            EdgePhase::Rising => "echo start",
            EdgePhase::Falling => "echo end",
        };
        f.write_str(text)
    }
}

/// Error returned by a single measurement cycle.
///
/// Transient: the loop counts these and escalates only after a run of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeasurementError {
    /// An echo edge was not observed within the timeout.
    #[error("Timeout waiting for {0}")]
    Timeout(EdgePhase),

    /// Pin access failed during the cycle.
    #[error("Sensor hardware error: {0}")]
    Hardware(String),
}

/// Error returned by the motor actuator.
///
/// Non-fatal to sensing; the motor's physical state is unknown afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuatorError {
    /// Writing the command to the link failed.
    #[error("Motor link failure: {0}")]
    LinkFailure(String),

    /// The link was never opened (or has been closed).
    #[error("Motor controller not connected")]
    NotConnected,
}

/// Fatal error raised before the control loop starts.
#[derive(Debug, Clone, Error)]
pub enum SetupError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// GPIO controller or pins unavailable.
    #[error("GPIO setup failed: {0}")]
    Gpio(String),

    /// No driver registered under the requested name.
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Driver was compiled out of this build.
    #[error("Driver '{driver}' requires the '{feature}' feature")]
    FeatureDisabled {
        /// Requested driver name.
        driver: String,
        /// Cargo feature that enables it.
        feature: &'static str,
    },
}

/// Factory function type for creating rangefinder instances.
pub type SensorFactory = fn(&ControllerConfig) -> Result<Box<dyn RangeSensor>, SetupError>;

/// Factory function type for creating actuator instances.
///
/// Infallible by contract: a link that cannot be opened yields an
/// actuator whose `stop()` always returns `ActuatorError::NotConnected`.
pub type ActuatorFactory = fn(&ControllerConfig) -> Box<dyn MotorActuator>;

/// Interface for distance measurement drivers.
///
/// # Timing Contracts
///
/// | Operation | Max Duration |
/// |-----------|--------------|
/// | `measure()` | settle + rising + falling timeouts (3 × `timeout`) |
/// | `release()` | bounded, no hardware wait |
pub trait RangeSensor: Send {
    /// Returns the driver's identifier (e.g., "gpio", "simulation").
    fn name(&self) -> &'static str;

    /// Run one measurement cycle.
    ///
    /// Each echo edge wait is bounded by `timeout` on a monotonic clock.
    /// Implausible readings are returned with low confidence, not as errors.
    ///
    /// # Errors
    /// `MeasurementError::Timeout` if an edge is not observed in time,
    /// `MeasurementError::Hardware` if pin access fails.
    fn measure(&mut self, timeout: Duration) -> Result<Distance, MeasurementError>;

    /// Release the sensor's pins. Called once from the cleanup path.
    fn release(&mut self) {}
}

/// Interface for the motor controller link.
pub trait MotorActuator: Send {
    /// Returns the driver's identifier (e.g., "vesc", "simulation").
    fn name(&self) -> &'static str;

    /// Send one zero-duty-cycle command. Safe to call repeatedly; every
    /// call results in one write on the link.
    ///
    /// # Errors
    /// `ActuatorError::NotConnected` if the link is not open,
    /// `ActuatorError::LinkFailure` if the write fails.
    fn stop(&mut self) -> Result<(), ActuatorError>;

    /// Why the link failed to open at construction, if it did.
    ///
    /// Reported once by the caller at startup; every later `stop()` on such
    /// an actuator returns `ActuatorError::NotConnected`.
    fn connect_error(&self) -> Option<&str> {
        None
    }

    /// Close the link. Later `stop()` calls return `NotConnected`.
    fn close(&mut self) {}
}
