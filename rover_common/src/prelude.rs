//! Prelude module for common re-exports.
//!
//! ```rust
//! use rover_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::hal::config::{
    ActuatorConfig, AvoidanceConfig, ControllerConfig, SensorConfig, SimStep, SimulationConfig,
};

// ─── Hardware seams ─────────────────────────────────────────────────
pub use crate::hal::driver::{
    ActuatorError, ActuatorFactory, EdgePhase, MeasurementError, MotorActuator, RangeSensor,
    SensorFactory, SetupError,
};
pub use crate::hal::types::{Confidence, Distance, DistanceSample, MotorCommand, Plausibility};

// ─── Events ─────────────────────────────────────────────────────────
pub use crate::event::{EventLevel, EventSink, FanOutSink, RecordingSink, TracingSink};
