//! Controller configuration types.
//!
//! This module contains the configuration loaded from `guard.toml`:
//! - `ControllerConfig` - Top-level configuration
//! - `SensorConfig` - Rangefinder pins and timing
//! - `ActuatorConfig` - Motor controller link parameters
//! - `AvoidanceConfig` - Loop period and thresholds
//! - `SimulationConfig` - Scripted readings for the simulation driver
//!
//! Every field has a default equal to the stock robot wiring, so an
//! empty file is a valid configuration.

use crate::config::{ConfigError, SharedConfig};
use crate::consts::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_sensor_driver() -> String {
    "gpio".to_string()
}

fn default_actuator_driver() -> String {
    "vesc".to_string()
}

fn default_trigger_pin() -> u8 {
    DEFAULT_TRIGGER_PIN
}

fn default_echo_pin() -> u8 {
    DEFAULT_ECHO_PIN
}

fn default_trigger_pulse_us() -> u64 {
    TRIGGER_PULSE_US
}

fn default_edge_timeout_ms() -> u64 {
    EDGE_TIMEOUT_MS
}

fn default_settle_ms() -> u64 {
    SENSOR_SETTLE_MS
}

fn default_speed_factor() -> f64 {
    SPEED_FACTOR
}

fn default_min_plausible_mm() -> f64 {
    MIN_PLAUSIBLE_MM
}

fn default_max_plausible_mm() -> f64 {
    MAX_PLAUSIBLE_MM
}

fn default_port() -> String {
    DEFAULT_PORT.to_string()
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

fn default_poll_period_ms() -> u64 {
    POLL_PERIOD_MS
}

fn default_stop_distance_mm() -> f64 {
    STOP_DISTANCE_MM
}

fn default_max_consecutive_failures() -> u32 {
    MAX_CONSECUTIVE_FAILURES
}

fn default_true() -> bool {
    true
}

/// Main configuration loaded from `guard.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Log level and service name.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Rangefinder configuration.
    #[serde(default)]
    pub sensor: SensorConfig,

    /// Motor controller link configuration.
    #[serde(default)]
    pub actuator: ActuatorConfig,

    /// Loop period and thresholds.
    #[serde(default)]
    pub avoidance: AvoidanceConfig,

    /// Scripted readings for the simulation sensor driver.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Ultrasonic rangefinder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Driver name ("gpio" or "simulation").
    #[serde(default = "default_sensor_driver")]
    pub driver: String,

    /// Trigger output pin (BCM).
    #[serde(default = "default_trigger_pin")]
    pub trigger_pin: u8,

    /// Echo input pin (BCM).
    #[serde(default = "default_echo_pin")]
    pub echo_pin: u8,

    /// Trigger pulse width [µs].
    #[serde(default = "default_trigger_pulse_us")]
    pub trigger_pulse_us: u64,

    /// Per-edge echo timeout [ms].
    #[serde(default = "default_edge_timeout_ms")]
    pub edge_timeout_ms: u64,

    /// Trigger held low after setup [ms].
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Multiplier from pulse duration [s] to distance [mm].
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f64,

    /// Readings below this are low-confidence [mm].
    #[serde(default = "default_min_plausible_mm")]
    pub min_plausible_mm: f64,

    /// Readings above this are low-confidence [mm].
    #[serde(default = "default_max_plausible_mm")]
    pub max_plausible_mm: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            driver: default_sensor_driver(),
            trigger_pin: DEFAULT_TRIGGER_PIN,
            echo_pin: DEFAULT_ECHO_PIN,
            trigger_pulse_us: TRIGGER_PULSE_US,
            edge_timeout_ms: EDGE_TIMEOUT_MS,
            settle_ms: SENSOR_SETTLE_MS,
            speed_factor: SPEED_FACTOR,
            min_plausible_mm: MIN_PLAUSIBLE_MM,
            max_plausible_mm: MAX_PLAUSIBLE_MM,
        }
    }
}

impl SensorConfig {
    /// Trigger pulse width.
    pub fn trigger_pulse(&self) -> Duration {
        Duration::from_micros(self.trigger_pulse_us)
    }

    /// Per-edge echo timeout.
    pub fn edge_timeout(&self) -> Duration {
        Duration::from_millis(self.edge_timeout_ms)
    }

    /// Post-setup settle time.
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Motor controller link configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuatorConfig {
    /// Driver name ("vesc" or "simulation").
    #[serde(default = "default_actuator_driver")]
    pub driver: String,

    /// Serial port identifier.
    #[serde(default = "default_port")]
    pub port: String,

    /// Serial baud rate.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Serial read timeout [ms].
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            driver: default_actuator_driver(),
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl ActuatorConfig {
    /// Serial read timeout.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Avoidance loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvoidanceConfig {
    /// Polling period [ms].
    #[serde(default = "default_poll_period_ms")]
    pub poll_period_ms: u64,

    /// Stop when a reading is at or below this distance [mm].
    #[serde(default = "default_stop_distance_mm")]
    pub stop_distance_mm: f64,

    /// Consecutive failed measurements that halt the loop.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            poll_period_ms: POLL_PERIOD_MS,
            stop_distance_mm: STOP_DISTANCE_MM,
            max_consecutive_failures: MAX_CONSECUTIVE_FAILURES,
        }
    }
}

impl AvoidanceConfig {
    /// Polling period.
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }
}

/// One scripted simulation reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SimStep {
    /// Measurement succeeds with the given distance.
    Distance {
        /// Distance [mm].
        mm: f64,
    },
    /// Measurement times out waiting for the echo.
    Timeout,
}

/// Scripted readings for the simulation sensor driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Readings replayed in order, one per measurement.
    #[serde(default)]
    pub steps: Vec<SimStep>,

    /// Restart from the first step once the script is exhausted.
    #[serde(default = "default_true")]
    pub repeat: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps: vec![SimStep::Distance { mm: 500.0 }],
            repeat: true,
        }
    }
}

impl ControllerConfig {
    /// Validate the controller configuration.
    ///
    /// # Validation Rules
    /// 1. `service_name` not empty
    /// 2. Trigger and echo pins distinct and <= MAX_BCM_PIN
    /// 3. Trigger pulse, edge timeout and poll period > 0
    /// 4. `speed_factor` > 0, `min_plausible_mm` < `max_plausible_mm`
    /// 5. `stop_distance_mm` >= 0, `max_consecutive_failures` >= 1
    /// 6. Non-empty port and non-zero baud rate when the VESC driver is selected
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        let sensor = &self.sensor;
        if sensor.trigger_pin == sensor.echo_pin {
            return Err(ConfigError::ValidationError(format!(
                "trigger_pin and echo_pin must differ (both {})",
                sensor.trigger_pin
            )));
        }
        for (name, pin) in [("trigger_pin", sensor.trigger_pin), ("echo_pin", sensor.echo_pin)] {
            if pin > MAX_BCM_PIN {
                return Err(ConfigError::ValidationError(format!(
                    "{name} {pin} out of range (max {MAX_BCM_PIN})"
                )));
            }
        }
        if sensor.trigger_pulse_us == 0 {
            return Err(ConfigError::ValidationError(
                "trigger_pulse_us must be greater than 0".to_string(),
            ));
        }
        if sensor.edge_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "edge_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if sensor.speed_factor.is_nan() || sensor.speed_factor <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "speed_factor must be positive, got {}",
                sensor.speed_factor
            )));
        }
        if sensor.min_plausible_mm.is_nan()
            || sensor.max_plausible_mm.is_nan()
            || sensor.min_plausible_mm >= sensor.max_plausible_mm
        {
            return Err(ConfigError::ValidationError(format!(
                "min_plausible_mm ({}) must be below max_plausible_mm ({})",
                sensor.min_plausible_mm, sensor.max_plausible_mm
            )));
        }

        let avoidance = &self.avoidance;
        if avoidance.poll_period_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poll_period_ms must be greater than 0".to_string(),
            ));
        }
        if avoidance.stop_distance_mm.is_nan() || avoidance.stop_distance_mm < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "stop_distance_mm must be non-negative, got {}",
                avoidance.stop_distance_mm
            )));
        }
        if avoidance.max_consecutive_failures == 0 {
            return Err(ConfigError::ValidationError(
                "max_consecutive_failures must be at least 1".to_string(),
            ));
        }

        if self.actuator.driver == "vesc" {
            if self.actuator.port.is_empty() {
                return Err(ConfigError::ValidationError(
                    "actuator.port cannot be empty".to_string(),
                ));
            }
            if self.actuator.baud_rate == 0 {
                return Err(ConfigError::ValidationError(
                    "actuator.baud_rate must be greater than 0".to_string(),
                ));
            }
        }

        Ok(())
    }
}
