//! System-wide constants for the rover guard workspace.
//!
//! Single source of truth for the defaults used when a configuration
//! section omits a value.

/// Canonical service name (used for logging).
pub const SERVICE_NAME: &str = "rover_guard";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/rover/guard.toml";

/// Default trigger pin (BCM numbering).
pub const DEFAULT_TRIGGER_PIN: u8 = 23;

/// Default echo pin (BCM numbering).
pub const DEFAULT_ECHO_PIN: u8 = 24;

/// Highest BCM GPIO number exposed on the 40-pin header.
pub const MAX_BCM_PIN: u8 = 27;

/// Trigger pulse width in microseconds.
pub const TRIGGER_PULSE_US: u64 = 10;

/// Per-edge echo timeout in milliseconds.
pub const EDGE_TIMEOUT_MS: u64 = 100;

/// Time the trigger line is held low after setup, in milliseconds.
pub const SENSOR_SETTLE_MS: u64 = 2000;

/// Factor applied to the echo pulse duration in seconds to get millimeters.
pub const SPEED_FACTOR: f64 = 17150.0;

/// Readings below this are flagged low-confidence [mm].
pub const MIN_PLAUSIBLE_MM: f64 = 2.0;

/// Readings above this are flagged low-confidence [mm].
pub const MAX_PLAUSIBLE_MM: f64 = 4000.0;

/// Default motor controller serial port.
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

/// Default motor controller baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default serial read timeout in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 50;

/// Polling period of the avoidance loop in milliseconds.
pub const POLL_PERIOD_MS: u64 = 100;

/// Obstacle distance at or below which the motor is stopped [mm].
pub const STOP_DISTANCE_MM: f64 = 20.0;

/// Consecutive measurement failures that halt the loop.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;
