//! # Rover HAL Library
//!
//! Rangefinder and motor controller drivers behind the `RangeSensor` and
//! `MotorActuator` traits defined in `rover_common::hal::driver`.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      rover_hal                             │
//! │  ┌──────────────────┐        ┌──────────────────────────┐  │
//! │  │ Driver Registry  │──────► │ RangeSensor  (gpio, sim) │  │
//! │  │ name -> factory  │──────► │ MotorActuator (vesc, sim)│  │
//! │  └──────────────────┘        └──────────────────────────┘  │
//! │                                                            │
//! │  UltrasonicSensor<P: PulsePins, C: Clock>                  │
//! │    ├─ RppalPins + MonotonicClock      (raspberry-pi)       │
//! │    └─ SyntheticPins + SyntheticClock  (simulation)         │
//! └────────────────────────────────────────────────────────────┘
//! ```

#![deny(warnings)]
#![deny(missing_docs)]

pub mod driver_registry;
pub mod drivers;

// Re-export key types for convenience
pub use crate::driver_registry::DriverRegistry;
pub use crate::drivers::ultrasonic::{Clock, MonotonicClock, PulsePins, UltrasonicSensor};
pub use crate::drivers::vesc::VescActuator;
