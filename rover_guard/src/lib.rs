//! # Rover Guard Library
//!
//! Obstacle-avoidance control loop for a motor-driven robot.
//!
//! # Module Structure
//!
//! - [`avoidance`] - `AvoidanceLoop` state machine and escalation policy
//! - [`cancel`] - Cancellation token with interruptible sleep
//! - [`context`] - Sensor, actuator and event sink owned by the loop
//!
//! # Control Flow
//!
//! ```text
//!   ┌──────────────┐ measure() ┌─────────────┐
//!   │ AvoidanceLoop│──────────►│ RangeSensor │
//!   │  (Running)   │           └─────────────┘
//!   │              │ stop()    ┌───────────────┐
//!   │              │──────────►│ MotorActuator │
//!   │              │ emit()    └───────────────┘
//!   │              │──────────►  EventSink
//!   └──────┬───────┘
//!          │ N consecutive failures
//!          ▼
//!      (Stopped)
//! ```

#![deny(warnings)]
#![deny(missing_docs)]

pub mod avoidance;
pub mod cancel;
pub mod context;

pub use crate::avoidance::{
    AvoidanceLoop, CycleOutcome, CycleReport, LoopExit, LoopPhase, LoopState,
};
pub use crate::cancel::CancelToken;
pub use crate::context::ControllerContext;
