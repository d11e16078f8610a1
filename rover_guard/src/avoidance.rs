//! Obstacle-avoidance loop.
//!
//! One cycle per poll period:
//!
//! ```text
//!  measure ──Err──► failures += 1 ── Warning
//!     │                  │
//!     │                  └─ failures >= max ── Error, stop(), Stopped
//!     │
//!     └──Ok(d)──► failures = 0
//!                  ├─ d <= stop distance ── Warning, stop()
//!                  └─ otherwise ─────────── Debug (Warning if low confidence)
//! ```
//!
//! Near-obstacle stops do not latch: the loop keeps running and stops
//! again on every close reading. Only failure escalation ends the loop.

use crate::cancel::CancelToken;
use crate::context::ControllerContext;
use rover_common::event::EventLevel;
use rover_common::hal::config::{AvoidanceConfig, ControllerConfig};
use rover_common::hal::driver::{ActuatorError, MeasurementError};
use rover_common::hal::types::{Confidence, Distance, DistanceSample, Plausibility};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Loop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopPhase {
    /// Polling the sensor.
    #[default]
    Running,
    /// Halted after failure escalation. Terminal.
    Stopped,
}

/// Escalation bookkeeping carried across cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopState {
    /// Measurement failures since the last successful reading.
    pub consecutive_failures: u32,
    /// Current phase.
    pub phase: LoopPhase,
}

/// Decision taken by one cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Reading beyond the stop distance.
    Clear(Distance),
    /// Obstacle within the stop distance; a stop was attempted.
    ObstacleStop {
        /// Measured distance.
        distance: Distance,
        /// Result of the stop command.
        stop: Result<(), ActuatorError>,
    },
    /// Measurement failed below the escalation threshold.
    Failure {
        /// Failure cause.
        error: MeasurementError,
        /// Failures in a row, including this one.
        consecutive: u32,
    },
    /// Escalation threshold reached; a stop was attempted and the loop halted.
    Escalated {
        /// Failure cause of the last cycle.
        error: MeasurementError,
        /// Failures in a row, including this one.
        consecutive: u32,
        /// Result of the stop command.
        stop: Result<(), ActuatorError>,
    },
}

/// Result of one polling cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// The sample taken this cycle.
    pub sample: DistanceSample,
    /// What the loop did with it.
    pub outcome: CycleOutcome,
}

/// Why [`AvoidanceLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Operator interrupt.
    Interrupted,
    /// Consecutive sensor failures reached the threshold.
    SensorFailure,
}

impl LoopExit {
    /// Process exit status for this exit reason.
    pub const fn exit_code(self) -> i32 {
        match self {
            LoopExit::Interrupted => 0,
            LoopExit::SensorFailure => 2,
        }
    }
}

/// Periodic sampling with stop/ignore decisions and failure escalation.
pub struct AvoidanceLoop {
    context: ControllerContext,
    state: LoopState,
    poll_period: Duration,
    edge_timeout: Duration,
    stop_distance_mm: f64,
    max_consecutive_failures: u32,
    cycles: u64,
    cleaned_up: bool,
}

impl AvoidanceLoop {
    /// Create a loop over `context`.
    pub fn new(context: ControllerContext, config: &AvoidanceConfig, edge_timeout: Duration) -> Self {
        Self {
            context,
            state: LoopState::default(),
            poll_period: config.poll_period(),
            edge_timeout,
            stop_distance_mm: config.stop_distance_mm,
            max_consecutive_failures: config.max_consecutive_failures.max(1),
            cycles: 0,
            cleaned_up: false,
        }
    }

    /// Create a loop using the avoidance and sensor sections of `config`.
    pub fn from_config(context: ControllerContext, config: &ControllerConfig) -> Self {
        Self::new(context, &config.avoidance, config.sensor.edge_timeout())
    }

    /// Current escalation state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Cycles executed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one measurement cycle.
    ///
    /// Returns `None` without touching the sensor, the actuator or the
    /// sink once the loop is `Stopped`.
    pub fn step(&mut self) -> Option<CycleReport> {
        if self.state.phase == LoopPhase::Stopped {
            return None;
        }

        let timestamp = Instant::now();
        let result = self.context.sensor.measure(self.edge_timeout);
        self.cycles += 1;

        let report = match result {
            Err(error) => {
                let sample = DistanceSample {
                    value: None,
                    timestamp,
                };
                let outcome = self.on_failure(error);
                CycleReport { sample, outcome }
            }
            Ok(distance) => {
                let sample = DistanceSample {
                    value: Some(distance),
                    timestamp,
                };
                let outcome = self.on_reading(distance);
                CycleReport { sample, outcome }
            }
        };
        Some(report)
    }

    fn on_failure(&mut self, error: MeasurementError) -> CycleOutcome {
        self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
        let consecutive = self.state.consecutive_failures;
        self.emit(
            EventLevel::Warning,
            &format!("Failed reading ({error}) - consecutive errors: {consecutive}"),
        );

        if consecutive < self.max_consecutive_failures {
            return CycleOutcome::Failure { error, consecutive };
        }

        self.emit(
            EventLevel::Error,
            "Too many consecutive sensor errors - stopping robot",
        );
        let stop = self.stop_motor();
        self.state.phase = LoopPhase::Stopped;
        CycleOutcome::Escalated {
            error,
            consecutive,
            stop,
        }
    }

    fn on_reading(&mut self, distance: Distance) -> CycleOutcome {
        self.state.consecutive_failures = 0;

        if distance.millimeters <= self.stop_distance_mm {
            let note = match distance.confidence {
                Confidence::Low(Plausibility::BelowRange) => " (unusually small reading)",
                Confidence::Low(Plausibility::AboveRange) => " (unusually large reading)",
                Confidence::Nominal => "",
            };
            self.emit(
                EventLevel::Warning,
                &format!("Obstacle detected at {distance}{note} - stopping robot"),
            );
            let stop = self.stop_motor();
            return CycleOutcome::ObstacleStop { distance, stop };
        }

        match distance.confidence {
            Confidence::Low(Plausibility::AboveRange) => self.emit(
                EventLevel::Warning,
                &format!("Unusually large distance reading: {distance}"),
            ),
            Confidence::Low(Plausibility::BelowRange) => self.emit(
                EventLevel::Warning,
                &format!("Unusually small distance reading: {distance}"),
            ),
            Confidence::Nominal => {
                self.emit(EventLevel::Debug, &format!("Distance reading: {distance}"))
            }
        }
        CycleOutcome::Clear(distance)
    }

    /// Send one stop command. A failure becomes exactly one Error event.
    fn stop_motor(&mut self) -> Result<(), ActuatorError> {
        let result = self.context.actuator.stop();
        match &result {
            Ok(()) => debug!("Stop command sent via {}", self.context.actuator.name()),
            Err(e) => self.emit(
                EventLevel::Error,
                &format!("Error sending stop command: {e}"),
            ),
        }
        result
    }

    fn emit(&self, level: EventLevel, message: &str) {
        self.context.sink.emit(level, message);
    }

    /// Poll until interrupted or escalated, then run the cleanup path.
    ///
    /// Cancellation is observed at the cycle boundary and during the
    /// inter-cycle sleep.
    pub fn run(&mut self, cancel: &CancelToken) -> LoopExit {
        info!(
            "Avoidance loop starting (period={:?}, stop at <= {}mm, escalate after {} failures)",
            self.poll_period, self.stop_distance_mm, self.max_consecutive_failures
        );
        self.emit(EventLevel::Info, "Starting distance monitoring");

        let exit = loop {
            if cancel.is_cancelled() {
                break LoopExit::Interrupted;
            }
            if self.step().is_none() || self.state.phase == LoopPhase::Stopped {
                break LoopExit::SensorFailure;
            }
            if cancel.sleep(self.poll_period) {
                break LoopExit::Interrupted;
            }
        };

        if exit == LoopExit::Interrupted {
            self.emit(EventLevel::Info, "Program stopped by user");
        }
        info!("Avoidance loop exited after {} cycles: {:?}", self.cycles, exit);

        self.cleanup();
        exit
    }

    /// Release the sensor, close the actuator and report shutdown.
    ///
    /// Runs once; later calls are no-ops.
    pub fn cleanup(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.cleaned_up = true;
        self.context.sensor.release();
        self.context.actuator.close();
        self.emit(EventLevel::Info, "Robot controller shutdown complete");
    }
}
