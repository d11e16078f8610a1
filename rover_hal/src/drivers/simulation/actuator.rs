//! In-memory motor actuator.
//!
//! Encodes each command with the VESC codec and records the frame instead
//! of writing it to a port. An [`ActuatorProbe`] observes the recorded
//! traffic after the actuator has been moved into the control loop.

use crate::drivers::vesc::codec::{encode_command, Frame};
use parking_lot::Mutex;
use rover_common::hal::driver::{ActuatorError, MotorActuator};
use rover_common::hal::types::MotorCommand;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct ActuatorLog {
    frames: Vec<Frame>,
    failed_writes: u64,
    link_failing: bool,
    connected: bool,
    closed: bool,
}

/// Shared view of a [`SimulatedActuator`].
#[derive(Debug, Clone)]
pub struct ActuatorProbe {
    log: Arc<Mutex<ActuatorLog>>,
}

impl ActuatorProbe {
    /// Stop commands written successfully.
    pub fn stop_count(&self) -> usize {
        self.log.lock().frames.len()
    }

    /// Frames written successfully, in order.
    pub fn frames(&self) -> Vec<Frame> {
        self.log.lock().frames.clone()
    }

    /// Write attempts that failed.
    pub fn failed_writes(&self) -> u64 {
        self.log.lock().failed_writes
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_link_failing(&self, failing: bool) {
        self.log.lock().link_failing = failing;
    }

    /// Whether `close()` has been called.
    pub fn is_closed(&self) -> bool {
        self.log.lock().closed
    }
}

/// Motor actuator recording frames in memory.
#[derive(Debug)]
pub struct SimulatedActuator {
    log: Arc<Mutex<ActuatorLog>>,
    connect_error: Option<&'static str>,
}

impl SimulatedActuator {
    /// Connected actuator.
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(ActuatorLog {
                connected: true,
                ..ActuatorLog::default()
            })),
            connect_error: None,
        }
    }

    /// Actuator whose link never opened.
    pub fn disconnected() -> Self {
        Self {
            log: Arc::new(Mutex::new(ActuatorLog::default())),
            connect_error: Some("simulated link not connected"),
        }
    }

    /// Observer handle.
    pub fn probe(&self) -> ActuatorProbe {
        ActuatorProbe {
            log: Arc::clone(&self.log),
        }
    }
}

impl Default for SimulatedActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl MotorActuator for SimulatedActuator {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn stop(&mut self) -> Result<(), ActuatorError> {
        let mut log = self.log.lock();
        if !log.connected || log.closed {
            return Err(ActuatorError::NotConnected);
        }
        if log.link_failing {
            log.failed_writes += 1;
            return Err(ActuatorError::LinkFailure("simulated write failure".to_string()));
        }
        let frame = encode_command(MotorCommand::Stop)
            .map_err(|e| ActuatorError::LinkFailure(e.to_string()))?;
        log.frames.push(frame);
        debug!("Simulated stop #{}", log.frames.len());
        Ok(())
    }

    fn connect_error(&self) -> Option<&str> {
        self.connect_error
    }

    fn close(&mut self) {
        self.log.lock().closed = true;
    }
}
