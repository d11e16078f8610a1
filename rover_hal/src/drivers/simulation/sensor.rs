//! Scripted rangefinder.
//!
//! Replays `[simulation].steps` through the real pulse-width measurement,
//! driven by a [`SyntheticEcho`] rig, so `--simulate` exercises the same
//! edge waits and timeouts as the hardware path.

use super::echo::{SyntheticClock, SyntheticEcho, SyntheticPins};
use crate::drivers::ultrasonic::UltrasonicSensor;
use rover_common::hal::config::{SensorConfig, SimStep, SimulationConfig};
use rover_common::hal::driver::{MeasurementError, RangeSensor};
use rover_common::hal::types::Distance;
use std::time::Duration;
use tracing::debug;

/// Simulated clock resolution, comparable to a GPIO poll loop.
const SIM_CLOCK_STEP: Duration = Duration::from_micros(1);

/// Delay between trigger fall and echo rise.
const SIM_ECHO_DELAY: Duration = Duration::from_micros(100);

/// Rangefinder replaying a fixed script.
pub struct SimulatedRangeSensor {
    echo: SyntheticEcho,
    inner: UltrasonicSensor<SyntheticPins, SyntheticClock>,
    steps: Vec<SimStep>,
    cursor: usize,
    repeat: bool,
    speed_factor: f64,
}

impl SimulatedRangeSensor {
    /// Create a simulated sensor from the sensor and simulation sections.
    pub fn new(sensor: &SensorConfig, simulation: &SimulationConfig) -> Self {
        let echo = SyntheticEcho::new(SIM_CLOCK_STEP);
        let inner = UltrasonicSensor::new("simulation", echo.pins(), echo.clock(), sensor);
        Self {
            echo,
            inner,
            steps: simulation.steps.clone(),
            cursor: 0,
            repeat: simulation.repeat,
            speed_factor: sensor.speed_factor,
        }
    }

    /// Next scripted step; `None` once a non-repeating script is exhausted.
    fn next_step(&mut self) -> Option<SimStep> {
        if self.steps.is_empty() {
            return None;
        }
        if self.cursor >= self.steps.len() {
            if !self.repeat {
                return None;
            }
            self.cursor = 0;
        }
        let step = self.steps.get(self.cursor).copied();
        self.cursor += 1;
        step
    }

    /// Echo width producing `mm`, quantized to the simulated clock step.
    fn pulse_width(&self, mm: f64) -> Duration {
        let micros = (mm.max(0.0) / self.speed_factor * 1_000_000.0).round();
        Duration::from_micros(micros as u64)
    }
}

impl RangeSensor for SimulatedRangeSensor {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn measure(&mut self, timeout: Duration) -> Result<Distance, MeasurementError> {
        match self.next_step() {
            Some(SimStep::Distance { mm }) => {
                self.echo.set_pulse(SIM_ECHO_DELAY, self.pulse_width(mm));
            }
            Some(SimStep::Timeout) | None => self.echo.set_silent(),
        }
        let result = self.inner.measure(timeout);
        debug!("Simulated measurement: {:?}", result);
        result
    }

    fn release(&mut self) {
        self.inner.release();
    }
}
