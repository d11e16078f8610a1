//! Trigger/echo pulse-width rangefinder (HC-SR04 class).
//!
//! The measurement algorithm is written against two small seams so the
//! same code runs on a Raspberry Pi and against a synthetic echo:
//!
//! - [`PulsePins`] - drive the trigger line, sample the echo line
//! - [`Clock`] - monotonic time source and short delays
//!
//! # Measurement cycle
//!
//! ```text
//!  trigger  ──┐▔▔┌──────────────────────────────────
//!             └10µs
//!  echo     ────────────┌▔▔▔▔▔▔▔▔▔▔▔▔▔┐────────────
//!                       ^pulse_start  ^pulse_end
//!                       |<- timeout ->|<- timeout ->|
//! ```
//!
//! Each edge wait is a busy-wait bounded by the clock, never by an
//! iteration count.

use rover_common::hal::config::SensorConfig;
use rover_common::hal::driver::{EdgePhase, MeasurementError, RangeSensor};
use rover_common::hal::types::Distance;
use std::time::{Duration, Instant};
use tracing::trace;

/// Delays shorter than this are busy-waited instead of slept.
const SPIN_THRESHOLD: Duration = Duration::from_millis(1);

/// Digital lines of a trigger/echo rangefinder.
pub trait PulsePins: Send {
    /// Drive the trigger output.
    fn set_trigger(&mut self, high: bool) -> Result<(), MeasurementError>;

    /// Sample the echo input.
    fn echo_is_high(&mut self) -> Result<bool, MeasurementError>;

    /// Release the underlying pins. Later calls may fail.
    fn release(&mut self) {}
}

/// Monotonic time source used by the measurement cycle.
pub trait Clock: Send {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Block for `duration`.
    fn delay(&self, duration: Duration);
}

/// Wall clock backed by `Instant::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn delay(&self, duration: Duration) {
        if duration < SPIN_THRESHOLD {
            let start = Instant::now();
            while start.elapsed() < duration {
                std::hint::spin_loop();
            }
        } else {
            std::thread::sleep(duration);
        }
    }
}

/// Per-cycle sensor bookkeeping. Reset at the start of every cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorState {
    /// Trigger line currently driven high.
    pub trigger_high: bool,
    /// Rising echo edge of the current cycle.
    pub pulse_start: Option<Instant>,
    /// Falling echo edge of the current cycle.
    pub pulse_end: Option<Instant>,
}

/// Convert an echo pulse duration into millimeters, rounded to two decimals.
pub fn pulse_to_millimeters(pulse: Duration, speed_factor: f64) -> f64 {
    round2(pulse.as_secs_f64() * speed_factor)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rangefinder running the pulse-width measurement over `P` and `C`.
pub struct UltrasonicSensor<P: PulsePins, C: Clock> {
    name: &'static str,
    pins: P,
    clock: C,
    trigger_pulse: Duration,
    speed_factor: f64,
    min_plausible_mm: f64,
    max_plausible_mm: f64,
    state: SensorState,
}

impl<P: PulsePins, C: Clock> UltrasonicSensor<P, C> {
    /// Create a sensor from its pins, a clock and the sensor configuration.
    pub fn new(name: &'static str, pins: P, clock: C, config: &SensorConfig) -> Self {
        Self {
            name,
            pins,
            clock,
            trigger_pulse: config.trigger_pulse(),
            speed_factor: config.speed_factor,
            min_plausible_mm: config.min_plausible_mm,
            max_plausible_mm: config.max_plausible_mm,
            state: SensorState::default(),
        }
    }

    /// Edge bookkeeping of the last cycle.
    pub fn state(&self) -> SensorState {
        self.state
    }

    /// Busy-wait until the echo line reads `level`.
    ///
    /// Returns the instant the level was first observed.
    fn wait_for_echo(
        &mut self,
        level: bool,
        timeout: Duration,
        phase: EdgePhase,
    ) -> Result<Instant, MeasurementError> {
        let wait_start = self.clock.now();
        loop {
            let now = self.clock.now();
            if self.pins.echo_is_high()? == level {
                return Ok(now);
            }
            if now.saturating_duration_since(wait_start) > timeout {
                trace!("Echo wait for {} expired after {:?}", phase, timeout);
                return Err(MeasurementError::Timeout(phase));
            }
            std::hint::spin_loop();
        }
    }

    fn fire_trigger(&mut self) -> Result<(), MeasurementError> {
        self.pins.set_trigger(true)?;
        self.state.trigger_high = true;
        self.clock.delay(self.trigger_pulse);
        self.pins.set_trigger(false)?;
        self.state.trigger_high = false;
        Ok(())
    }
}

impl<P: PulsePins, C: Clock> RangeSensor for UltrasonicSensor<P, C> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn measure(&mut self, timeout: Duration) -> Result<Distance, MeasurementError> {
        self.state = SensorState::default();

        // A pulse left over from the previous cycle must not be taken
        // as this cycle's rising edge.
        if self.pins.echo_is_high()? {
            self.wait_for_echo(false, timeout, EdgePhase::Settle)?;
        }

        if let Err(e) = self.fire_trigger() {
            // Best effort: never leave the trigger asserted.
            if self.pins.set_trigger(false).is_ok() {
                self.state.trigger_high = false;
            }
            return Err(e);
        }

        let pulse_start = self.wait_for_echo(true, timeout, EdgePhase::Rising)?;
        self.state.pulse_start = Some(pulse_start);

        let pulse_end = self.wait_for_echo(false, timeout, EdgePhase::Falling)?;
        self.state.pulse_end = Some(pulse_end);

        let pulse = pulse_end.saturating_duration_since(pulse_start);
        let millimeters = pulse_to_millimeters(pulse, self.speed_factor);
        trace!("Echo pulse {:?} -> {:.2}mm", pulse, millimeters);

        Ok(Distance::classify(
            millimeters,
            self.min_plausible_mm,
            self.max_plausible_mm,
        ))
    }

    fn release(&mut self) {
        self.pins.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::simulation::{SyntheticClock, SyntheticEcho, SyntheticPins};
    use rover_common::hal::types::{Confidence, Plausibility};

    const TIMEOUT: Duration = Duration::from_millis(100);

    fn sensor(echo: &SyntheticEcho) -> UltrasonicSensor<SyntheticPins, SyntheticClock> {
        UltrasonicSensor::new("test", echo.pins(), echo.clock(), &SensorConfig::default())
    }

    #[test]
    fn pulse_conversion_rounds_to_two_decimals() {
        assert_eq!(pulse_to_millimeters(Duration::from_micros(1000), 17150.0), 17.15);
        assert_eq!(pulse_to_millimeters(Duration::from_micros(1), 17150.0), 0.02);
        assert_eq!(pulse_to_millimeters(Duration::ZERO, 17150.0), 0.0);
    }

    #[test]
    fn measures_known_pulse_width() {
        let echo = SyntheticEcho::new(Duration::from_micros(1));
        echo.set_pulse(Duration::from_micros(200), Duration::from_micros(5830));
        let mut sensor = sensor(&echo);

        let distance = sensor.measure(TIMEOUT).unwrap();
        assert!((distance.millimeters - 99.98).abs() < 1e-9);
        assert_eq!(distance.confidence, Confidence::Nominal);

        let state = sensor.state();
        assert!(!state.trigger_high);
        assert_eq!(
            state.pulse_end.unwrap() - state.pulse_start.unwrap(),
            Duration::from_micros(5830)
        );
        assert_eq!(echo.trigger_pulses(), 1);
    }

    #[test]
    fn silent_echo_times_out_on_rising_edge() {
        let echo = SyntheticEcho::new(Duration::from_micros(10));
        echo.set_silent();
        let mut sensor = sensor(&echo);

        let before = echo.now();
        assert_eq!(
            sensor.measure(TIMEOUT),
            Err(MeasurementError::Timeout(EdgePhase::Rising))
        );
        let waited = echo.now() - before;
        assert!(waited > TIMEOUT && waited < TIMEOUT + Duration::from_millis(1));
        assert!(sensor.state().pulse_start.is_none());
    }

    #[test]
    fn long_pulse_times_out_on_falling_edge() {
        let echo = SyntheticEcho::new(Duration::from_micros(10));
        echo.set_pulse(Duration::from_micros(100), Duration::from_millis(150));
        let mut sensor = sensor(&echo);

        assert_eq!(
            sensor.measure(TIMEOUT),
            Err(MeasurementError::Timeout(EdgePhase::Falling))
        );
        // Rising edge was seen, falling edge never recorded.
        assert!(sensor.state().pulse_start.is_some());
        assert!(sensor.state().pulse_end.is_none());
    }

    #[test]
    fn stale_high_echo_is_not_taken_as_rising_edge() {
        let echo = SyntheticEcho::new(Duration::from_micros(1));
        echo.hold_high_for(Duration::from_millis(3));
        echo.set_pulse(Duration::from_micros(50), Duration::from_micros(1000));
        let mut sensor = sensor(&echo);

        let distance = sensor.measure(TIMEOUT).unwrap();
        assert!((distance.millimeters - 17.15).abs() < 1e-9);
    }

    #[test]
    fn stuck_high_echo_times_out_in_settle() {
        let echo = SyntheticEcho::new(Duration::from_micros(10));
        echo.hold_high_for(Duration::from_secs(10));
        let mut sensor = sensor(&echo);

        assert_eq!(
            sensor.measure(TIMEOUT),
            Err(MeasurementError::Timeout(EdgePhase::Settle))
        );
        assert_eq!(echo.trigger_pulses(), 0);
    }

    #[test]
    fn edges_reset_between_cycles() {
        let echo = SyntheticEcho::new(Duration::from_micros(1));
        echo.set_pulse(Duration::from_micros(20), Duration::from_micros(2000));
        let mut sensor = sensor(&echo);
        sensor.measure(TIMEOUT).unwrap();
        assert!(sensor.state().pulse_end.is_some());

        echo.set_silent();
        assert!(sensor.measure(Duration::from_millis(5)).is_err());
        assert_eq!(sensor.state().pulse_start, None);
        assert_eq!(sensor.state().pulse_end, None);
    }

    #[test]
    fn implausibly_short_reading_is_returned_low_confidence() {
        let echo = SyntheticEcho::new(Duration::from_nanos(100));
        // 87.5µs × 17150 = 1.5006 → 1.5
        echo.set_pulse(Duration::from_micros(10), Duration::from_nanos(87_500));
        let mut sensor = sensor(&echo);

        let distance = sensor.measure(TIMEOUT).unwrap();
        assert!((distance.millimeters - 1.5).abs() < 1e-9);
        assert_eq!(
            distance.confidence,
            Confidence::Low(Plausibility::BelowRange)
        );
    }

    #[test]
    fn pin_failure_maps_to_hardware_error() {
        let echo = SyntheticEcho::new(Duration::from_micros(1));
        let mut sensor = sensor(&echo);
        sensor.release();
        assert!(matches!(
            sensor.measure(TIMEOUT),
            Err(MeasurementError::Hardware(_))
        ));
    }
}
