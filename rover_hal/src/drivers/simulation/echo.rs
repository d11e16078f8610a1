//! Synthetic trigger/echo rig.
//!
//! `SyntheticEcho` owns a simulated timeline shared by a [`SyntheticPins`]
//! and a [`SyntheticClock`]. Every call to `SyntheticClock::now()` advances
//! the timeline by a fixed step, so edge waits make progress without real
//! time passing. The echo level is derived from the instant the trigger
//! pulse ended:
//!
//! ```text
//!  trigger fell ──► delay ──► echo high for `width` ──► low
//! ```

use crate::drivers::ultrasonic::{Clock, PulsePins};
use parking_lot::Mutex;
use rover_common::hal::driver::MeasurementError;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Return pulse the rig produces after each trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EchoProfile {
    /// No return pulse at all.
    Silent,
    /// High for `width`, starting `delay` after the trigger falls.
    Pulse { delay: Duration, width: Duration },
}

#[derive(Debug)]
struct Timeline {
    now: Instant,
    step: Duration,
    trigger_high: bool,
    trigger_fell_at: Option<Instant>,
    trigger_pulses: u32,
    profile: EchoProfile,
    stale_until: Option<Instant>,
    released: bool,
}

impl Timeline {
    fn echo_level(&self) -> bool {
        if self.stale_until.is_some_and(|until| self.now < until) {
            return true;
        }
        match (self.profile, self.trigger_fell_at) {
            (EchoProfile::Pulse { delay, width }, Some(fell)) => {
                let start = fell + delay;
                self.now >= start && self.now < start + width
            }
            _ => false,
        }
    }
}

/// Simulated trigger/echo pair with its own timeline.
#[derive(Debug, Clone)]
pub struct SyntheticEcho {
    timeline: Arc<Mutex<Timeline>>,
}

impl SyntheticEcho {
    /// Create a rig whose clock advances by `step` per `now()` call.
    pub fn new(step: Duration) -> Self {
        Self {
            timeline: Arc::new(Mutex::new(Timeline {
                now: Instant::now(),
                step,
                trigger_high: false,
                trigger_fell_at: None,
                trigger_pulses: 0,
                profile: EchoProfile::Silent,
                stale_until: None,
                released: false,
            })),
        }
    }

    /// Answer every following trigger with a pulse of `width`, `delay` after
    /// the trigger falls.
    pub fn set_pulse(&self, delay: Duration, width: Duration) {
        self.timeline.lock().profile = EchoProfile::Pulse { delay, width };
    }

    /// Stop answering triggers.
    pub fn set_silent(&self) {
        self.timeline.lock().profile = EchoProfile::Silent;
    }

    /// Hold the echo line high for `duration` from now, as if a previous
    /// pulse were still in flight.
    pub fn hold_high_for(&self, duration: Duration) {
        let mut timeline = self.timeline.lock();
        timeline.stale_until = Some(timeline.now + duration);
    }

    /// Current simulated instant (does not advance the timeline).
    pub fn now(&self) -> Instant {
        self.timeline.lock().now
    }

    /// Number of trigger pulses started so far.
    pub fn trigger_pulses(&self) -> u32 {
        self.timeline.lock().trigger_pulses
    }

    /// Pins view of the rig.
    pub fn pins(&self) -> SyntheticPins {
        SyntheticPins {
            timeline: Arc::clone(&self.timeline),
        }
    }

    /// Clock view of the rig.
    pub fn clock(&self) -> SyntheticClock {
        SyntheticClock {
            timeline: Arc::clone(&self.timeline),
        }
    }
}

/// Trigger/echo lines of a [`SyntheticEcho`].
#[derive(Debug)]
pub struct SyntheticPins {
    timeline: Arc<Mutex<Timeline>>,
}

impl PulsePins for SyntheticPins {
    fn set_trigger(&mut self, high: bool) -> Result<(), MeasurementError> {
        let mut timeline = self.timeline.lock();
        if timeline.released {
            return Err(MeasurementError::Hardware("trigger pin released".to_string()));
        }
        if high && !timeline.trigger_high {
            timeline.trigger_pulses += 1;
        }
        if !high && timeline.trigger_high {
            timeline.trigger_fell_at = Some(timeline.now);
        }
        timeline.trigger_high = high;
        Ok(())
    }

    fn echo_is_high(&mut self) -> Result<bool, MeasurementError> {
        let timeline = self.timeline.lock();
        if timeline.released {
            return Err(MeasurementError::Hardware("echo pin released".to_string()));
        }
        Ok(timeline.echo_level())
    }

    fn release(&mut self) {
        let mut timeline = self.timeline.lock();
        timeline.trigger_high = false;
        timeline.released = true;
    }
}

/// Stepping clock of a [`SyntheticEcho`].
#[derive(Debug)]
pub struct SyntheticClock {
    timeline: Arc<Mutex<Timeline>>,
}

impl Clock for SyntheticClock {
    fn now(&self) -> Instant {
        let mut timeline = self.timeline.lock();
        let step = timeline.step;
        timeline.now += step;
        timeline.now
    }

    fn delay(&self, duration: Duration) {
        self.timeline.lock().now += duration;
    }
}
