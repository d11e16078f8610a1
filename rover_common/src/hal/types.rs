//! Sample and command types exchanged between drivers and the loop.

use std::fmt;
use std::time::Instant;

/// Which side of the plausible range a reading fell out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plausibility {
    /// Reading above the sensor's usable range.
    AboveRange,
    /// Reading below the sensor's usable range.
    BelowRange,
}

/// Confidence attached to a distance reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confidence {
    /// Inside the plausible range.
    #[default]
    Nominal,
    /// Outside the plausible range; still reported, never discarded.
    Low(Plausibility),
}

/// A distance estimate produced by one measurement cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    /// Estimated distance [mm], rounded to two decimals.
    pub millimeters: f64,
    /// Plausibility tag.
    pub confidence: Confidence,
}

impl Distance {
    /// Build a distance and tag it against the plausible range `[min_mm, max_mm]`.
    pub fn classify(millimeters: f64, min_mm: f64, max_mm: f64) -> Self {
        let confidence = if millimeters > max_mm {
            Confidence::Low(Plausibility::AboveRange)
        } else if millimeters < min_mm {
            Confidence::Low(Plausibility::BelowRange)
        } else {
            Confidence::Nominal
        };
        Self {
            millimeters,
            confidence,
        }
    }

    /// Whether the reading was flagged as implausible.
    #[inline]
    pub const fn is_low_confidence(&self) -> bool {
        matches!(self.confidence, Confidence::Low(_))
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}mm", self.millimeters)
    }
}

/// One polling cycle's outcome as seen by the loop.
///
/// `value` is `None` when the measurement failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSample {
    /// Measured distance, absent on timeout/failure.
    pub value: Option<Distance>,
    /// Monotonic time the cycle started.
    pub timestamp: Instant,
}

/// Command sent to the motor controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCommand {
    /// Zero duty cycle.
    Stop,
}

impl MotorCommand {
    /// Duty cycle carried by the command, in [-1.0, 1.0].
    pub const fn duty(self) -> f64 {
        match self {
            MotorCommand::Stop => 0.0,
        }
    }
}
