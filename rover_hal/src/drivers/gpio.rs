//! Raspberry Pi GPIO rangefinder driver.
//!
//! Binds the ultrasonic measurement to two BCM pins through `rppal`.
//! Built only with the `raspberry-pi` feature; without it the factory
//! reports `SetupError::FeatureDisabled`.

use rover_common::hal::config::ControllerConfig;
use rover_common::hal::driver::{RangeSensor, SetupError};

#[cfg(feature = "raspberry-pi")]
mod pins {
    use crate::drivers::ultrasonic::{Clock, MonotonicClock, PulsePins, UltrasonicSensor};
    use rover_common::hal::config::SensorConfig;
    use rover_common::hal::driver::{MeasurementError, SetupError};
    use rppal::gpio::{Gpio, InputPin, OutputPin};
    use tracing::info;

    /// Trigger/echo pair on the Pi header.
    pub struct RppalPins {
        trigger: Option<OutputPin>,
        echo: Option<InputPin>,
    }

    impl RppalPins {
        /// Claim `trigger_pin` as output (driven low) and `echo_pin` as input.
        pub fn open(trigger_pin: u8, echo_pin: u8) -> Result<Self, SetupError> {
            let gpio = Gpio::new()
                .map_err(|e| SetupError::Gpio(format!("Failed to initialize GPIO: {e}")))?;
            let trigger = gpio
                .get(trigger_pin)
                .map_err(|e| SetupError::Gpio(format!("trigger pin {trigger_pin}: {e}")))?
                .into_output_low();
            let echo = gpio
                .get(echo_pin)
                .map_err(|e| SetupError::Gpio(format!("echo pin {echo_pin}: {e}")))?
                .into_input();
            Ok(Self {
                trigger: Some(trigger),
                echo: Some(echo),
            })
        }
    }

    impl PulsePins for RppalPins {
        fn set_trigger(&mut self, high: bool) -> Result<(), MeasurementError> {
            let pin = self
                .trigger
                .as_mut()
                .ok_or_else(|| MeasurementError::Hardware("trigger pin released".to_string()))?;
            if high {
                pin.set_high();
            } else {
                pin.set_low();
            }
            Ok(())
        }

        fn echo_is_high(&mut self) -> Result<bool, MeasurementError> {
            self.echo
                .as_ref()
                .map(|pin| pin.is_high())
                .ok_or_else(|| MeasurementError::Hardware("echo pin released".to_string()))
        }

        fn release(&mut self) {
            if let Some(mut trigger) = self.trigger.take() {
                trigger.set_low();
            }
            self.echo = None;
            info!("GPIO pins released");
        }
    }

    /// Open the pins, hold the trigger low for the settle time, and wrap
    /// them in the measurement algorithm.
    pub fn open_sensor(
        config: &SensorConfig,
    ) -> Result<UltrasonicSensor<RppalPins, MonotonicClock>, SetupError> {
        let pins = RppalPins::open(config.trigger_pin, config.echo_pin)?;
        let clock = MonotonicClock;
        clock.delay(config.settle());
        info!(
            "GPIO setup completed (trigger={}, echo={})",
            config.trigger_pin, config.echo_pin
        );
        Ok(UltrasonicSensor::new("gpio", pins, clock, config))
    }
}

#[cfg(feature = "raspberry-pi")]
pub use pins::RppalPins;

/// Factory function to create the GPIO rangefinder.
#[cfg(feature = "raspberry-pi")]
pub fn create_sensor(config: &ControllerConfig) -> Result<Box<dyn RangeSensor>, SetupError> {
    Ok(Box::new(pins::open_sensor(&config.sensor)?))
}

/// Factory function to create the GPIO rangefinder.
#[cfg(not(feature = "raspberry-pi"))]
pub fn create_sensor(_config: &ControllerConfig) -> Result<Box<dyn RangeSensor>, SetupError> {
    Err(SetupError::FeatureDisabled {
        driver: "gpio".to_string(),
        feature: "raspberry-pi",
    })
}
