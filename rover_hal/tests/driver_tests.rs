//! Driver integration tests.
//!
//! Exercise the drivers through the public registry and trait objects,
//! the way the guard binary uses them.

use rover_common::hal::config::{ControllerConfig, SimStep, SimulationConfig};
use rover_common::hal::driver::{
    ActuatorError, EdgePhase, MeasurementError, MotorActuator, RangeSensor, SetupError,
};
use rover_common::hal::types::{Confidence, MotorCommand};
use rover_hal::drivers::simulation::SyntheticEcho;
use rover_hal::drivers::vesc::codec::{decode_frame, encode_command};
use rover_hal::{DriverRegistry, UltrasonicSensor, VescActuator};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_millis(100);

fn scripted(steps: Vec<SimStep>) -> ControllerConfig {
    ControllerConfig {
        simulation: SimulationConfig {
            steps,
            repeat: false,
        },
        ..ControllerConfig::default()
    }
}

/// Byte link shared with the test.
#[derive(Clone, Default)]
struct Wire(Arc<Mutex<Vec<u8>>>);

impl Write for Wire {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_simulated_sensor_through_registry() {
    let registry = DriverRegistry::with_builtin_drivers();
    let config = scripted(vec![
        SimStep::Distance { mm: 250.0 },
        SimStep::Timeout,
        SimStep::Distance { mm: 10.0 },
    ]);

    let mut sensor = registry.create_sensor("simulation", &config).expect("create sensor");

    let first = sensor.measure(TIMEOUT).expect("first reading");
    assert!((first.millimeters - 250.0).abs() < 0.02);
    assert_eq!(first.confidence, Confidence::Nominal);

    assert_eq!(
        sensor.measure(TIMEOUT),
        Err(MeasurementError::Timeout(EdgePhase::Rising))
    );

    let third = sensor.measure(TIMEOUT).expect("third reading");
    assert!((third.millimeters - 10.0).abs() < 0.02);

    sensor.release();
    assert!(matches!(
        sensor.measure(TIMEOUT),
        Err(MeasurementError::Hardware(_))
    ));
}

#[test]
fn test_gpio_sensor_without_feature() {
    if cfg!(feature = "raspberry-pi") {
        return;
    }
    let registry = DriverRegistry::with_builtin_drivers();
    let result = registry.create_sensor("gpio", &ControllerConfig::default());
    assert!(matches!(result, Err(SetupError::FeatureDisabled { .. })));
}

#[test]
fn test_unknown_driver_names() {
    let registry = DriverRegistry::with_builtin_drivers();
    let config = ControllerConfig::default();
    let err = registry.create_sensor("sonar9000", &config).err().expect("should fail");
    assert!(err.to_string().contains("sonar9000"));
    assert!(registry.create_actuator("sabertooth", &config).is_err());
}

#[test]
fn test_vesc_on_missing_port_is_disconnected() {
    let mut config = ControllerConfig::default();
    config.actuator.port = "/dev/rover-guard-no-such-port".to_string();

    let mut actuator = VescActuator::open(&config.actuator);
    assert!(!actuator.is_connected());
    assert_eq!(actuator.stop(), Err(ActuatorError::NotConnected));
    assert_eq!(actuator.frames_sent(), 0);
}

#[test]
fn test_vesc_stop_frame_on_the_wire() {
    let link = Wire::default();
    let mut actuator = VescActuator::with_link("loopback", link.clone());
    actuator.stop().expect("stop");
    assert_eq!(actuator.frames_sent(), 1);

    let wire = link.0.lock().clone();
    assert_eq!(
        wire,
        [0x02, 0x05, 0x05, 0x00, 0x00, 0x00, 0x00, 0x23, 0x57, 0x03]
    );
    let expected = encode_command(MotorCommand::Stop).expect("encode");
    assert_eq!(wire.as_slice(), expected.as_slice());
    assert_eq!(decode_frame(&wire).expect("decode"), &[5, 0, 0, 0, 0]);
}

#[test]
fn test_ultrasonic_over_synthetic_rig() {
    let config = ControllerConfig::default();
    let echo = SyntheticEcho::new(Duration::from_micros(1));
    // 23324µs × 17150 mm/s = 400.0066mm
    echo.set_pulse(Duration::from_micros(150), Duration::from_micros(23_324));

    let mut sensor = UltrasonicSensor::new("rig", echo.pins(), echo.clock(), &config.sensor);
    let distance = sensor.measure(TIMEOUT).expect("reading");

    assert!((distance.millimeters - 400.01).abs() < 1e-9);
    assert_eq!(echo.trigger_pulses(), 1);
    assert_eq!(sensor.name(), "rig");
}
