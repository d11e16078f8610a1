//! Avoidance loop integration tests.
//!
//! Drive the loop with the scripted rangefinder, the in-memory actuator
//! and a recording sink; no hardware and no real sensor timing.

use rover_common::event::{EventLevel, RecordingSink};
use rover_common::hal::config::{AvoidanceConfig, SensorConfig, SimStep, SimulationConfig};
use rover_common::hal::driver::{ActuatorError, EdgePhase, MeasurementError};
use rover_common::hal::types::{Confidence, Plausibility};
use rover_guard::{
    AvoidanceLoop, CancelToken, ControllerContext, CycleOutcome, LoopExit, LoopPhase,
};
use rover_hal::drivers::simulation::{ActuatorProbe, SimulatedActuator, SimulatedRangeSensor};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const EDGE_TIMEOUT: Duration = Duration::from_millis(100);

struct Rig {
    guard: AvoidanceLoop,
    actuator: ActuatorProbe,
    events: Arc<RecordingSink>,
}

fn rig_with(steps: Vec<SimStep>, repeat: bool, actuator: SimulatedActuator) -> Rig {
    rig_timed(steps, repeat, actuator, EDGE_TIMEOUT)
}

fn rig_timed(
    steps: Vec<SimStep>,
    repeat: bool,
    actuator: SimulatedActuator,
    edge_timeout: Duration,
) -> Rig {
    let sensor = SimulatedRangeSensor::new(
        &SensorConfig::default(),
        &SimulationConfig { steps, repeat },
    );
    let probe = actuator.probe();
    let events = Arc::new(RecordingSink::new());
    let context = ControllerContext::new(
        Box::new(sensor),
        Box::new(actuator),
        Box::new(Arc::clone(&events)),
    );
    let config = AvoidanceConfig {
        poll_period_ms: 5,
        ..AvoidanceConfig::default()
    };
    Rig {
        guard: AvoidanceLoop::new(context, &config, edge_timeout),
        actuator: probe,
        events,
    }
}

fn rig(steps: Vec<SimStep>) -> Rig {
    rig_with(steps, false, SimulatedActuator::new())
}

fn mm(mm: f64) -> SimStep {
    SimStep::Distance { mm }
}

#[test]
fn test_clear_readings_never_stop() {
    // 1700mm is close to the farthest echo a 100ms edge timeout can time.
    let mut rig = rig(vec![mm(21.0), mm(500.0), mm(1700.0)]);

    for _ in 0..3 {
        let report = rig.guard.step().unwrap();
        assert!(matches!(report.outcome, CycleOutcome::Clear(_)));
        assert_eq!(rig.guard.state().consecutive_failures, 0);
    }
    assert_eq!(rig.actuator.stop_count(), 0);
    assert_eq!(rig.events.count(EventLevel::Warning), 0);
    assert_eq!(rig.events.count(EventLevel::Debug), 3);
}

#[test]
fn test_close_reading_stops_once_per_cycle_without_latching() {
    let mut rig = rig(vec![mm(15.0), mm(15.0), mm(300.0)]);

    rig.guard.step();
    assert_eq!(rig.actuator.stop_count(), 1);
    assert_eq!(rig.events.count(EventLevel::Warning), 1);
    let warning = rig.events.last().unwrap();
    assert!(warning.message.contains("15.0"), "{}", warning.message);

    rig.guard.step();
    assert_eq!(rig.actuator.stop_count(), 2);
    assert_eq!(rig.events.count(EventLevel::Warning), 2);

    assert!(matches!(rig.guard.step().unwrap().outcome, CycleOutcome::Clear(_)));
    assert_eq!(rig.guard.state().phase, LoopPhase::Running);
    assert_eq!(rig.actuator.stop_count(), 2);
}

#[test]
fn test_four_timeouts_do_not_stop() {
    let mut rig = rig(vec![SimStep::Timeout; 4]);

    for n in 1..=4 {
        let report = rig.guard.step().unwrap();
        assert!(report.sample.value.is_none());
        assert_eq!(rig.guard.state().consecutive_failures, n);
    }
    assert_eq!(rig.actuator.stop_count(), 0);
    assert_eq!(rig.events.count(EventLevel::Warning), 4);
    assert_eq!(rig.events.count(EventLevel::Error), 0);
    assert_eq!(rig.guard.state().phase, LoopPhase::Running);
}

#[test]
fn test_fifth_timeout_escalates() {
    let mut rig = rig(vec![SimStep::Timeout; 5]);

    for _ in 0..4 {
        rig.guard.step();
    }
    let report = rig.guard.step().unwrap();

    assert_eq!(
        report.outcome,
        CycleOutcome::Escalated {
            error: MeasurementError::Timeout(EdgePhase::Rising),
            consecutive: 5,
            stop: Ok(()),
        }
    );
    assert_eq!(rig.guard.state().phase, LoopPhase::Stopped);
    assert_eq!(rig.actuator.stop_count(), 1);
    assert_eq!(rig.events.count(EventLevel::Error), 1);
}

#[test]
fn test_stopped_loop_no_longer_polls() {
    let mut rig = rig_with(vec![SimStep::Timeout], true, SimulatedActuator::new());
    for _ in 0..5 {
        assert!(rig.guard.step().is_some());
    }
    assert_eq!(rig.guard.state().phase, LoopPhase::Stopped);
    let events_before = rig.events.events().len();

    assert!(rig.guard.step().is_none());
    assert!(rig.guard.step().is_none());

    assert_eq!(rig.guard.cycles(), 5);
    assert_eq!(rig.guard.state().consecutive_failures, 5);
    assert_eq!(rig.actuator.stop_count(), 1);
    assert_eq!(rig.events.count(EventLevel::Error), 1);
    assert_eq!(rig.events.events().len(), events_before);
}

#[test]
fn test_success_resets_failure_count() {
    let mut rig = rig(vec![
        SimStep::Timeout,
        SimStep::Timeout,
        SimStep::Timeout,
        mm(250.0),
        SimStep::Timeout,
    ]);

    for _ in 0..3 {
        rig.guard.step();
    }
    assert_eq!(rig.guard.state().consecutive_failures, 3);
    rig.guard.step();
    assert_eq!(rig.guard.state().consecutive_failures, 0);
    rig.guard.step();
    assert_eq!(rig.guard.state().consecutive_failures, 1);
}

#[test]
fn test_implausibly_small_reading_stops_only_via_distance_rule() {
    let mut rig = rig(vec![mm(1.5)]);

    let report = rig.guard.step().unwrap();
    match report.outcome {
        CycleOutcome::ObstacleStop { distance, stop } => {
            assert!((distance.millimeters - 1.5).abs() < 0.02);
            assert_eq!(distance.confidence, Confidence::Low(Plausibility::BelowRange));
            assert_eq!(stop, Ok(()));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(rig.actuator.stop_count(), 1);
    assert_eq!(rig.events.count(EventLevel::Warning), 1);
}

#[test]
fn test_implausibly_large_reading_warns_without_stop() {
    // A 4.5m echo lasts ~262ms.
    let mut rig = rig_timed(
        vec![mm(4500.0)],
        false,
        SimulatedActuator::new(),
        Duration::from_millis(300),
    );

    let report = rig.guard.step().unwrap();
    assert!(matches!(
        report.outcome,
        CycleOutcome::Clear(d) if d.confidence == Confidence::Low(Plausibility::AboveRange)
    ));
    assert_eq!(rig.actuator.stop_count(), 0);
    assert_eq!(rig.events.count(EventLevel::Warning), 1);
}

#[test]
fn test_actuator_failure_is_one_error_and_loop_continues() {
    let actuator = SimulatedActuator::new();
    let mut rig = rig_with(vec![mm(10.0), mm(10.0)], false, actuator);
    rig.actuator.set_link_failing(true);

    let report = rig.guard.step().unwrap();
    assert!(matches!(
        report.outcome,
        CycleOutcome::ObstacleStop {
            stop: Err(ActuatorError::LinkFailure(_)),
            ..
        }
    ));
    assert_eq!(rig.events.count(EventLevel::Warning), 1);
    assert_eq!(rig.events.count(EventLevel::Error), 1);
    assert_eq!(rig.guard.state().phase, LoopPhase::Running);

    rig.actuator.set_link_failing(false);
    rig.guard.step();
    assert_eq!(rig.actuator.stop_count(), 1);
    assert_eq!(rig.events.count(EventLevel::Error), 1);
}

#[test]
fn test_disconnected_actuator_still_escalates() {
    let mut rig = rig_with(
        vec![SimStep::Timeout],
        true,
        SimulatedActuator::disconnected(),
    );

    let exit = rig.guard.run(&CancelToken::new());

    assert_eq!(exit, LoopExit::SensorFailure);
    assert_eq!(rig.guard.state().phase, LoopPhase::Stopped);
    // Escalation error plus the failed stop.
    assert_eq!(rig.events.count(EventLevel::Error), 2);
    assert_eq!(rig.actuator.stop_count(), 0);
}

#[test]
fn test_run_escalation_stops_polling_and_cleans_up() {
    let mut rig = rig_with(vec![SimStep::Timeout], true, SimulatedActuator::new());

    let exit = rig.guard.run(&CancelToken::new());

    assert_eq!(exit, LoopExit::SensorFailure);
    assert_eq!(exit.exit_code(), 2);
    assert_eq!(rig.guard.cycles(), 5);
    assert_eq!(rig.actuator.stop_count(), 1);
    assert!(rig.actuator.is_closed());
    let last = rig.events.last().unwrap();
    assert_eq!(last.level, EventLevel::Info);
    assert_eq!(last.message, "Robot controller shutdown complete");
}

#[test]
fn test_cancellation_during_sleep_returns_promptly() {
    let sensor = SimulatedRangeSensor::new(
        &SensorConfig::default(),
        &SimulationConfig {
            steps: vec![mm(800.0)],
            repeat: true,
        },
    );
    let actuator = SimulatedActuator::new();
    let probe = actuator.probe();
    let events = Arc::new(RecordingSink::new());
    let context = ControllerContext::new(
        Box::new(sensor),
        Box::new(actuator),
        Box::new(Arc::clone(&events)),
    );
    let config = AvoidanceConfig {
        poll_period_ms: 60_000,
        ..AvoidanceConfig::default()
    };
    let mut guard = AvoidanceLoop::new(context, &config, EDGE_TIMEOUT);

    let cancel = CancelToken::new();
    let remote = cancel.clone();
    let interrupter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        remote.cancel();
    });

    let start = Instant::now();
    let exit = guard.run(&cancel);
    interrupter.join().unwrap();

    assert_eq!(exit, LoopExit::Interrupted);
    assert_eq!(exit.exit_code(), 0);
    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(guard.cycles(), 1);
    assert!(probe.is_closed());
    assert_eq!(probe.stop_count(), 0);
    assert_eq!(
        events.last().map(|e| e.message),
        Some("Robot controller shutdown complete".to_string())
    );
}

#[test]
fn test_already_cancelled_loop_does_not_poll() {
    let mut rig = rig(vec![mm(10.0)]);
    let cancel = CancelToken::new();
    cancel.cancel();

    assert_eq!(rig.guard.run(&cancel), LoopExit::Interrupted);
    assert_eq!(rig.guard.cycles(), 0);
    assert_eq!(rig.actuator.stop_count(), 0);
    assert!(rig.actuator.is_closed());
}
