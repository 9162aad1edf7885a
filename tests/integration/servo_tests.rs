//! Integration tests for the servo motion controller against the mock
//! actuator.

use crate::mock_hw::{ActuatorCall, MockHardware};

use damperctl::config::ServoCalibration;
use damperctl::drivers::servo::{MotionState, ServoMotion, StepOutcome};

fn servo_at(position: u8) -> ServoMotion {
    ServoMotion::new(position, 50, &ServoCalibration::default())
}

#[test]
fn forty_to_fifty_seven_takes_exactly_seventeen_steps() {
    let mut hw = MockHardware::new();
    let mut servo = servo_at(40);

    assert!(servo.set_target(57, &mut hw));
    assert_eq!(servo.state(), MotionState::Moving);

    let mut positions = Vec::new();
    for i in 0..17 {
        match servo.step(&mut hw) {
            StepOutcome::Stepped { position, .. } => {
                assert!(i < 16, "completed late");
                positions.push(position);
            }
            StepOutcome::Completed { position } => {
                assert_eq!(i, 16, "completed early");
                positions.push(position);
            }
            StepOutcome::Idle => panic!("idle at step {i}"),
        }
    }

    assert_eq!(positions, (41..=57).collect::<Vec<u8>>());
    assert_eq!(servo.current(), 57);
    assert_eq!(servo.state(), MotionState::Idle);
    assert_eq!(hw.power_calls(), vec![true, false], "one IDLE→MOVING→IDLE cycle");
    assert_eq!(hw.pulses().len(), 17);

    // An 18th call is a no-op.
    let calls = hw.calls.len();
    assert_eq!(servo.step(&mut hw), StepOutcome::Idle);
    assert_eq!(hw.calls.len(), calls);
}

#[test]
fn redirect_recomputes_from_current_position() {
    let mut hw = MockHardware::new();
    let mut servo = servo_at(40);
    servo.set_target(57, &mut hw);
    for _ in 0..5 {
        servo.step(&mut hw);
    }
    assert_eq!(servo.current(), 45);

    assert!(servo.set_target(42, &mut hw));
    assert_eq!(servo.step(&mut hw), StepOutcome::Stepped {
        position: 44,
        pulse_us: servo.mapping().pulse_for(44),
    });
    servo.step(&mut hw);
    assert_eq!(servo.step(&mut hw), StepOutcome::Completed { position: 42 });
    assert_eq!(hw.power_calls(), vec![true, false], "no re-power on redirect");
}

#[test]
fn pulses_follow_the_calibrated_mapping() {
    let mut hw = MockHardware::new();
    let mut servo = servo_at(0);
    servo.set_target(100, &mut hw);
    while servo.is_moving() {
        servo.step(&mut hw);
    }
    let pulses = hw.pulses();
    assert_eq!(pulses.len(), 100);
    assert!(pulses.windows(2).all(|w| w[0] <= w[1]), "opening never reverses");
    assert_eq!(*pulses.last().unwrap(), 1077);
    assert_eq!(servo.mapping().pulse_for(0), 822);
    assert_eq!(
        hw.last_call(),
        Some(&ActuatorCall::ServoPower(false)),
        "powered down after the final pulse"
    );
}

#[test]
fn poll_is_rate_limited_to_step_interval() {
    let mut hw = MockHardware::new();
    let mut servo = servo_at(0);
    servo.set_target(3, &mut hw);

    assert!(matches!(servo.poll(1_000, &mut hw), StepOutcome::Stepped { position: 1, .. }));
    assert_eq!(servo.poll(1_020, &mut hw), StepOutcome::Idle);
    assert!(matches!(servo.poll(1_050, &mut hw), StepOutcome::Stepped { position: 2, .. }));
    assert_eq!(servo.poll(1_090, &mut hw), StepOutcome::Idle);
    assert_eq!(servo.poll(1_100, &mut hw), StepOutcome::Completed { position: 3 });
}

#[test]
fn same_target_is_not_a_move() {
    let mut hw = MockHardware::new();
    let mut servo = servo_at(100);
    assert!(!servo.set_target(100, &mut hw));
    assert!(!servo.set_target(250, &mut hw), "clamped to 100");
    assert!(hw.calls.is_empty());
}
