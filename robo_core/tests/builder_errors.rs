use robo_core::error::BuildError;
use robo_core::{
    AlignmentCfg, ArmCfg, ArmHardware, ClimberCfg, ClimberHardware, DriveHardware, Robot,
    ShooterCfg, ShooterHardware, TickCfg, VisionCfg,
};
use robo_hardware::{
    SimulatedActuator, SimulatedCamera, SimulatedChassis, SimulatedEncoder, SimulatedGyro,
    SimulatedNoteSensor,
};
use robo_traits::IdleMode;
use rstest::rstest;

fn drive() -> DriveHardware {
    DriveHardware::new(SimulatedChassis::new(), SimulatedGyro::new())
}

fn arm() -> ArmHardware {
    ArmHardware::new(
        SimulatedActuator::new("joint"),
        SimulatedActuator::new("belt"),
        SimulatedEncoder::new(0.936),
        SimulatedEncoder::new(0.409),
        SimulatedNoteSensor::new(),
    )
}

fn shooter() -> ShooterHardware {
    ShooterHardware::new(
        SimulatedActuator::new("wheels"),
        SimulatedActuator::new("feed"),
    )
}

fn expect_build_error(err: eyre::Report) -> BuildError {
    match err.downcast_ref::<BuildError>() {
        Some(e) => e.clone(),
        None => panic!("expected BuildError, got: {err:?}"),
    }
}

#[rstest]
fn missing_drive_yields_typed_build_error() {
    let err = Robot::builder()
        .with_arm(arm())
        .with_shooter(shooter())
        .try_build()
        .expect_err("should fail with MissingDrive");
    assert!(matches!(expect_build_error(err), BuildError::MissingDrive));
}

#[rstest]
fn missing_arm_yields_typed_build_error() {
    let err = Robot::builder()
        .with_drive(drive())
        .with_shooter(shooter())
        .try_build()
        .expect_err("should fail with MissingArm");
    assert!(matches!(expect_build_error(err), BuildError::MissingArm));
}

#[rstest]
fn missing_shooter_yields_typed_build_error() {
    let err = Robot::builder()
        .with_drive(drive())
        .with_arm(arm())
        .try_build()
        .expect_err("should fail with MissingShooter");
    assert!(matches!(expect_build_error(err), BuildError::MissingShooter));
}

#[rstest]
fn cameras_are_optional() {
    let robot = Robot::builder()
        .with_drive(drive())
        .with_arm(arm())
        .with_shooter(shooter())
        .build()
        .expect("no cameras is fine");
    assert_eq!(robot.vision().sensor_count(), 0);

    let robot = Robot::builder()
        .with_camera(SimulatedCamera::new())
        .with_camera(SimulatedCamera::new())
        .with_drive(drive())
        .with_arm(arm())
        .with_shooter(shooter())
        .build()
        .expect("two cameras");
    assert_eq!(robot.vision().sensor_count(), 2);
}

enum Bad {
    Tick(TickCfg),
    Vision(VisionCfg),
    Alignment(AlignmentCfg),
    Arm(ArmCfg),
    Shooter(ShooterCfg),
    Climber(ClimberCfg),
}

#[rstest]
#[case::zero_rate(Bad::Tick(TickCfg { rate_hz: 0 }), "tick rate_hz must be > 0")]
#[case::empty_window(
    Bad::Vision(VisionCfg { filter_window: 0, ..VisionCfg::default() }),
    "vision filter_window must be >= 1"
)]
#[case::nan_turn_gain(
    Bad::Alignment(AlignmentCfg {
        turn_gains: robo_core::PidGains::new(f64::NAN, 0.0, 0.0),
        ..AlignmentCfg::default()
    }),
    "turn gains must be finite"
)]
#[case::offset_out_of_range(
    Bad::Arm(ArmCfg {
        left: robo_core::EncoderCal { offset: 1.2, inverted: false },
        ..ArmCfg::default()
    }),
    "left encoder offset must be within [0, 1)"
)]
#[case::backoff_longer_than_feed(
    Bad::Shooter(ShooterCfg { backoff_s: 2.0, ..ShooterCfg::default() }),
    "backoff_s must not exceed feed_s"
)]
#[case::climber_too_fast(
    Bad::Climber(ClimberCfg { speed: 1.5, ..ClimberCfg::default() }),
    "climber speed must be within [-1, 1]"
)]
fn invalid_config_is_rejected(#[case] bad: Bad, #[case] msg: &str) {
    let b = Robot::builder()
        .with_drive(drive())
        .with_arm(arm())
        .with_shooter(shooter());
    let b = match bad {
        Bad::Tick(c) => b.with_tick(c),
        Bad::Vision(c) => b.with_vision(c),
        Bad::Alignment(c) => b.with_alignment(c),
        Bad::Arm(c) => b.with_arm_config(c),
        Bad::Shooter(c) => b.with_shooter_config(c),
        Bad::Climber(c) => b.with_climber_config(c),
    };
    let err = b.build().expect_err("invalid config");
    match expect_build_error(err) {
        BuildError::InvalidConfig(m) => assert_eq!(m, msg),
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
}

#[rstest]
fn build_puts_joint_and_climber_in_brake_mode() {
    let joint = SimulatedActuator::new("joint");
    let belt = SimulatedActuator::new("belt");
    let left = SimulatedActuator::new("left climber");
    let right = SimulatedActuator::new("right climber");
    let (jp, bp, lp, rp) = (joint.probe(), belt.probe(), left.probe(), right.probe());
    let robot = Robot::builder()
        .with_drive(drive())
        .with_arm(ArmHardware::new(
            joint,
            belt,
            SimulatedEncoder::new(0.936),
            SimulatedEncoder::new(0.409),
            SimulatedNoteSensor::new(),
        ))
        .with_shooter(shooter())
        .with_climber(ClimberHardware::new(left, right))
        .build()
        .expect("valid robot");
    assert!(robot.climber().is_some());
    assert_eq!(jp.state().idle_mode, IdleMode::Brake);
    assert_eq!(lp.state().idle_mode, IdleMode::Brake);
    assert_eq!(rp.state().idle_mode, IdleMode::Brake);
    assert_eq!(bp.state().idle_mode, IdleMode::Coast);
}

#[rstest]
fn climber_is_optional() {
    let robot = Robot::builder()
        .with_drive(drive())
        .with_arm(arm())
        .with_shooter(shooter())
        .build()
        .expect("no climber is fine");
    assert!(robot.climber().is_none());
}

#[rstest]
fn brake_mode_failure_fails_the_build() {
    let left = SimulatedActuator::new("left climber");
    left.probe().fail_next();
    let err = Robot::builder()
        .with_drive(drive())
        .with_arm(arm())
        .with_shooter(shooter())
        .with_climber(ClimberHardware::new(left, SimulatedActuator::new("right climber")))
        .build()
        .expect_err("brake mode write fails");
    assert!(format!("{err:#}").contains("left climber"), "{err:#}");
}
