//! Type-state builder for `Robot`.
//!
//! `build()` only exists once drive, arm and shooter hardware are all
//! provided. `try_build()` is always available and reports what is missing.
//! The climber is optional. Building puts the arm joint and the climber
//! winches in brake mode.

use std::marker::PhantomData;

use eyre::WrapErr;
use robo_traits::{AbsoluteEncoder, Actuator, Chassis, Gyro, IdleMode, NoteSensor, TargetSource};

use crate::alignment::AlignmentController;
use crate::arm::ArmController;
use crate::arm_position::ArmPositionEstimator;
use crate::climber::ClimberController;
use crate::config::{
    AlignmentCfg, ArmCfg, ClimberCfg, RobotCfg, ShooterCfg, TickCfg, VisionCfg,
};
use crate::error::{BuildError, Result};
use crate::hw_error::map_hw_error;
use crate::pid::{PidGains, Tolerance};
use crate::robot::{BoxedActuator, BoxedCamera, BoxedChassis, BoxedEncoder, Robot};
use crate::shooter::ShooterController;
use crate::status::{ArmSnapshot, ShooterSnapshot};
use crate::util::period_s;
use crate::vision::VisionTracker;

// ── Hardware bundles ─────────────────────────────────────────────────────────

/// Drive base and the gyro measuring its heading.
pub struct DriveHardware {
    pub chassis: BoxedChassis,
    pub gyro: Box<dyn Gyro>,
}

impl DriveHardware {
    pub fn new(chassis: impl Chassis + 'static, gyro: impl Gyro + 'static) -> Self {
        Self {
            chassis: Box::new(chassis),
            gyro: Box::new(gyro),
        }
    }
}

/// Arm joint, belt, both joint encoders and the note sensor.
pub struct ArmHardware {
    pub joint: BoxedActuator,
    pub belt: BoxedActuator,
    pub left_encoder: BoxedEncoder,
    pub right_encoder: BoxedEncoder,
    pub note_sensor: Box<dyn NoteSensor>,
}

impl ArmHardware {
    pub fn new(
        joint: impl Actuator + 'static,
        belt: impl Actuator + 'static,
        left_encoder: impl AbsoluteEncoder + 'static,
        right_encoder: impl AbsoluteEncoder + 'static,
        note_sensor: impl NoteSensor + 'static,
    ) -> Self {
        Self {
            joint: Box::new(joint),
            belt: Box::new(belt),
            left_encoder: Box::new(left_encoder),
            right_encoder: Box::new(right_encoder),
            note_sensor: Box::new(note_sensor),
        }
    }
}

pub struct ShooterHardware {
    pub wheels: BoxedActuator,
    pub feed: BoxedActuator,
}

impl ShooterHardware {
    pub fn new(wheels: impl Actuator + 'static, feed: impl Actuator + 'static) -> Self {
        Self {
            wheels: Box::new(wheels),
            feed: Box::new(feed),
        }
    }
}

/// Left and right climber winches.
pub struct ClimberHardware {
    pub left: BoxedActuator,
    pub right: BoxedActuator,
}

impl ClimberHardware {
    pub fn new(left: impl Actuator + 'static, right: impl Actuator + 'static) -> Self {
        Self {
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

pub struct RobotBuilder<D, A, S> {
    drive: Option<DriveHardware>,
    arm: Option<ArmHardware>,
    shooter: Option<ShooterHardware>,
    climber: Option<ClimberHardware>,
    cameras: Vec<BoxedCamera>,
    cfg: RobotCfg,
    _d: PhantomData<D>,
    _a: PhantomData<A>,
    _s: PhantomData<S>,
}

impl Default for RobotBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            drive: None,
            arm: None,
            shooter: None,
            climber: None,
            cameras: Vec::new(),
            cfg: RobotCfg::default(),
            _d: PhantomData,
            _a: PhantomData,
            _s: PhantomData,
        }
    }
}

impl Robot {
    /// Start building a Robot.
    pub fn builder() -> RobotBuilder<Missing, Missing, Missing> {
        RobotBuilder::default()
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

fn check_gains(gains: PidGains, msg: &'static str) -> Result<()> {
    if gains.is_finite() {
        Ok(())
    } else {
        Err(invalid(msg))
    }
}

fn check_tolerance(t: Tolerance, msg: &'static str) -> Result<()> {
    if t.position > 0.0 && !t.velocity.is_nan() && t.velocity > 0.0 {
        Ok(())
    } else {
        Err(invalid(msg))
    }
}

fn check_duty(v: f64, msg: &'static str) -> Result<()> {
    if v.is_finite() && (-1.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(invalid(msg))
    }
}

fn check_unit(v: f64, msg: &'static str) -> Result<()> {
    if v.is_finite() && (0.0..1.0).contains(&v) {
        Ok(())
    } else {
        Err(invalid(msg))
    }
}

fn brake(actuator: &mut BoxedActuator, name: &'static str) -> Result<()> {
    actuator
        .set_idle_mode(IdleMode::Brake)
        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
        .wrap_err_with(|| format!("setting {name} to brake"))
}

fn check_seconds(v: f64, msg: &'static str) -> Result<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(msg))
    }
}

/// Validate configuration and assemble the robot.
///
/// This is the single source of truth for validation, used by every build path.
fn validate_and_build(
    drive: DriveHardware,
    mut arm: ArmHardware,
    shooter: ShooterHardware,
    climber: Option<ClimberHardware>,
    cameras: Vec<BoxedCamera>,
    cfg: RobotCfg,
) -> Result<Robot> {
    let RobotCfg {
        tick: TickCfg { rate_hz },
        vision,
        alignment,
        arm: arm_cfg,
        shooter: shooter_cfg,
        climber: climber_cfg,
    } = cfg;

    // ── Validation ───────────────────────────────────────────────────────────
    if rate_hz == 0 {
        return Err(invalid("tick rate_hz must be > 0"));
    }
    validate_vision(&vision)?;
    validate_alignment(&alignment)?;
    validate_arm(&arm_cfg)?;
    validate_shooter(&shooter_cfg)?;
    validate_climber(&climber_cfg)?;

    // ── Assembly ─────────────────────────────────────────────────────────────
    brake(&mut arm.joint, "arm joint")?;
    let climber = match climber {
        Some(mut hw) => {
            brake(&mut hw.left, "left climber")?;
            brake(&mut hw.right, "right climber")?;
            Some(ClimberController::new(hw.left, hw.right, climber_cfg))
        }
        None => None,
    };
    let estimator = ArmPositionEstimator::new(
        arm.left_encoder,
        arm.right_encoder,
        &arm_cfg,
        period_s(rate_hz),
    );
    Ok(Robot {
        vision: VisionTracker::new(vision, cameras),
        estimator,
        gyro: drive.gyro,
        alignment: AlignmentController::new(drive.chassis, alignment, rate_hz),
        arm: ArmController::new(arm.joint, arm.belt, arm.note_sensor, arm_cfg, rate_hz),
        shooter: ShooterController::new(shooter.wheels, shooter.feed, shooter_cfg, rate_hz),
        climber,
        arm_published: ArmSnapshot::default(),
        shooter_published: ShooterSnapshot::default(),
        ticks: 0,
        rate_hz,
    })
}

fn validate_vision(v: &VisionCfg) -> Result<()> {
    if v.filter_window == 0 {
        return Err(invalid("vision filter_window must be >= 1"));
    }
    if !v.mount_x.is_finite() || !v.mount_y.is_finite() {
        return Err(invalid("vision mount vector must be finite"));
    }
    if !v.heading_sign.is_finite() || v.heading_sign == 0.0 {
        return Err(invalid("vision heading_sign must be non-zero"));
    }
    Ok(())
}

fn validate_alignment(a: &AlignmentCfg) -> Result<()> {
    check_gains(a.turn_gains, "turn gains must be finite")?;
    check_gains(a.spacing_gains, "spacing gains must be finite")?;
    check_tolerance(a.turn_tolerance, "turn tolerances must be > 0")?;
    check_tolerance(a.spacing_tolerance, "spacing tolerances must be > 0")?;
    check_duty(a.max_turn, "max_turn must be within [-1, 1]")?;
    check_duty(a.max_forward, "max_forward must be within [-1, 1]")?;
    if !a.standoff_m.is_finite() || a.standoff_m < 0.0 {
        return Err(invalid("standoff_m must be >= 0"));
    }
    check_seconds(a.settle_s, "settle_s must be >= 0")?;
    check_seconds(a.turn_timeout_s, "turn_timeout_s must be >= 0")?;
    if !a.turn_polarity.is_finite() || !a.forward_polarity.is_finite() {
        return Err(invalid("output polarities must be finite"));
    }
    Ok(())
}

fn validate_arm(a: &ArmCfg) -> Result<()> {
    check_unit(a.left.offset, "left encoder offset must be within [0, 1)")?;
    check_unit(a.right.offset, "right encoder offset must be within [0, 1)")?;
    check_unit(a.retracted, "retracted position must be within [0, 1)")?;
    check_unit(a.deployed, "deployed position must be within [0, 1)")?;
    check_unit(a.lower_limit, "lower_limit must be within [0, 1)")?;
    check_unit(a.upper_limit, "upper_limit must be within [0, 1)")?;
    if !a.disagreement_tolerance.is_finite()
        || !(0.0..=0.5).contains(&a.disagreement_tolerance)
    {
        return Err(invalid("disagreement_tolerance must be within [0, 0.5]"));
    }
    check_gains(a.joint_gains, "joint gains must be finite")?;
    check_tolerance(a.joint_tolerance, "joint tolerances must be > 0")?;
    check_duty(a.max_joint_duty, "max_joint_duty must be within [-1, 1]")?;
    check_duty(a.intake_speed, "arm intake_speed must be within [-1, 1]")?;
    check_duty(a.eject_speed, "arm eject_speed must be within [-1, 1]")?;
    Ok(())
}

fn validate_shooter(s: &ShooterCfg) -> Result<()> {
    check_duty(s.wheel_intake_speed, "wheel_intake_speed must be within [-1, 1]")?;
    check_duty(s.wheel_shoot_speed, "wheel_shoot_speed must be within [-1, 1]")?;
    check_duty(s.wheel_eject_speed, "wheel_eject_speed must be within [-1, 1]")?;
    check_duty(s.feed_in_speed, "feed_in_speed must be within [-1, 1]")?;
    check_duty(s.feed_out_speed, "feed_out_speed must be within [-1, 1]")?;
    check_seconds(s.feed_s, "feed_s must be >= 0")?;
    check_seconds(s.shoot_s, "shoot_s must be >= 0")?;
    check_seconds(s.backoff_s, "backoff_s must be >= 0")?;
    if s.backoff_s > s.feed_s {
        return Err(invalid("backoff_s must not exceed feed_s"));
    }
    Ok(())
}

fn validate_climber(c: &ClimberCfg) -> Result<()> {
    check_duty(c.speed, "climber speed must be within [-1, 1]")
}

impl<D, A, S> RobotBuilder<D, A, S> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Robot> {
        let drive = self
            .drive
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDrive))?;
        let arm = self
            .arm
            .ok_or_else(|| eyre::Report::new(BuildError::MissingArm))?;
        let shooter = self
            .shooter
            .ok_or_else(|| eyre::Report::new(BuildError::MissingShooter))?;
        validate_and_build(drive, arm, shooter, self.climber, self.cameras, self.cfg)
    }
}

/// Chainable setters that do not affect type-state.
impl<D, A, S> RobotBuilder<D, A, S> {
    pub fn with_config(mut self, cfg: RobotCfg) -> Self {
        self.cfg = cfg;
        self
    }
    pub fn with_tick(mut self, tick: TickCfg) -> Self {
        self.cfg.tick = tick;
        self
    }
    pub fn with_vision(mut self, vision: VisionCfg) -> Self {
        self.cfg.vision = vision;
        self
    }
    pub fn with_alignment(mut self, alignment: AlignmentCfg) -> Self {
        self.cfg.alignment = alignment;
        self
    }
    pub fn with_arm_config(mut self, arm: ArmCfg) -> Self {
        self.cfg.arm = arm;
        self
    }
    pub fn with_shooter_config(mut self, shooter: ShooterCfg) -> Self {
        self.cfg.shooter = shooter;
        self
    }
    pub fn with_climber_config(mut self, climber: ClimberCfg) -> Self {
        self.cfg.climber = climber;
        self
    }
    pub fn with_climber(mut self, climber: ClimberHardware) -> Self {
        self.climber = Some(climber);
        self
    }
    /// Attach one more camera; any number, including none, is allowed.
    pub fn with_camera(mut self, camera: impl TargetSource + 'static) -> Self {
        self.cameras.push(Box::new(camera));
        self
    }
}

// Setters that advance type-state
impl<A, S> RobotBuilder<Missing, A, S> {
    pub fn with_drive(self, drive: DriveHardware) -> RobotBuilder<Set, A, S> {
        RobotBuilder {
            drive: Some(drive),
            arm: self.arm,
            shooter: self.shooter,
            climber: self.climber,
            cameras: self.cameras,
            cfg: self.cfg,
            _d: PhantomData,
            _a: PhantomData,
            _s: PhantomData,
        }
    }
}

impl<D, S> RobotBuilder<D, Missing, S> {
    pub fn with_arm(self, arm: ArmHardware) -> RobotBuilder<D, Set, S> {
        RobotBuilder {
            drive: self.drive,
            arm: Some(arm),
            shooter: self.shooter,
            climber: self.climber,
            cameras: self.cameras,
            cfg: self.cfg,
            _d: PhantomData,
            _a: PhantomData,
            _s: PhantomData,
        }
    }
}

impl<D, A> RobotBuilder<D, A, Missing> {
    pub fn with_shooter(self, shooter: ShooterHardware) -> RobotBuilder<D, A, Set> {
        RobotBuilder {
            drive: self.drive,
            arm: self.arm,
            shooter: Some(shooter),
            climber: self.climber,
            cameras: self.cameras,
            cfg: self.cfg,
            _d: PhantomData,
            _a: PhantomData,
            _s: PhantomData,
        }
    }
}

impl RobotBuilder<Set, Set, Set> {
    /// Validate and build. Only available when all hardware is set.
    pub fn build(self) -> Result<Robot> {
        self.try_build()
    }
}
