//! The whole control core behind one two-phase tick.
//!
//! Each tick first takes every controller's requests, then samples the
//! sensors and advances alignment, arm, shooter and climber. The arm and
//! shooter read each other only through the snapshots published at the end
//! of the previous tick, so their evaluation order does not matter.

use eyre::WrapErr;
use robo_traits::{AbsoluteEncoder, Actuator, Chassis, Gyro, NoteSensor, TargetSource};

use crate::alignment::AlignmentController;
use crate::arm::{ArmController, ArmState};
use crate::arm_position::ArmPositionEstimator;
use crate::climber::ClimberController;
use crate::error::{ControlError, Result};
use crate::hw_error::map_hw_error;
use crate::shooter::ShooterController;
use crate::status::{ArmSnapshot, ShooterSnapshot, TickReport};
use crate::vision::VisionTracker;

pub type BoxedChassis = Box<dyn Chassis>;
pub type BoxedActuator = Box<dyn Actuator>;
pub type BoxedEncoder = Box<dyn AbsoluteEncoder>;
pub type BoxedCamera = Box<dyn TargetSource>;

/// Requests for the next tick, as produced by operator input or an
/// autonomous routine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Intent {
    pub forward: f64,
    pub turn: f64,
    pub align: bool,
    /// Sent to both arm and shooter.
    pub intake: bool,
    /// Sent to both arm and shooter.
    pub eject: bool,
    pub shoot: bool,
    pub arm_up: bool,
    /// Ignored when `arm_up` is also set.
    pub arm_down: bool,
    pub extend_left: bool,
    pub extend_right: bool,
    pub contract_left: bool,
    pub contract_right: bool,
}

impl Intent {
    fn wants_climber(&self) -> bool {
        self.extend_left || self.extend_right || self.contract_left || self.contract_right
    }
}

pub struct Robot {
    pub(crate) vision: VisionTracker<BoxedCamera>,
    pub(crate) estimator: ArmPositionEstimator<BoxedEncoder>,
    pub(crate) gyro: Box<dyn Gyro>,
    pub(crate) alignment: AlignmentController<BoxedChassis>,
    pub(crate) arm: ArmController<BoxedActuator, BoxedActuator, Box<dyn NoteSensor>>,
    pub(crate) shooter: ShooterController<BoxedActuator, BoxedActuator>,
    pub(crate) climber: Option<ClimberController<BoxedActuator, BoxedActuator>>,
    pub(crate) arm_published: ArmSnapshot,
    pub(crate) shooter_published: ShooterSnapshot,
    pub(crate) ticks: u64,
    pub(crate) rate_hz: u32,
}

impl core::fmt::Debug for Robot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Robot")
            .field("ticks", &self.ticks)
            .field("alignment", &self.alignment.current_state())
            .field("arm", &self.arm_published)
            .field("shooter", &self.shooter_published)
            .field("climber", &self.climber.as_ref().map(|c| c.motion()))
            .finish()
    }
}

impl Robot {
    /// Fan an intent out to the controllers' request setters.
    ///
    /// A rejected drive command leaves every request untouched.
    pub fn apply(&mut self, intent: &Intent) -> std::result::Result<(), ControlError> {
        self.alignment.arcade_drive(intent.forward, intent.turn)?;
        if intent.align {
            self.alignment.request_align();
        }
        if intent.intake {
            self.arm.request_intake();
            self.shooter.request_intake();
        }
        if intent.eject {
            self.arm.request_eject();
            self.shooter.request_eject();
        }
        if intent.shoot {
            self.shooter.request_shoot();
        }
        if intent.arm_up {
            self.arm.request_up();
        } else if intent.arm_down {
            self.arm.request_down();
        }
        match self.climber.as_mut() {
            Some(climber) => {
                if intent.extend_left {
                    climber.request_extend_left();
                }
                if intent.extend_right {
                    climber.request_extend_right();
                }
                if intent.contract_left {
                    climber.request_contract_left();
                }
                if intent.contract_right {
                    climber.request_contract_right();
                }
            }
            None if intent.wants_climber() => {
                tracing::debug!("climber request ignored: no climber fitted");
            }
            None => {}
        }
        Ok(())
    }

    /// Run one control tick.
    ///
    /// Requests are consumed before anything can fail, and every machine is
    /// stepped and published even when an earlier one reported a hardware
    /// error. The first error is returned; the tick is then not counted.
    pub fn tick(&mut self) -> Result<TickReport> {
        let align_req = self.alignment.begin_tick();
        let arm_req = self.arm.begin_tick();
        let shooter_req = self.shooter.begin_tick();
        let climber_req = self.climber.as_mut().map(ClimberController::begin_tick);

        let arm_prev = self.arm_published;
        let shooter_prev = self.shooter_published;

        let target = self.vision.update();
        let reading = self.estimator.update();

        if let Some(fault) = reading.fault
            && self.arm.current_state() != ArmState::Disabled
        {
            tracing::warn!(%fault, "disabling arm");
            self.arm.disable();
        }

        let drive = match self.gyro.sample() {
            Ok(gyro) => self.alignment.step(align_req, &target, gyro),
            Err(e) => {
                self.alignment.stop_best_effort();
                Err(eyre::Report::new(map_hw_error(&*e))).wrap_err("reading gyro")
            }
        };
        let arm = self.arm.step(arm_req, &reading, &shooter_prev);
        let shooter = self.shooter.step(shooter_req, &arm_prev);
        let climber = match (self.climber.as_mut(), climber_req) {
            (Some(climber), Some(req)) => climber.step(req).map(Some),
            _ => Ok(None),
        };

        self.arm_published = self.arm.snapshot();
        self.shooter_published = self.shooter.snapshot();

        for err in [
            drive.as_ref().err(),
            arm.as_ref().err(),
            shooter.as_ref().err(),
            climber.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .skip(1)
        {
            tracing::warn!(error = %err, "further failure in the same tick");
        }
        let drive = drive?;
        arm?;
        shooter?;
        climber?;
        self.ticks = self.ticks.saturating_add(1);

        let faults = reading.fault.into_iter().chain(self.vision.fault()).collect();
        Ok(TickReport {
            tick: self.ticks,
            alignment: self.alignment.current_state(),
            arm: self.arm_published.state,
            shooter: self.shooter_published.state,
            drive,
            arm_position: reading.position,
            has_target: target.has_target(),
            has_note: self.arm_published.has_note,
            faults,
        })
    }

    /// Stop every actuator; failures are logged and skipped.
    pub fn stop_all(&mut self) {
        self.alignment.stop_best_effort();
        self.arm.stop_best_effort();
        self.shooter.stop_best_effort();
        if let Some(climber) = self.climber.as_mut() {
            climber.stop_best_effort();
        }
    }

    /// Completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn rate_hz(&self) -> u32 {
        self.rate_hz
    }

    pub fn arm_snapshot(&self) -> ArmSnapshot {
        self.arm_published
    }

    pub fn shooter_snapshot(&self) -> ShooterSnapshot {
        self.shooter_published
    }

    pub fn vision(&self) -> &VisionTracker<BoxedCamera> {
        &self.vision
    }

    pub fn estimator(&self) -> &ArmPositionEstimator<BoxedEncoder> {
        &self.estimator
    }

    pub fn estimator_mut(&mut self) -> &mut ArmPositionEstimator<BoxedEncoder> {
        &mut self.estimator
    }

    pub fn alignment(&self) -> &AlignmentController<BoxedChassis> {
        &self.alignment
    }

    pub fn alignment_mut(&mut self) -> &mut AlignmentController<BoxedChassis> {
        &mut self.alignment
    }

    pub fn arm(&self) -> &ArmController<BoxedActuator, BoxedActuator, Box<dyn NoteSensor>> {
        &self.arm
    }

    pub fn arm_mut(
        &mut self,
    ) -> &mut ArmController<BoxedActuator, BoxedActuator, Box<dyn NoteSensor>> {
        &mut self.arm
    }

    pub fn shooter(&self) -> &ShooterController<BoxedActuator, BoxedActuator> {
        &self.shooter
    }

    pub fn shooter_mut(&mut self) -> &mut ShooterController<BoxedActuator, BoxedActuator> {
        &mut self.shooter
    }

    pub fn climber(&self) -> Option<&ClimberController<BoxedActuator, BoxedActuator>> {
        self.climber.as_ref()
    }

    pub fn climber_mut(&mut self) -> Option<&mut ClimberController<BoxedActuator, BoxedActuator>> {
        self.climber.as_mut()
    }
}
