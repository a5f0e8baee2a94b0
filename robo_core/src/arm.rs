//! Arm joint, belt and note sensor sequencing.
//!
//! The joint only moves toward a new setpoint while the shooter reported it
//! was not running its motors at the end of the previous tick.

use eyre::WrapErr;
use robo_traits::{Actuator, NoteSensor};

use crate::arm_position::ArmReading;
use crate::config::ArmCfg;
use crate::cyclic::cyclic_delta;
use crate::error::{ControlError, Result};
use crate::hw_error::map_hw_error;
use crate::machine::Machine;
use crate::pid::{PidController, PidGains, Tolerance};
use crate::shooter::ShooterState;
use crate::status::{ArmSnapshot, ShooterSnapshot};
use crate::trigger::Level;
use crate::util::{check_command, clamp_magnitude, period_s};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmState {
    Transitioning,
    Idle,
    Ready,
    Intaking,
    Ejecting,
    Disabled,
}

impl ArmState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transitioning => "transitioning",
            Self::Idle => "idle",
            Self::Ready => "ready",
            Self::Intaking => "intaking",
            Self::Ejecting => "ejecting",
            Self::Disabled => "disabled",
        }
    }
}

/// The two resting positions of the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmSetpoint {
    /// Stowed; rests in `Idle`.
    Retracted,
    /// Out over the floor; rests in `Ready`.
    Deployed,
}

/// Actuator outputs of one arm tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArmOutput {
    pub joint: f64,
    pub belt: f64,
}

/// Requests one arm tick acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArmRequests {
    /// `None` leaves the live setpoint alone.
    pub setpoint: Option<ArmSetpoint>,
    pub intake: bool,
    pub eject: bool,
}

pub struct ArmController<J: Actuator, B: Actuator, N: NoteSensor> {
    joint: J,
    belt: B,
    note: N,
    cfg: ArmCfg,
    machine: Machine<ArmState>,
    pid: PidController,
    setpoint: ArmSetpoint,
    pending: Level<Option<ArmSetpoint>>,
    intake: Level<bool>,
    eject: Level<bool>,
    has_note: bool,
    last_output: ArmOutput,
}

impl<J: Actuator, B: Actuator, N: NoteSensor> core::fmt::Debug for ArmController<J, B, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ArmController")
            .field("state", &self.machine.current())
            .field("setpoint", &self.setpoint)
            .field("has_note", &self.has_note)
            .field("last_output", &self.last_output)
            .finish()
    }
}

impl<J: Actuator, B: Actuator, N: NoteSensor> ArmController<J, B, N> {
    pub fn new(joint: J, belt: B, note: N, cfg: ArmCfg, rate_hz: u32) -> Self {
        let mut pid = PidController::new(cfg.joint_gains, period_s(rate_hz));
        pid.enable_continuous_input(0.0, 1.0);
        pid.set_tolerance(cfg.joint_tolerance);
        pid.set_setpoint(cfg.retracted);
        Self {
            joint,
            belt,
            note,
            cfg,
            machine: Machine::new("arm", ArmState::Transitioning),
            pid,
            setpoint: ArmSetpoint::Retracted,
            pending: Level::new(),
            intake: Level::new(),
            eject: Level::new(),
            has_note: false,
            last_output: ArmOutput::default(),
        }
    }

    pub fn current_state(&self) -> ArmState {
        self.machine.current()
    }

    pub fn ticks_in_state(&self) -> u32 {
        self.machine.ticks_in_state()
    }

    /// Force a state, bypassing transition evaluation for the next tick.
    pub fn engage(&mut self, state: ArmState) {
        self.machine.engage(state);
    }

    pub fn disable(&mut self) {
        self.engage(ArmState::Disabled);
    }

    /// Leave `Disabled` and drive back to the live setpoint.
    pub fn enable(&mut self) {
        self.engage(ArmState::Transitioning);
    }

    pub fn request_up(&mut self) {
        self.pending.set(Some(ArmSetpoint::Retracted));
    }

    pub fn request_down(&mut self) {
        self.pending.set(Some(ArmSetpoint::Deployed));
    }

    pub fn request_intake(&mut self) {
        self.intake.set(true);
    }

    pub fn request_eject(&mut self) {
        self.eject.set(true);
    }

    /// Live setpoint the joint is holding or moving toward.
    pub fn setpoint(&self) -> ArmSetpoint {
        self.setpoint
    }

    pub fn at_setpoint(&self) -> bool {
        self.pid.at_setpoint()
    }

    pub fn has_note(&self) -> bool {
        self.has_note
    }

    pub fn last_output(&self) -> ArmOutput {
        self.last_output
    }

    pub fn snapshot(&self) -> ArmSnapshot {
        ArmSnapshot {
            state: self.machine.current(),
            has_note: self.has_note,
        }
    }

    pub fn config(&self) -> &ArmCfg {
        &self.cfg
    }

    pub fn set_joint_gains(
        &mut self,
        gains: PidGains,
        tolerance: Tolerance,
    ) -> std::result::Result<(), ControlError> {
        if !gains.is_finite() {
            return Err(ControlError::Config("joint gains must be finite".into()));
        }
        if tolerance.position.is_nan() || tolerance.position <= 0.0 {
            return Err(ControlError::Config("joint tolerance must be > 0".into()));
        }
        self.cfg.joint_gains = gains;
        self.cfg.joint_tolerance = tolerance;
        Ok(())
    }

    pub fn set_intake_speed(&mut self, speed: f64) -> std::result::Result<(), ControlError> {
        self.cfg.intake_speed = check_command("intake_speed", speed)?;
        Ok(())
    }

    pub fn set_eject_speed(&mut self, speed: f64) -> std::result::Result<(), ControlError> {
        self.cfg.eject_speed = check_command("eject_speed", speed)?;
        Ok(())
    }

    /// Take this tick's requests and reset them to their defaults.
    pub fn begin_tick(&mut self) -> ArmRequests {
        ArmRequests {
            setpoint: self.pending.take(),
            intake: self.intake.take(),
            eject: self.eject.take(),
        }
    }

    /// Run one tick with this tick's position estimate and the shooter's
    /// previously published snapshot.
    pub fn tick(&mut self, reading: &ArmReading, shooter: &ShooterSnapshot) -> Result<ArmSnapshot> {
        let requests = self.begin_tick();
        self.step(requests, reading, shooter)
    }

    /// Run one tick on requests already taken with [`Self::begin_tick`].
    ///
    /// State transitions are committed before the actuators are written, so
    /// [`Self::snapshot`] is current even when this returns an error.
    pub fn step(
        &mut self,
        requests: ArmRequests,
        reading: &ArmReading,
        shooter: &ShooterSnapshot,
    ) -> Result<ArmSnapshot> {
        let ArmRequests {
            setpoint: pending,
            intake,
            eject,
        } = requests;
        let gate_open = !shooter.is_running_motors();

        self.has_note = self
            .note
            .has_note()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("reading note sensor")?;
        self.pid.set_gains(self.cfg.joint_gains);
        self.pid.set_tolerance(self.cfg.joint_tolerance);

        let mut out = ArmOutput::default();
        match self.machine.current() {
            ArmState::Transitioning => {
                if gate_open {
                    self.apply(pending);
                }
                let joint = self.measure(reading);
                if self.pid.at_setpoint() {
                    self.machine.next_state(match self.setpoint {
                        ArmSetpoint::Retracted => ArmState::Idle,
                        ArmSetpoint::Deployed => ArmState::Ready,
                    });
                } else if gate_open {
                    out.joint = joint;
                }
            }
            ArmState::Idle => {
                if gate_open {
                    self.apply(pending);
                }
                self.measure(reading);
                if !self.pid.at_setpoint() || self.setpoint != ArmSetpoint::Retracted {
                    self.machine.next_state(ArmState::Transitioning);
                }
            }
            ArmState::Ready => {
                if eject {
                    self.machine.next_state(ArmState::Ejecting);
                } else if intake {
                    self.machine.next_state(ArmState::Intaking);
                } else {
                    if gate_open {
                        self.apply(pending);
                    }
                    self.measure(reading);
                    if !self.pid.at_setpoint() || self.setpoint != ArmSetpoint::Deployed {
                        self.machine.next_state(ArmState::Transitioning);
                    }
                }
            }
            ArmState::Intaking => {
                if eject {
                    self.machine.next_state(ArmState::Ejecting);
                } else {
                    if matches!(shooter.state, ShooterState::Idle | ShooterState::Intaking) {
                        out.belt = self.cfg.intake_speed;
                    }
                    if !intake {
                        self.machine.next_state(ArmState::Ready);
                    }
                }
            }
            ArmState::Ejecting => {
                out.belt = self.cfg.eject_speed;
                if !eject {
                    self.machine.next_state(ArmState::Ready);
                }
            }
            ArmState::Disabled => {
                self.machine.end_tick();
                self.stop_best_effort();
                return Ok(self.snapshot());
            }
        }
        self.machine.end_tick();

        if self.cfg.joint_inverted {
            out.joint = -out.joint;
        }
        self.last_output = out;
        tracing::trace!(joint = out.joint, belt = out.belt, "arm output");
        self.joint
            .set_duty(out.joint)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("arm joint")?;
        self.belt
            .set_duty(out.belt)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("arm belt")?;
        Ok(self.snapshot())
    }

    fn apply(&mut self, pending: Option<ArmSetpoint>) {
        if let Some(sp) = pending
            && sp != self.setpoint
        {
            tracing::debug!(from = ?self.setpoint, to = ?sp, "arm setpoint");
            self.setpoint = sp;
        }
        self.pid.set_setpoint(self.goal());
    }

    fn goal(&self) -> f64 {
        match self.setpoint {
            ArmSetpoint::Retracted => self.cfg.retracted,
            ArmSetpoint::Deployed => self.cfg.deployed,
        }
    }

    /// Update the joint loop and return the limited joint duty.
    ///
    /// Without a position the loop is not advanced and the duty is zero.
    fn measure(&mut self, reading: &ArmReading) -> f64 {
        let Some(position) = reading.position else {
            self.pid.reset();
            return 0.0;
        };
        self.pid.set_setpoint(self.goal());
        let raw = self.pid.calculate(position);
        let duty = clamp_magnitude(raw, self.cfg.max_joint_duty);
        soft_limit(duty, position, reading, &self.cfg)
    }

    /// Zero joint and belt, logging rather than returning failures.
    pub fn stop_best_effort(&mut self) {
        self.last_output = ArmOutput::default();
        if let Err(e) = self.joint.stop() {
            tracing::warn!(error = %e, "arm joint stop failed while disabled");
        }
        if let Err(e) = self.belt.stop() {
            tracing::warn!(error = %e, "arm belt stop failed while disabled");
        }
    }
}

/// Past a limit, only duty that drives the arm back toward that limit passes.
fn soft_limit(duty: f64, position: f64, reading: &ArmReading, cfg: &ArmCfg) -> f64 {
    let limit = if reading.is_past_lower_limit() {
        cfg.lower_limit
    } else if reading.is_past_upper_limit() {
        cfg.upper_limit
    } else {
        return duty;
    };
    if duty * cyclic_delta(position, limit) < 0.0 {
        0.0
    } else {
        duty
    }
}
