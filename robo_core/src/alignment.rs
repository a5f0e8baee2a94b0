//! Turn-to-target and standoff alignment of the drive base.
//!
//! Manual drive commands only reach the chassis in `Free`. Every other state
//! owns the chassis until it hands control back.

use eyre::WrapErr;
use robo_traits::{Chassis, GyroSample};

use crate::config::AlignmentCfg;
use crate::cyclic::wrap_degrees;
use crate::error::{ControlError, Result};
use crate::hw_error::map_hw_error;
use crate::machine::Machine;
use crate::pid::{PidController, PidGains, Tolerance};
use crate::status::DriveCommand;
use crate::trigger::Level;
use crate::util::{check_command, clamp_magnitude, period_s, ticks_for};
use crate::vision::TargetView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentState {
    Free,
    Turning,
    Spacing,
    Settling,
}

impl AlignmentState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Turning => "turning",
            Self::Spacing => "spacing",
            Self::Settling => "settling",
        }
    }
}

/// Requests one alignment tick acts on, taken from the level-triggered fields.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlignmentRequests {
    pub manual: Option<DriveCommand>,
    pub align: bool,
}

pub struct AlignmentController<D: Chassis> {
    chassis: D,
    cfg: AlignmentCfg,
    machine: Machine<AlignmentState>,
    turn_pid: PidController,
    spacing_pid: PidController,
    manual: Level<Option<DriveCommand>>,
    align: Level<bool>,
    rate_hz: u32,
    last_command: DriveCommand,
}

impl<D: Chassis> core::fmt::Debug for AlignmentController<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AlignmentController")
            .field("state", &self.machine.current())
            .field("turn_setpoint", &self.turn_pid.setpoint())
            .field("last_command", &self.last_command)
            .finish()
    }
}

impl<D: Chassis> AlignmentController<D> {
    pub fn new(chassis: D, cfg: AlignmentCfg, rate_hz: u32) -> Self {
        let period = period_s(rate_hz);
        let mut turn_pid = PidController::new(cfg.turn_gains, period);
        turn_pid.set_tolerance(cfg.turn_tolerance);
        turn_pid.enable_continuous_input(0.0, 360.0);
        let mut spacing_pid = PidController::new(cfg.spacing_gains, period);
        spacing_pid.set_tolerance(cfg.spacing_tolerance);
        spacing_pid.set_setpoint(cfg.standoff_m);
        Self {
            chassis,
            cfg,
            machine: Machine::new("alignment", AlignmentState::Free),
            turn_pid,
            spacing_pid,
            manual: Level::new(),
            align: Level::new(),
            rate_hz,
            last_command: DriveCommand::default(),
        }
    }

    pub fn current_state(&self) -> AlignmentState {
        self.machine.current()
    }

    pub fn ticks_in_state(&self) -> u32 {
        self.machine.ticks_in_state()
    }

    /// Force a state, e.g. `Free` to abort an alignment in progress.
    pub fn engage(&mut self, state: AlignmentState) {
        self.machine.engage(state);
    }

    pub fn abort(&mut self) {
        self.engage(AlignmentState::Free);
    }

    /// Ask to start aligning on the next tick.
    pub fn request_align(&mut self) {
        self.align.set(true);
    }

    /// Manual drive for the next tick; honored only while `Free`.
    ///
    /// Out-of-range values are rejected and leave any earlier request intact.
    pub fn arcade_drive(
        &mut self,
        forward: f64,
        turn: f64,
    ) -> std::result::Result<(), ControlError> {
        let forward = check_command("forward", forward)?;
        let turn = check_command("turn", turn)?;
        self.manual.set(Some(DriveCommand { forward, turn }));
        Ok(())
    }

    pub fn set_turn_gains(
        &mut self,
        gains: PidGains,
        tolerance: Tolerance,
    ) -> std::result::Result<(), ControlError> {
        validate_loop("turn", gains, tolerance)?;
        self.cfg.turn_gains = gains;
        self.cfg.turn_tolerance = tolerance;
        Ok(())
    }

    pub fn set_spacing_gains(
        &mut self,
        gains: PidGains,
        tolerance: Tolerance,
    ) -> std::result::Result<(), ControlError> {
        validate_loop("spacing", gains, tolerance)?;
        self.cfg.spacing_gains = gains;
        self.cfg.spacing_tolerance = tolerance;
        Ok(())
    }

    pub fn set_standoff(&mut self, meters: f64) -> std::result::Result<(), ControlError> {
        if !meters.is_finite() || meters < 0.0 {
            return Err(ControlError::Config(format!("standoff {meters} must be >= 0")));
        }
        self.cfg.standoff_m = meters;
        Ok(())
    }

    pub fn config(&self) -> &AlignmentCfg {
        &self.cfg
    }

    /// Heading the controller is turning toward, once one was captured.
    pub fn turn_setpoint(&self) -> Option<f64> {
        self.turn_pid.has_setpoint().then(|| self.turn_pid.setpoint())
    }

    pub fn turn_at_setpoint(&self) -> bool {
        self.turn_pid.at_setpoint()
    }

    pub fn spacing_at_setpoint(&self) -> bool {
        self.spacing_pid.at_setpoint()
    }

    pub fn last_command(&self) -> DriveCommand {
        self.last_command
    }

    /// Command the chassis to stop, logging rather than returning failures.
    pub fn stop_best_effort(&mut self) {
        self.last_command = DriveCommand::default();
        if let Err(e) = self.chassis.arcade_drive(0.0, 0.0) {
            tracing::warn!(error = %e, "chassis stop failed");
        }
    }

    /// Take this tick's requests and reset them to their defaults.
    pub fn begin_tick(&mut self) -> AlignmentRequests {
        AlignmentRequests {
            manual: self.manual.take(),
            align: self.align.take(),
        }
    }

    /// Run one tick against this tick's vision output and gyro sample.
    pub fn tick(&mut self, target: &TargetView, gyro: GyroSample) -> Result<DriveCommand> {
        let requests = self.begin_tick();
        self.step(requests, target, gyro)
    }

    /// Run one tick on requests already taken with [`Self::begin_tick`].
    pub fn step(
        &mut self,
        requests: AlignmentRequests,
        target: &TargetView,
        gyro: GyroSample,
    ) -> Result<DriveCommand> {
        let AlignmentRequests { manual, align } = requests;
        let cmd = match self.machine.current() {
            AlignmentState::Free => {
                if align && target.has_target() {
                    self.capture_heading(target, gyro);
                    self.machine.next_state(AlignmentState::Turning);
                }
                manual.unwrap_or_default()
            }
            AlignmentState::Turning => self.turning(target, gyro),
            AlignmentState::Spacing => self.spacing(target),
            AlignmentState::Settling => {
                if self.machine.expired(ticks_for(self.cfg.settle_s, self.rate_hz)) {
                    self.machine.next_state(AlignmentState::Free);
                }
                DriveCommand::default()
            }
        };
        self.machine.end_tick();

        self.last_command = cmd;
        self.chassis
            .arcade_drive(cmd.forward, cmd.turn)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("arcade drive")?;
        Ok(cmd)
    }

    fn capture_heading(&mut self, target: &TargetView, gyro: GyroSample) {
        let Some(bearing) = target.heading_deg else {
            return;
        };
        let compensation = if self.cfg.latency_compensation {
            target.latency_s.unwrap_or(0.0) * gyro.rate_dps
        } else {
            0.0
        };
        let setpoint = wrap_degrees(gyro.heading_deg + bearing - compensation);
        tracing::debug!(bearing, setpoint, "captured heading");
        self.turn_pid.set_setpoint(setpoint);
    }

    fn turning(&mut self, target: &TargetView, gyro: GyroSample) -> DriveCommand {
        if !target.has_target() {
            self.machine.next_state(AlignmentState::Free);
            return DriveCommand::default();
        }
        if self.machine.ticks_in_state() == 0 {
            self.turn_pid.reset();
        }
        self.turn_pid.set_gains(self.cfg.turn_gains);
        self.turn_pid.set_tolerance(self.cfg.turn_tolerance);
        if self.cfg.track_target && !self.turn_pid.at_setpoint() {
            self.capture_heading(target, gyro);
        }

        let output = self.turn_pid.calculate(wrap_degrees(gyro.heading_deg));
        let turn = clamp_magnitude(self.cfg.turn_polarity * output, self.cfg.max_turn);
        tracing::trace!(output, turn, error = self.turn_pid.position_error(), "turning");

        let timed_out = self
            .machine
            .expired(ticks_for(self.cfg.turn_timeout_s, self.rate_hz));
        if self.turn_pid.at_setpoint() || timed_out {
            if timed_out && !self.turn_pid.at_setpoint() {
                tracing::debug!(error = self.turn_pid.position_error(), "turn timed out");
            }
            self.machine.next_state(if self.cfg.chain_spacing {
                AlignmentState::Spacing
            } else {
                AlignmentState::Settling
            });
        }
        DriveCommand { forward: 0.0, turn }
    }

    fn spacing(&mut self, target: &TargetView) -> DriveCommand {
        let Some(offset) = target.offset else {
            self.machine.next_state(AlignmentState::Free);
            return DriveCommand::default();
        };
        if self.machine.ticks_in_state() == 0 {
            self.spacing_pid.reset();
        }
        self.spacing_pid.set_gains(self.cfg.spacing_gains);
        self.spacing_pid.set_tolerance(self.cfg.spacing_tolerance);
        self.spacing_pid.set_setpoint(self.cfg.standoff_m);

        let output = self.spacing_pid.calculate(offset.x);
        let forward = clamp_magnitude(self.cfg.forward_polarity * output, self.cfg.max_forward);
        tracing::trace!(output, forward, x = offset.x, "spacing");
        if self.spacing_pid.at_setpoint() {
            self.machine.next_state(AlignmentState::Settling);
        }
        DriveCommand { forward, turn: 0.0 }
    }
}

fn validate_loop(
    name: &str,
    gains: PidGains,
    tolerance: Tolerance,
) -> std::result::Result<(), ControlError> {
    if !gains.is_finite() {
        return Err(ControlError::Config(format!("{name} gains must be finite")));
    }
    let positive = |v: f64| !v.is_nan() && v > 0.0;
    if !positive(tolerance.position) || !positive(tolerance.velocity) {
        return Err(ControlError::Config(format!("{name} tolerances must be > 0")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::Offset;

    #[derive(Default)]
    struct SpyChassis {
        calls: Vec<(f64, f64)>,
    }

    impl Chassis for SpyChassis {
        fn arcade_drive(
            &mut self,
            forward: f64,
            turn: f64,
        ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.calls.push((forward, turn));
            Ok(())
        }
    }

    fn seen(heading: f64) -> TargetView {
        TargetView {
            offset: Some(Offset {
                x: 2.0,
                y: 0.0,
                z: 0.0,
            }),
            heading_deg: Some(heading),
            latency_s: Some(0.1),
            tag_id: Some(7),
        }
    }

    #[test]
    fn latency_compensation_shifts_setpoint() {
        let mut a = AlignmentController::new(SpyChassis::default(), AlignmentCfg::default(), 50);
        a.request_align();
        let gyro = GyroSample {
            heading_deg: 350.0,
            rate_dps: 20.0,
        };
        a.tick(&seen(30.0), gyro).unwrap();
        // 350 + 30 - 0.1 * 20
        let sp = a.turn_setpoint().unwrap();
        assert!((sp - 18.0).abs() < 1e-9, "setpoint {sp}");
    }

    #[test]
    fn manual_command_rejected_without_side_effects() {
        let mut a = AlignmentController::new(SpyChassis::default(), AlignmentCfg::default(), 50);
        a.arcade_drive(0.2, 0.1).unwrap();
        let err = a.arcade_drive(1.5, 0.0).unwrap_err();
        assert!(matches!(err, ControlError::InvalidCommand { name: "forward", .. }));
        let cmd = a.tick(&TargetView::default(), GyroSample::default()).unwrap();
        assert_eq!(cmd, DriveCommand { forward: 0.2, turn: 0.1 });
    }

    #[test]
    fn live_gain_setter_rejects_nan() {
        let mut a = AlignmentController::new(SpyChassis::default(), AlignmentCfg::default(), 50);
        let before = a.config().turn_gains;
        assert!(a
            .set_turn_gains(PidGains::new(f64::NAN, 0.0, 0.0), Tolerance::position(1.0))
            .is_err());
        assert_eq!(a.config().turn_gains, before);
    }
}
