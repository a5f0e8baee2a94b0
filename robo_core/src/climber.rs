//! Two independent climber winches.
//!
//! Each side has its own level-triggered extend and contract requests.
//! Contract wins when both are asserted for the same side in one tick.

use eyre::WrapErr;
use robo_traits::Actuator;

use crate::config::ClimberCfg;
use crate::error::{ControlError, Result};
use crate::hw_error::map_hw_error;
use crate::trigger::Level;
use crate::util::check_command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WinchMotion {
    #[default]
    Stopped,
    Extending,
    Contracting,
}

impl WinchMotion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Extending => "extending",
            Self::Contracting => "contracting",
        }
    }

    fn from_requests(extend: bool, contract: bool) -> Self {
        if contract {
            Self::Contracting
        } else if extend {
            Self::Extending
        } else {
            Self::Stopped
        }
    }
}

/// Requests one climber tick acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClimberRequests {
    pub extend_left: bool,
    pub extend_right: bool,
    pub contract_left: bool,
    pub contract_right: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClimberOutput {
    pub left: f64,
    pub right: f64,
}

pub struct ClimberController<L: Actuator, R: Actuator> {
    left: L,
    right: R,
    cfg: ClimberCfg,
    extend_left: Level<bool>,
    extend_right: Level<bool>,
    contract_left: Level<bool>,
    contract_right: Level<bool>,
    motion: [WinchMotion; 2],
    last_output: ClimberOutput,
}

impl<L: Actuator, R: Actuator> core::fmt::Debug for ClimberController<L, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClimberController")
            .field("motion", &self.motion)
            .field("last_output", &self.last_output)
            .finish()
    }
}

impl<L: Actuator, R: Actuator> ClimberController<L, R> {
    pub fn new(left: L, right: R, cfg: ClimberCfg) -> Self {
        Self {
            left,
            right,
            cfg,
            extend_left: Level::new(),
            extend_right: Level::new(),
            contract_left: Level::new(),
            contract_right: Level::new(),
            motion: [WinchMotion::Stopped; 2],
            last_output: ClimberOutput::default(),
        }
    }

    pub fn request_extend_left(&mut self) {
        self.extend_left.set(true);
    }

    pub fn request_extend_right(&mut self) {
        self.extend_right.set(true);
    }

    pub fn request_contract_left(&mut self) {
        self.contract_left.set(true);
    }

    pub fn request_contract_right(&mut self) {
        self.contract_right.set(true);
    }

    pub fn request_extend(&mut self) {
        self.request_extend_left();
        self.request_extend_right();
    }

    pub fn request_contract(&mut self) {
        self.request_contract_left();
        self.request_contract_right();
    }

    /// Motion of the `[left, right]` winches during the last tick.
    pub fn motion(&self) -> [WinchMotion; 2] {
        self.motion
    }

    pub fn last_output(&self) -> ClimberOutput {
        self.last_output
    }

    pub fn config(&self) -> &ClimberCfg {
        &self.cfg
    }

    pub fn set_speed(&mut self, speed: f64) -> std::result::Result<(), ControlError> {
        self.cfg.speed = check_command("climber_speed", speed)?;
        Ok(())
    }

    /// Zero both winches, logging rather than returning failures.
    pub fn stop_best_effort(&mut self) {
        self.motion = [WinchMotion::Stopped; 2];
        self.last_output = ClimberOutput::default();
        if let Err(e) = self.left.stop() {
            tracing::warn!(error = %e, "left climber stop failed");
        }
        if let Err(e) = self.right.stop() {
            tracing::warn!(error = %e, "right climber stop failed");
        }
    }

    /// Take this tick's requests and reset them to their defaults.
    pub fn begin_tick(&mut self) -> ClimberRequests {
        ClimberRequests {
            extend_left: self.extend_left.take(),
            extend_right: self.extend_right.take(),
            contract_left: self.contract_left.take(),
            contract_right: self.contract_right.take(),
        }
    }

    pub fn tick(&mut self) -> Result<ClimberOutput> {
        let requests = self.begin_tick();
        self.step(requests)
    }

    /// Run one tick on requests already taken with [`Self::begin_tick`].
    pub fn step(&mut self, requests: ClimberRequests) -> Result<ClimberOutput> {
        let left = WinchMotion::from_requests(requests.extend_left, requests.contract_left);
        let right = WinchMotion::from_requests(requests.extend_right, requests.contract_right);
        if [left, right] != self.motion {
            tracing::debug!(left = left.as_str(), right = right.as_str(), "climber");
        }
        self.motion = [left, right];

        let out = ClimberOutput {
            left: self.duty(left, self.cfg.left_inverted),
            right: self.duty(right, self.cfg.right_inverted),
        };
        self.last_output = out;
        self.left
            .set_duty(out.left)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("left climber")?;
        self.right
            .set_duty(out.right)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("right climber")?;
        Ok(out)
    }

    fn duty(&self, motion: WinchMotion, inverted: bool) -> f64 {
        let duty = match motion {
            WinchMotion::Stopped => 0.0,
            WinchMotion::Extending => self.cfg.speed,
            WinchMotion::Contracting => -self.cfg.speed,
        };
        if inverted { -duty } else { duty }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_beats_extend_per_side() {
        assert_eq!(WinchMotion::from_requests(true, true), WinchMotion::Contracting);
        assert_eq!(WinchMotion::from_requests(true, false), WinchMotion::Extending);
        assert_eq!(WinchMotion::from_requests(false, false), WinchMotion::Stopped);
    }
}
