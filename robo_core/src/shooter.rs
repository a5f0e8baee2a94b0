//! Intake, hold, feed and shoot sequencing for the shooter wheels and feed.

use eyre::WrapErr;
use robo_traits::Actuator;

use crate::config::ShooterCfg;
use crate::error::{ControlError, Result};
use crate::hw_error::map_hw_error;
use crate::machine::Machine;
use crate::status::{ArmSnapshot, ShooterSnapshot};
use crate::trigger::Level;
use crate::util::{check_command, ticks_for};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShooterState {
    Idle,
    Intaking,
    Holding,
    Ejecting,
    /// Timed: wheels spin up while the feed first backs the note off.
    Feeding,
    /// Timed: the feed pushes the note through the wheels.
    Shooting,
}

impl ShooterState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Intaking => "intaking",
            Self::Holding => "holding",
            Self::Ejecting => "ejecting",
            Self::Feeding => "feeding",
            Self::Shooting => "shooting",
        }
    }

    /// What the arm reads to decide whether it may move.
    pub fn is_running_motors(self) -> bool {
        !matches!(self, Self::Idle | Self::Holding)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShooterOutput {
    pub wheels: f64,
    pub feed: f64,
}

/// Requests one shooter tick acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShooterRequests {
    pub intake: bool,
    pub eject: bool,
    pub shoot: bool,
}

pub struct ShooterController<W: Actuator, F: Actuator> {
    wheels: W,
    feed: F,
    cfg: ShooterCfg,
    machine: Machine<ShooterState>,
    intake: Level<bool>,
    eject: Level<bool>,
    shoot: Level<bool>,
    note_ticks: u32,
    /// A note was seen during the current ejection.
    eject_saw_note: bool,
    /// The last ejection finished with eject still held; cleared on release.
    eject_done: bool,
    rate_hz: u32,
    last_output: ShooterOutput,
}

impl<W: Actuator, F: Actuator> core::fmt::Debug for ShooterController<W, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShooterController")
            .field("state", &self.machine.current())
            .field("note_ticks", &self.note_ticks)
            .field("last_output", &self.last_output)
            .finish()
    }
}

impl<W: Actuator, F: Actuator> ShooterController<W, F> {
    pub fn new(wheels: W, feed: F, cfg: ShooterCfg, rate_hz: u32) -> Self {
        Self {
            wheels,
            feed,
            cfg,
            machine: Machine::new("shooter", ShooterState::Idle),
            intake: Level::new(),
            eject: Level::new(),
            shoot: Level::new(),
            note_ticks: 0,
            eject_saw_note: false,
            eject_done: false,
            rate_hz,
            last_output: ShooterOutput::default(),
        }
    }

    pub fn current_state(&self) -> ShooterState {
        self.machine.current()
    }

    pub fn ticks_in_state(&self) -> u32 {
        self.machine.ticks_in_state()
    }

    pub fn engage(&mut self, state: ShooterState) {
        self.machine.engage(state);
    }

    pub fn is_running_motors(&self) -> bool {
        self.machine.current().is_running_motors()
    }

    pub fn request_intake(&mut self) {
        self.intake.set(true);
    }

    pub fn request_eject(&mut self) {
        self.eject.set(true);
    }

    pub fn request_shoot(&mut self) {
        self.shoot.set(true);
    }

    pub fn snapshot(&self) -> ShooterSnapshot {
        ShooterSnapshot {
            state: self.machine.current(),
        }
    }

    pub fn last_output(&self) -> ShooterOutput {
        self.last_output
    }

    pub fn config(&self) -> &ShooterCfg {
        &self.cfg
    }

    pub fn set_shoot_speed(&mut self, speed: f64) -> std::result::Result<(), ControlError> {
        self.cfg.wheel_shoot_speed = check_command("wheel_shoot_speed", speed)?;
        Ok(())
    }

    pub fn set_intake_speed(&mut self, speed: f64) -> std::result::Result<(), ControlError> {
        self.cfg.wheel_intake_speed = check_command("wheel_intake_speed", speed)?;
        Ok(())
    }

    pub fn set_feed_speed(&mut self, speed: f64) -> std::result::Result<(), ControlError> {
        self.cfg.feed_in_speed = check_command("feed_in_speed", speed)?;
        Ok(())
    }

    /// Zero wheels and feed, logging rather than returning failures.
    pub fn stop_best_effort(&mut self) {
        self.last_output = ShooterOutput::default();
        if let Err(e) = self.wheels.stop() {
            tracing::warn!(error = %e, "shooter wheels stop failed");
        }
        if let Err(e) = self.feed.stop() {
            tracing::warn!(error = %e, "shooter feed stop failed");
        }
    }

    /// Take this tick's requests and reset them to their defaults.
    pub fn begin_tick(&mut self) -> ShooterRequests {
        ShooterRequests {
            intake: self.intake.take(),
            eject: self.eject.take(),
            shoot: self.shoot.take(),
        }
    }

    /// Run one tick against the arm's previously published snapshot.
    pub fn tick(&mut self, arm: &ArmSnapshot) -> Result<ShooterSnapshot> {
        let requests = self.begin_tick();
        self.step(requests, arm)
    }

    /// Run one tick on requests already taken with [`Self::begin_tick`].
    pub fn step(&mut self, requests: ShooterRequests, arm: &ArmSnapshot) -> Result<ShooterSnapshot> {
        let ShooterRequests {
            intake,
            eject,
            shoot,
        } = requests;
        let state = self.machine.current();
        if !eject {
            self.eject_done = false;
        }

        let out = if eject && !self.eject_done && state != ShooterState::Ejecting {
            self.machine.next_state(ShooterState::Ejecting);
            ShooterOutput::default()
        } else {
            self.run_state(state, arm, intake, eject, shoot)
        };
        self.machine.end_tick();

        self.last_output = out;
        tracing::trace!(wheels = out.wheels, feed = out.feed, "shooter output");
        self.wheels
            .set_duty(out.wheels)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("shooter wheels")?;
        self.feed
            .set_duty(out.feed)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("shooter feed")?;
        Ok(self.snapshot())
    }

    fn run_state(
        &mut self,
        state: ShooterState,
        arm: &ArmSnapshot,
        intake: bool,
        eject: bool,
        shoot: bool,
    ) -> ShooterOutput {
        let cfg = self.cfg;
        match state {
            ShooterState::Idle => {
                if intake {
                    self.machine.next_state(ShooterState::Intaking);
                } else if shoot {
                    // a preloaded note can be shot without intaking first
                    self.machine.next_state(ShooterState::Feeding);
                }
                ShooterOutput::default()
            }
            ShooterState::Intaking => {
                if self.machine.ticks_in_state() == 0 {
                    self.note_ticks = 0;
                }
                self.note_ticks = if arm.has_note {
                    self.note_ticks.saturating_add(1)
                } else {
                    0
                };
                if self.note_ticks >= cfg.note_debounce_ticks.max(1) {
                    self.machine.next_state(ShooterState::Holding);
                } else if !intake {
                    self.machine.next_state(ShooterState::Idle);
                }
                ShooterOutput {
                    wheels: cfg.wheel_intake_speed,
                    feed: cfg.feed_in_speed,
                }
            }
            ShooterState::Holding => {
                if shoot {
                    self.machine.next_state(ShooterState::Feeding);
                }
                ShooterOutput::default()
            }
            ShooterState::Feeding => {
                let backoff_ticks = (cfg.backoff_s.max(0.0) * f64::from(self.rate_hz)).round();
                let feed = if f64::from(self.machine.ticks_in_state()) < backoff_ticks {
                    cfg.feed_out_speed
                } else {
                    0.0
                };
                if self.machine.expired(ticks_for(cfg.feed_s, self.rate_hz)) {
                    self.machine.next_state(ShooterState::Shooting);
                }
                ShooterOutput {
                    wheels: cfg.wheel_shoot_speed,
                    feed,
                }
            }
            ShooterState::Shooting => {
                if self.machine.expired(ticks_for(cfg.shoot_s, self.rate_hz)) {
                    self.machine.next_state(ShooterState::Idle);
                }
                ShooterOutput {
                    wheels: cfg.wheel_shoot_speed,
                    feed: cfg.feed_in_speed,
                }
            }
            ShooterState::Ejecting => {
                if self.machine.ticks_in_state() == 0 {
                    self.eject_saw_note = false;
                }
                self.eject_saw_note |= arm.has_note;
                if !eject {
                    self.machine.next_state(ShooterState::Idle);
                } else if self.eject_saw_note && !arm.has_note {
                    // note is out; a held request does not restart the ejection
                    self.eject_done = true;
                    self.machine.next_state(ShooterState::Idle);
                }
                ShooterOutput {
                    wheels: cfg.wheel_eject_speed,
                    feed: cfg.feed_out_speed,
                }
            }
        }
    }
}
