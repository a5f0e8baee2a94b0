#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the robot control core.
//!
//! Every section is optional and falls back to the tuned defaults, so an
//! empty file is a valid configuration. `Config::validate` rejects values
//! the core cannot run with.
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct TickCfg {
    pub rate_hz: u32,
}

impl Default for TickCfg {
    fn default() -> Self {
        Self { rate_hz: 50 }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct VisionCfg {
    /// Median window and staleness debounce in ticks.
    pub filter_window: usize,
    /// Tag ids to track; empty tracks every tag.
    pub sought_ids: Vec<i32>,
    /// Robot-center to camera vector (meters).
    pub mount_x: f64,
    pub mount_y: f64,
    pub heading_sign: f64,
}

impl Default for VisionCfg {
    fn default() -> Self {
        Self {
            filter_window: 10,
            sought_ids: Vec::new(),
            mount_x: 0.3556,
            mount_y: 0.2159,
            heading_sign: -1.0,
        }
    }
}

/// Gains and tolerances of one PID loop.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct PidCfg {
    pub kp: f64,
    #[serde(default)]
    pub ki: f64,
    #[serde(default)]
    pub kd: f64,
    pub position_tolerance: f64,
    /// Absent means any rate of change is accepted.
    #[serde(default)]
    pub velocity_tolerance: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AlignmentCfg {
    pub turn: PidCfg,
    pub spacing: PidCfg,
    pub standoff_m: f64,
    pub max_turn: f64,
    pub max_forward: f64,
    pub turn_polarity: f64,
    pub forward_polarity: f64,
    pub settle_s: f64,
    pub turn_timeout_s: f64,
    pub chain_spacing: bool,
    pub latency_compensation: bool,
    pub track_target: bool,
}

impl Default for AlignmentCfg {
    fn default() -> Self {
        Self {
            turn: PidCfg {
                kp: 0.025,
                ki: 0.0,
                kd: 0.003,
                position_tolerance: 5.0,
                velocity_tolerance: Some(0.1),
            },
            spacing: PidCfg {
                kp: 2.0,
                ki: 0.0,
                kd: 0.0,
                position_tolerance: 0.1,
                velocity_tolerance: None,
            },
            standoff_m: 0.3,
            max_turn: 0.5,
            max_forward: 0.5,
            turn_polarity: -1.0,
            forward_polarity: -1.0,
            settle_s: 0.5,
            turn_timeout_s: 5.0,
            chain_spacing: false,
            latency_compensation: true,
            track_target: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ArmCfg {
    /// Raw encoder readings at arm position 0.
    pub left_offset: f64,
    pub right_offset: f64,
    pub left_inverted: bool,
    pub right_inverted: bool,
    pub disagreement_tolerance: f64,
    pub retracted: f64,
    pub deployed: f64,
    pub lower_limit: f64,
    pub upper_limit: f64,
    pub joint: PidCfg,
    pub max_joint_duty: f64,
    pub joint_inverted: bool,
    pub intake_speed: f64,
    pub eject_speed: f64,
}

impl Default for ArmCfg {
    fn default() -> Self {
        Self {
            left_offset: 0.886,
            right_offset: 0.359,
            left_inverted: false,
            right_inverted: false,
            disagreement_tolerance: 0.05,
            retracted: 0.05,
            deployed: 0.40,
            lower_limit: 0.02,
            upper_limit: 0.43,
            joint: PidCfg {
                kp: 4.0,
                ki: 0.0,
                kd: 0.0,
                position_tolerance: 0.01,
                velocity_tolerance: None,
            },
            max_joint_duty: 0.6,
            joint_inverted: false,
            intake_speed: 0.5,
            eject_speed: -0.5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ShooterCfg {
    pub wheel_intake_speed: f64,
    pub wheel_shoot_speed: f64,
    pub wheel_eject_speed: f64,
    pub feed_in_speed: f64,
    pub feed_out_speed: f64,
    pub feed_s: f64,
    pub shoot_s: f64,
    pub backoff_s: f64,
    pub note_debounce_ticks: u32,
}

impl Default for ShooterCfg {
    fn default() -> Self {
        Self {
            wheel_intake_speed: -0.3,
            wheel_shoot_speed: 1.0,
            wheel_eject_speed: -0.5,
            feed_in_speed: 0.3,
            feed_out_speed: -0.3,
            feed_s: 1.0,
            shoot_s: 1.0,
            backoff_s: 0.25,
            note_debounce_ticks: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ClimberCfg {
    pub speed: f64,
    pub left_inverted: bool,
    pub right_inverted: bool,
}

impl Default for ClimberCfg {
    fn default() -> Self {
        Self {
            speed: 0.3,
            left_inverted: false,
            right_inverted: true,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub tick: TickCfg,
    pub vision: VisionCfg,
    pub alignment: AlignmentCfg,
    pub arm: ArmCfg,
    pub shooter: ShooterCfg,
    pub climber: ClimberCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

fn finite(v: f64) -> bool {
    v.is_finite()
}

fn duty(v: f64) -> bool {
    v.is_finite() && (-1.0..=1.0).contains(&v)
}

fn unit(v: f64) -> bool {
    v.is_finite() && (0.0..1.0).contains(&v)
}

fn seconds(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

fn check_pid(name: &str, p: &PidCfg) -> eyre::Result<()> {
    if !(finite(p.kp) && finite(p.ki) && finite(p.kd)) {
        eyre::bail!("{name} gains must be finite");
    }
    if !(p.position_tolerance.is_finite() && p.position_tolerance > 0.0) {
        eyre::bail!("{name}.position_tolerance must be > 0");
    }
    if let Some(v) = p.velocity_tolerance
        && (v.is_nan() || v <= 0.0)
    {
        eyre::bail!("{name}.velocity_tolerance must be > 0");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Tick
        if self.tick.rate_hz == 0 {
            eyre::bail!("tick.rate_hz must be > 0");
        }
        if self.tick.rate_hz > 1000 {
            eyre::bail!("tick.rate_hz is unreasonably large (>1000)");
        }

        // Vision
        let v = &self.vision;
        if v.filter_window == 0 {
            eyre::bail!("vision.filter_window must be >= 1");
        }
        if !(finite(v.mount_x) && finite(v.mount_y)) {
            eyre::bail!("vision.mount_x and vision.mount_y must be finite");
        }
        if !finite(v.heading_sign) || v.heading_sign == 0.0 {
            eyre::bail!("vision.heading_sign must be non-zero");
        }

        // Alignment
        let a = &self.alignment;
        check_pid("alignment.turn", &a.turn)?;
        check_pid("alignment.spacing", &a.spacing)?;
        if !(a.standoff_m.is_finite() && a.standoff_m >= 0.0) {
            eyre::bail!("alignment.standoff_m must be >= 0");
        }
        if !duty(a.max_turn) || !duty(a.max_forward) {
            eyre::bail!("alignment.max_turn and alignment.max_forward must be in [-1, 1]");
        }
        if !(finite(a.turn_polarity) && finite(a.forward_polarity)) {
            eyre::bail!("alignment polarities must be finite");
        }
        if !seconds(a.settle_s) {
            eyre::bail!("alignment.settle_s must be >= 0");
        }
        if !seconds(a.turn_timeout_s) {
            eyre::bail!("alignment.turn_timeout_s must be >= 0");
        }

        // Arm
        let arm = &self.arm;
        for (name, value) in [
            ("arm.left_offset", arm.left_offset),
            ("arm.right_offset", arm.right_offset),
            ("arm.retracted", arm.retracted),
            ("arm.deployed", arm.deployed),
            ("arm.lower_limit", arm.lower_limit),
            ("arm.upper_limit", arm.upper_limit),
        ] {
            if !unit(value) {
                eyre::bail!("{name} must be in [0, 1)");
            }
        }
        if !(arm.disagreement_tolerance.is_finite()
            && (0.0..=0.5).contains(&arm.disagreement_tolerance))
        {
            eyre::bail!("arm.disagreement_tolerance must be in [0, 0.5]");
        }
        check_pid("arm.joint", &arm.joint)?;
        for (name, value) in [
            ("arm.max_joint_duty", arm.max_joint_duty),
            ("arm.intake_speed", arm.intake_speed),
            ("arm.eject_speed", arm.eject_speed),
        ] {
            if !duty(value) {
                eyre::bail!("{name} must be in [-1, 1]");
            }
        }

        // Shooter
        let s = &self.shooter;
        for (name, value) in [
            ("shooter.wheel_intake_speed", s.wheel_intake_speed),
            ("shooter.wheel_shoot_speed", s.wheel_shoot_speed),
            ("shooter.wheel_eject_speed", s.wheel_eject_speed),
            ("shooter.feed_in_speed", s.feed_in_speed),
            ("shooter.feed_out_speed", s.feed_out_speed),
        ] {
            if !duty(value) {
                eyre::bail!("{name} must be in [-1, 1]");
            }
        }
        for (name, value) in [
            ("shooter.feed_s", s.feed_s),
            ("shooter.shoot_s", s.shoot_s),
            ("shooter.backoff_s", s.backoff_s),
        ] {
            if !seconds(value) {
                eyre::bail!("{name} must be >= 0");
            }
        }
        if s.backoff_s > s.feed_s {
            eyre::bail!("shooter.backoff_s must not exceed shooter.feed_s");
        }

        // Climber
        if !duty(self.climber.speed) {
            eyre::bail!("climber.speed must be in [-1, 1]");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}
