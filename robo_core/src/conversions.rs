//! `From` implementations bridging `robo_config` types to `robo_core` types.

use crate::config::{
    AlignmentCfg, ArmCfg, ClimberCfg, EncoderCal, RobotCfg, ShooterCfg, TickCfg, VisionCfg,
};
use crate::pid::{PidGains, Tolerance};

// ── PID loops ────────────────────────────────────────────────────────────────

impl From<&robo_config::PidCfg> for PidGains {
    fn from(c: &robo_config::PidCfg) -> Self {
        Self::new(c.kp, c.ki, c.kd)
    }
}

impl From<&robo_config::PidCfg> for Tolerance {
    fn from(c: &robo_config::PidCfg) -> Self {
        Self {
            position: c.position_tolerance,
            velocity: c.velocity_tolerance.unwrap_or(f64::INFINITY),
        }
    }
}

// ── TickCfg ──────────────────────────────────────────────────────────────────

impl From<&robo_config::TickCfg> for TickCfg {
    fn from(c: &robo_config::TickCfg) -> Self {
        Self { rate_hz: c.rate_hz }
    }
}

// ── VisionCfg ────────────────────────────────────────────────────────────────

impl From<&robo_config::VisionCfg> for VisionCfg {
    fn from(c: &robo_config::VisionCfg) -> Self {
        Self {
            filter_window: c.filter_window,
            sought_ids: c.sought_ids.clone(),
            mount_x: c.mount_x,
            mount_y: c.mount_y,
            heading_sign: c.heading_sign,
        }
    }
}

// ── AlignmentCfg ─────────────────────────────────────────────────────────────

impl From<&robo_config::AlignmentCfg> for AlignmentCfg {
    fn from(c: &robo_config::AlignmentCfg) -> Self {
        Self {
            turn_gains: (&c.turn).into(),
            turn_tolerance: (&c.turn).into(),
            spacing_gains: (&c.spacing).into(),
            spacing_tolerance: (&c.spacing).into(),
            standoff_m: c.standoff_m,
            max_turn: c.max_turn.abs(),
            max_forward: c.max_forward.abs(),
            turn_polarity: c.turn_polarity,
            forward_polarity: c.forward_polarity,
            settle_s: c.settle_s,
            turn_timeout_s: c.turn_timeout_s,
            chain_spacing: c.chain_spacing,
            latency_compensation: c.latency_compensation,
            track_target: c.track_target,
        }
    }
}

// ── ArmCfg ───────────────────────────────────────────────────────────────────

impl From<&robo_config::ArmCfg> for ArmCfg {
    fn from(c: &robo_config::ArmCfg) -> Self {
        Self {
            left: EncoderCal {
                offset: c.left_offset,
                inverted: c.left_inverted,
            },
            right: EncoderCal {
                offset: c.right_offset,
                inverted: c.right_inverted,
            },
            disagreement_tolerance: c.disagreement_tolerance,
            retracted: c.retracted,
            deployed: c.deployed,
            lower_limit: c.lower_limit,
            upper_limit: c.upper_limit,
            joint_gains: (&c.joint).into(),
            joint_tolerance: (&c.joint).into(),
            max_joint_duty: c.max_joint_duty.abs(),
            joint_inverted: c.joint_inverted,
            intake_speed: c.intake_speed,
            eject_speed: c.eject_speed,
        }
    }
}

// ── ShooterCfg ───────────────────────────────────────────────────────────────

impl From<&robo_config::ShooterCfg> for ShooterCfg {
    fn from(c: &robo_config::ShooterCfg) -> Self {
        Self {
            wheel_intake_speed: c.wheel_intake_speed,
            wheel_shoot_speed: c.wheel_shoot_speed,
            wheel_eject_speed: c.wheel_eject_speed,
            feed_in_speed: c.feed_in_speed,
            feed_out_speed: c.feed_out_speed,
            feed_s: c.feed_s,
            shoot_s: c.shoot_s,
            backoff_s: c.backoff_s,
            note_debounce_ticks: c.note_debounce_ticks,
        }
    }
}

// ── ClimberCfg ───────────────────────────────────────────────────────────────

impl From<&robo_config::ClimberCfg> for ClimberCfg {
    fn from(c: &robo_config::ClimberCfg) -> Self {
        Self {
            speed: c.speed,
            left_inverted: c.left_inverted,
            right_inverted: c.right_inverted,
        }
    }
}

// ── RobotCfg ─────────────────────────────────────────────────────────────────

impl From<&robo_config::Config> for RobotCfg {
    fn from(c: &robo_config::Config) -> Self {
        Self {
            tick: (&c.tick).into(),
            vision: (&c.vision).into(),
            alignment: (&c.alignment).into(),
            arm: (&c.arm).into(),
            shooter: (&c.shooter).into(),
            climber: (&c.climber).into(),
        }
    }
}
