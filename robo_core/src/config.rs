//! Runtime configuration for the control core.
//!
//! These structs are what the controllers hold. They are separate from the
//! TOML schema in `robo_config`; see `conversions` for the mapping. Every
//! default is the value the robot was tuned with, including the ones whose
//! sign looked inconsistent across revisions (offsets, polarities, heading
//! sign), so they can be recalibrated without code changes.

use crate::pid::{PidGains, Tolerance};

/// Tick timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickCfg {
    pub rate_hz: u32,
}

impl Default for TickCfg {
    fn default() -> Self {
        Self { rate_hz: 50 }
    }
}

/// Vision fusion settings.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionCfg {
    /// Median window and staleness debounce, in ticks.
    pub filter_window: usize,
    /// Tag ids worth tracking; empty accepts every id.
    pub sought_ids: Vec<i32>,
    /// Robot-center to camera vector, meters (forward, lateral).
    pub mount_x: f64,
    pub mount_y: f64,
    /// Multiplier applied to `atan2` so a positive heading means turn clockwise.
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

/// Align-to-target settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentCfg {
    pub turn_gains: PidGains,
    /// Degrees and degrees per second.
    pub turn_tolerance: Tolerance,
    pub spacing_gains: PidGains,
    /// Meters.
    pub spacing_tolerance: Tolerance,
    /// Desired forward distance to the tag, meters.
    pub standoff_m: f64,
    pub max_turn: f64,
    pub max_forward: f64,
    /// Sign from PID output to turn command.
    pub turn_polarity: f64,
    /// Sign from PID output to forward command.
    pub forward_polarity: f64,
    pub settle_s: f64,
    pub turn_timeout_s: f64,
    /// Continue from `turning` into `spacing` instead of settling.
    pub chain_spacing: bool,
    /// Subtract `latency * gyro rate` from the captured heading.
    pub latency_compensation: bool,
    /// Refresh the heading setpoint from vision while turning.
    pub track_target: bool,
}

impl Default for AlignmentCfg {
    fn default() -> Self {
        Self {
            turn_gains: PidGains::new(0.025, 0.0, 0.003),
            turn_tolerance: Tolerance {
                position: 5.0,
                velocity: 0.1,
            },
            spacing_gains: PidGains::new(2.0, 0.0, 0.0),
            spacing_tolerance: Tolerance::position(0.1),
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

/// Calibration of one absolute encoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderCal {
    /// Raw reading at arm position 0.
    pub offset: f64,
    pub inverted: bool,
}

/// Arm joint, estimator and belt settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmCfg {
    pub left: EncoderCal,
    pub right: EncoderCal,
    /// Largest cyclic distance at which the two encoders still agree.
    pub disagreement_tolerance: f64,
    pub retracted: f64,
    pub deployed: f64,
    /// Ends of the operating arc; the arm never belongs outside it.
    pub lower_limit: f64,
    pub upper_limit: f64,
    pub joint_gains: PidGains,
    pub joint_tolerance: Tolerance,
    pub max_joint_duty: f64,
    pub joint_inverted: bool,
    pub intake_speed: f64,
    pub eject_speed: f64,
}

impl Default for ArmCfg {
    fn default() -> Self {
        Self {
            left: EncoderCal {
                offset: 0.886,
                inverted: false,
            },
            right: EncoderCal {
                offset: 0.359,
                inverted: false,
            },
            disagreement_tolerance: 0.05,
            retracted: 0.05,
            deployed: 0.40,
            lower_limit: 0.02,
            upper_limit: 0.43,
            joint_gains: PidGains::new(4.0, 0.0, 0.0),
            joint_tolerance: Tolerance::position(0.01),
            max_joint_duty: 0.6,
            joint_inverted: false,
            intake_speed: 0.5,
            eject_speed: -0.5,
        }
    }
}

/// Shooter wheel and feed settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShooterCfg {
    pub wheel_intake_speed: f64,
    pub wheel_shoot_speed: f64,
    pub wheel_eject_speed: f64,
    pub feed_in_speed: f64,
    pub feed_out_speed: f64,
    /// Spin-up phase before the note is fed.
    pub feed_s: f64,
    /// Feed phase pushing the note through the wheels.
    pub shoot_s: f64,
    /// Leading part of `feed_s` during which the feed backs the note off.
    pub backoff_s: f64,
    /// Consecutive ticks the arm must report a note before holding.
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

/// Climber winch settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimberCfg {
    /// Duty magnitude while extending or contracting.
    pub speed: f64,
    pub left_inverted: bool,
    /// The right winch is mirrored: positive duty contracts it.
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

/// Everything the robot needs, bundled for the builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotCfg {
    pub tick: TickCfg,
    pub vision: VisionCfg,
    pub alignment: AlignmentCfg,
    pub arm: ArmCfg,
    pub shooter: ShooterCfg,
    pub climber: ClimberCfg,
}
