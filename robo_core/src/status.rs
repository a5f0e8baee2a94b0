//! Published state and per-tick feedback.
//!
//! Snapshots are what one machine may read of another: always the value
//! published at the end of the previous tick.

use crate::alignment::AlignmentState;
use crate::arm::ArmState;
use crate::shooter::ShooterState;

/// Degraded sensor conditions. Reported as feedback, never raised as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// Both arm encoders connected but further apart than the tolerance.
    EncoderDisagreement,
    /// Neither arm encoder is connected.
    EncodersDisconnected,
    /// Cameras are attached but none has seen a target within its window.
    VisionStale,
}

impl SensorFault {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EncoderDisagreement => "encoder_disagreement",
            Self::EncodersDisconnected => "encoders_disconnected",
            Self::VisionStale => "vision_stale",
        }
    }
}

impl core::fmt::Display for SensorFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmSnapshot {
    pub state: ArmState,
    pub has_note: bool,
}

impl Default for ArmSnapshot {
    fn default() -> Self {
        Self {
            state: ArmState::Transitioning,
            has_note: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShooterSnapshot {
    pub state: ShooterState,
}

impl ShooterSnapshot {
    pub fn is_running_motors(&self) -> bool {
        self.state.is_running_motors()
    }
}

impl Default for ShooterSnapshot {
    fn default() -> Self {
        Self {
            state: ShooterState::Idle,
        }
    }
}

/// Chassis command issued during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveCommand {
    pub forward: f64,
    pub turn: f64,
}

/// Everything observable about one completed tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub alignment: AlignmentState,
    pub arm: ArmState,
    pub shooter: ShooterState,
    pub drive: DriveCommand,
    pub arm_position: Option<f64>,
    pub has_target: bool,
    pub has_note: bool,
    pub faults: Vec<SensorFault>,
}
