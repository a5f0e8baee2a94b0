#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Robot control core (hardware-agnostic).
//!
//! All hardware goes through the capability traits in `robo_traits`. The core
//! runs one cooperative tick at a time: requests are taken, sensors are fused,
//! then the state machines advance, each reading only what its collaborators
//! published on the previous tick.
//!
//! ## Architecture
//!
//! - **Math**: cyclic arithmetic over one rotation (`cyclic`), PID (`pid`),
//!   median filtering (`filter`)
//! - **Sensing**: `VisionTracker` (camera fusion with staleness) and
//!   `ArmPositionEstimator` (dual encoder fusion with fault detection)
//! - **Machines**: `AlignmentController`, `ArmController`, `ShooterController`
//!   built on `machine::Machine` and level-triggered requests (`trigger`),
//!   plus the optional two-winch `ClimberController`
//! - **Assembly**: `Robot` with its two-phase tick, the type-state
//!   `RobotBuilder`, and the fixed-rate `runner`
//!
//! Sensor faults are reported in each `TickReport`; they degrade behaviour
//! (arm disabled, alignment aborted) instead of surfacing as errors.

pub mod alignment;
pub mod arm;
pub mod arm_position;
pub mod builder;
pub mod climber;
pub mod config;
pub mod conversions;
pub mod cyclic;
pub mod error;
pub mod filter;
pub mod hw_error;
pub mod machine;
pub mod pid;
pub mod robot;
pub mod runner;
pub mod shooter;
pub mod status;
pub mod trigger;
pub mod util;
pub mod vision;

pub use alignment::{AlignmentController, AlignmentRequests, AlignmentState};
pub use arm::{ArmController, ArmOutput, ArmRequests, ArmSetpoint, ArmState};
pub use arm_position::{ArmPositionEstimator, ArmReading, LimitSide};
pub use builder::{
    ArmHardware, ClimberHardware, DriveHardware, Missing, RobotBuilder, Set, ShooterHardware,
};
pub use climber::{ClimberController, ClimberOutput, ClimberRequests, WinchMotion};
pub use config::{
    AlignmentCfg, ArmCfg, ClimberCfg, EncoderCal, RobotCfg, ShooterCfg, TickCfg, VisionCfg,
};
pub use error::{BuildError, ControlError, Result};
pub use pid::{PidController, PidGains, Tolerance};
pub use robot::{Intent, Robot};
pub use runner::{RunOptions, RunSummary, StopReason};
pub use shooter::{ShooterController, ShooterOutput, ShooterRequests, ShooterState};
pub use status::{ArmSnapshot, DriveCommand, SensorFault, ShooterSnapshot, TickReport};
pub use vision::{Offset, TargetView, VisionTracker};
