//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "robocore", version, about = "Robot control core, closed around a simulated robot")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/robot.toml")]
    pub config: PathBuf,

    /// Log and report as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Scripted operator input for a simulated run.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Scenario {
    /// No requests; the arm settles and everything holds still
    Idle,
    /// Align to the tag once, then wait
    Align,
    /// Deploy the arm and intake until the shooter holds a note
    Intake,
    /// Intake a note, then shoot it
    Shoot,
    /// Extend both climbers, then pull them back in
    Climb,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop against the simulated robot
    Run {
        /// Operator script to play
        #[arg(long, value_enum, default_value = "idle")]
        scenario: Scenario,
        /// Stop after this many ticks
        #[arg(long, value_name = "N", default_value_t = 500)]
        ticks: u64,
        /// Field bearing of the tag in degrees, clockwise positive
        #[arg(long, value_name = "DEG", default_value_t = 20.0, allow_hyphen_values = true)]
        tag_bearing: f64,
        /// Pace ticks in wall-clock time instead of running as fast as possible
        #[arg(long, action = ArgAction::SetTrue)]
        realtime: bool,
        /// Print one line per tick
        #[arg(long, action = ArgAction::SetTrue)]
        trace_ticks: bool,
    },
    /// Build the robot against simulated hardware and run a single tick
    SelfCheck,
    /// Health check for operational monitoring
    Health,
}
