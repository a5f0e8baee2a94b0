use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// A caller asked for an actuator command outside `[-1, 1]`.
    #[error("invalid command: {name} = {value} is outside [-1, 1]")]
    InvalidCommand { name: &'static str, value: f64 },
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing drive hardware")]
    MissingDrive,
    #[error("missing arm hardware")]
    MissingArm,
    #[error("missing shooter hardware")]
    MissingShooter,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
