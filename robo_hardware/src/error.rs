use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("device disconnected: {0}")]
    Disconnected(&'static str),
    #[error("device timeout")]
    Timeout,
    #[error("injected fault: {0}")]
    Injected(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
