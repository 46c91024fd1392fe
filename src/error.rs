use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitemporalError {
    /// The version handed to a transition is not in a state that allows it.
    #[error("Invalid state: {0}")]
    InvalidState(String),
    /// A time argument would break the ordering of the history.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Not found: {0}")]
    NotFound(String),
    /// More than one live version for a business key. Never retried.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
    /// The live version a transition was derived from is no longer live.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, BitemporalError>;

// Helper conversions
impl From<config::ConfigError> for BitemporalError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
