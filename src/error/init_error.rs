use thiserror::Error;

/// Behavior installation errors
#[derive(Debug, Clone, Error)]
pub enum BehaviorError {
    #[error("Missing element: {0}")]
    MissingElement(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Time error: {0}")]
    TimeError(String),
}

/// Page initialization errors
#[derive(Debug, Clone, Error)]
pub enum InitError {
    #[error("Behavior '{name}' failed: {source}")]
    Behavior {
        name: String,
        #[source]
        source: BehaviorError,
    },
}
