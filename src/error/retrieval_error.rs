use std::time::Duration;

use thiserror::Error;

/// Retrieval errors. Every variant names the source it was raised for.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("HTTP error! status: {status} ({source_url})")]
    Status { source_url: String, status: u16 },
    #[error("Transport error for {source_url}: {message}")]
    Transport { source_url: String, message: String },
    #[error("Timeout: {source_url} did not respond within {after:?}")]
    Timeout { source_url: String, after: Duration },
    #[error("Invalid source {source_url}: {reason}")]
    InvalidSource { source_url: String, reason: String },
}

impl RetrievalError {
    pub fn source_url(&self) -> &str {
        match self {
            RetrievalError::Status { source_url, .. }
            | RetrievalError::Transport { source_url, .. }
            | RetrievalError::Timeout { source_url, .. }
            | RetrievalError::InvalidSource { source_url, .. } => source_url,
        }
    }

    /// Status code of a non-success response, if that is what failed.
    pub fn status(&self) -> Option<u16> {
        match self {
            RetrievalError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
