//! Fetch-related error types

use thiserror::Error;

/// Errors surfaced to callers of the fetch orchestrator.
///
/// Storage-medium failures never appear here; they are absorbed inside the
/// cache layer. The only caller-visible failure is the wrapped producer's.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("producer failed: {message}")]
    Producer { message: String },
}

impl FetchError {
    pub fn producer(error: impl std::fmt::Display) -> Self {
        Self::Producer {
            message: error.to_string(),
        }
    }
}

/// Re-export commonly used Result type
pub type Result<T> = std::result::Result<T, FetchError>;
