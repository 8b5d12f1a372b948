//! Error types shared across Waypoint crates.

use thiserror::Error;

/// The main error type for Waypoint operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The query was killed while it was running.
    #[error("query killed")]
    Killed,

    /// The execution plan is malformed.
    #[error("invalid plan: {0}")]
    Plan(String),

    /// Query execution failed.
    #[error("execution error: {0}")]
    Execution(String),

    /// A graph could not be loaded.
    #[error("graph load error: {0}")]
    Load(String),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed JSON input.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if this error reports a killed query.
    #[must_use]
    pub fn is_killed(&self) -> bool {
        matches!(self, Error::Killed)
    }
}

/// Result type alias for Waypoint operations.
pub type Result<T> = std::result::Result<T, Error>;
