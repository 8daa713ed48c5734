//! Error types for the homework calendar.

use thiserror::Error;

/// Errors that can occur in homework operations.
#[derive(Error, Debug)]
pub enum HomeworkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("No homework with uid {0}")]
    NotFound(u128),
}

/// Result type alias for homework operations.
pub type HomeworkResult<T> = Result<T, HomeworkError>;
