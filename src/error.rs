//! Error types for weekdo
//!
//! Exit codes:
//! - 0: Success
//! - 2: Rejected input (validation, bad config, unknown ids)
//! - 4: Storage operation failed

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the weekdo CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const STORAGE_FAILED: i32 = 4;
}

/// Main error type for weekdo operations
#[derive(Error, Debug)]
pub enum Error {
    // Validation (exit code 2)
    #[error("Task title cannot be empty")]
    EmptyTitle,

    #[error("Select a category for the task")]
    MissingCategory,

    #[error("Select a user for the task")]
    MissingAssignee,

    #[error("Select a weekday and time for the task")]
    MissingSchedule,

    #[error("A task holds between 1 and {limit} categories, got {count}")]
    CategoryLimit { limit: usize, count: usize },

    #[error("Invalid deadline: {0}")]
    InvalidDeadline(String),

    #[error("Deadline ends at {end} which is not after its start {start}")]
    DeadlineOrder { start: String, end: String },

    #[error("Task not found: {0}")]
    TaskNotFound(u64),

    #[error("User not found: {0}")]
    UserNotFound(u64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Storage failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Storage operation failed: {0}")]
    Storage(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        if self.is_validation() {
            exit_codes::VALIDATION
        } else {
            exit_codes::STORAGE_FAILED
        }
    }

    /// True for errors the user can fix by changing the input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::EmptyTitle
                | Error::MissingCategory
                | Error::MissingAssignee
                | Error::MissingSchedule
                | Error::CategoryLimit { .. }
                | Error::InvalidDeadline(_)
                | Error::DeadlineOrder { .. }
                | Error::TaskNotFound(_)
                | Error::UserNotFound(_)
                | Error::InvalidArgument(_)
                | Error::InvalidConfig(_)
                | Error::TomlParse(_)
        )
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Storage(format!("store worker stopped: {err}"))
    }
}

/// Result type alias for weekdo operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_validation_code() {
        assert_eq!(Error::EmptyTitle.exit_code(), exit_codes::VALIDATION);
        assert_eq!(
            Error::CategoryLimit { limit: 3, count: 4 }.exit_code(),
            exit_codes::VALIDATION
        );
        assert_eq!(Error::TaskNotFound(7).exit_code(), exit_codes::VALIDATION);
    }

    #[test]
    fn storage_errors_map_to_storage_code() {
        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(io.exit_code(), exit_codes::STORAGE_FAILED);
        assert!(!Error::LockFailed(PathBuf::from("tasks.lock")).is_validation());
    }

    #[test]
    fn category_limit_message_names_both_counts() {
        let err = Error::CategoryLimit { limit: 3, count: 0 };
        assert_eq!(
            err.to_string(),
            "A task holds between 1 and 3 categories, got 0"
        );
    }
}
