//! Error types for loading dashboard data
//!
//! The aggregation engine itself never fails. Errors only come from the
//! data source and the configuration file, and are classified by
//! recoverability:
//! - Retryable: the backend was unavailable, transient IO
//! - NonRetryable: missing files, malformed JSON
//! - RequiresUserAction: configuration that has to be fixed by hand

use std::path::PathBuf;
use thiserror::Error;

/// Failure while fetching or normalizing a record collection.
#[derive(Debug, Error)]
pub enum SourceError {
    // Retryable errors
    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(String),

    // Non-retryable errors
    #[error("Data file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    // Requires user action
    #[error("Data directory not configured")]
    DataDirMissing,
}

impl SourceError {
    /// Returns true if fetching again may succeed without any change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Unavailable(_) | SourceError::Io(_))
    }

    /// Returns true if the user has to fix something before retrying.
    pub fn requires_user_action(&self) -> bool {
        matches!(self, SourceError::DataDirMissing)
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SourceError::Unavailable(_) => "The data source did not answer. Try again.",
            SourceError::Io(_) => "Check file permissions and try again.",
            SourceError::NotFound(_) => "Export the missing collection into the data directory.",
            SourceError::Parse { .. } => "Check the exported JSON matches the expected format.",
            SourceError::DataDirMissing => "Set \"dataDir\" in ~/.govdash/config.json",
        }
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err.to_string())
    }
}

/// Failure while loading `config.json`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not find home directory")]
    HomeDirMissing,

    #[error("Failed to read config {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Serializable error representation for the presentation layer
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadError {
    pub message: String,
    pub error_type: ErrorType,
    pub can_retry: bool,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    Retryable,
    NonRetryable,
    RequiresUserAction,
}

impl From<&SourceError> for LoadError {
    fn from(err: &SourceError) -> Self {
        let error_type = if err.requires_user_action() {
            ErrorType::RequiresUserAction
        } else if err.is_retryable() {
            ErrorType::Retryable
        } else {
            ErrorType::NonRetryable
        };

        LoadError {
            message: err.to_string(),
            error_type,
            can_retry: err.is_retryable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}
