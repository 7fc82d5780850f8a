//! Error types for orchestration, storage and external lookups.

use std::path::PathBuf;

use thiserror::Error;

use assess_ingest::IngestError;
use assess_model::{ModelError, messages};

/// A failed call to an external reference-data or student-registry service.
///
/// Never fatal to a file: the affected row is rejected with a retryable issue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Service refused or failed the call.
    #[error("{service} unavailable: {reason}")]
    NotAvailable {
        service: &'static str,
        reason: String,
    },

    /// Service did not answer within its bounded wait.
    #[error("{service} timed out after {after_ms} ms")]
    Timeout { service: &'static str, after_ms: u64 },
}

impl LookupError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// Errors from the staging and registration store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// A change referred to a registration that does not exist.
    #[error("registration {0} not found")]
    RegistrationNotFound(String),

    /// A create collided with an existing registration id.
    #[error("registration {0} already exists")]
    RegistrationExists(String),

    /// A status update referred to a staged row that does not exist.
    #[error("staged row {0} not found")]
    StagedRowNotFound(String),

    /// Failed to read or write a store snapshot.
    #[error("store snapshot I/O error for {path}: {source}")]
    SnapshotIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot contents are not a valid store.
    #[error("invalid store snapshot {path}: {message}")]
    SnapshotFormat { path: PathBuf, message: String },

    /// Backend refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Fatal pipeline errors.
///
/// Anything here aborts the whole operation. Callers show
/// [`PipelineError::user_message`] and log the error itself.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// A layout template could not be loaded.
    #[error("layout error: {0}")]
    Layout(#[from] IngestError),

    /// Persistence failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A derived value could not be built.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Failed to read the settings file.
    #[error("failed to read settings {path}: {source}")]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid TOML for the settings schema.
    #[error("failed to parse settings {path}: {message}")]
    SettingsParse { path: PathBuf, message: String },
}

impl PipelineError {
    /// Caller-facing text; the detail stays in the logs.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Layout(_)
            | Self::Store(_)
            | Self::Model(_)
            | Self::SettingsRead { .. }
            | Self::SettingsParse { .. } => messages::GENERIC_ERROR,
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_detail() {
        let err = PipelineError::Store(StoreError::Unavailable("disk full".to_string()));
        assert_eq!(err.user_message(), messages::GENERIC_ERROR);
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_layout_error_converts() {
        let err: PipelineError = IngestError::InvalidLayout {
            reason: "no columns".to_string(),
        }
        .into();
        assert!(matches!(err, PipelineError::Layout(_)));
        assert!(!err.user_message().contains("columns"));
    }

    #[test]
    fn test_lookup_error_display() {
        let err = LookupError::Timeout {
            service: "student registry",
            after_ms: 5000,
        };
        assert_eq!(err.to_string(), "student registry timed out after 5000 ms");
        assert!(err.is_retryable());
    }
}
