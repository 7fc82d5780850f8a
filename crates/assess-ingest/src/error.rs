//! Error types for tabular decoding.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur before row decoding starts.
///
/// Malformed rows are never errors; they are recorded as
/// [`assess_model::ParseError`]s on the decoded table.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Encoding Errors ===
    /// Payload carries a byte-order mark for an unsupported encoding.
    #[error("unsupported encoding: {encoding}")]
    UnsupportedEncoding { encoding: &'static str },

    // === Layout Errors ===
    /// Failed to read a layout template.
    #[error("failed to read layout {path}: {source}")]
    LayoutRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Layout template is not valid TOML for a layout.
    #[error("failed to parse layout {path}: {message}")]
    LayoutParse { path: PathBuf, message: String },

    /// Layout is structurally unusable.
    #[error("invalid layout: {reason}")]
    InvalidLayout { reason: String },
}

/// Result type for decoding operations.
pub type Result<T> = std::result::Result<T, IngestError>;
