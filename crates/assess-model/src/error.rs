//! Error types for model construction.

use thiserror::Error;

/// Errors raised when a model value cannot be constructed from raw input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// PEN is not nine ASCII digits.
    #[error("invalid PEN '{0}': expected 9 digits")]
    InvalidPen(String),

    /// Identifier is blank.
    #[error("invalid {kind} identifier '{value}'")]
    InvalidId { kind: &'static str, value: String },

    /// Code is not a member of its closed enumeration.
    #[error("unknown {kind} code '{value}'")]
    UnknownCode { kind: &'static str, value: String },
}

/// Result type for model construction.
pub type Result<T> = std::result::Result<T, ModelError>;
