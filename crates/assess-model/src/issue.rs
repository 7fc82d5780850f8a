//! Validation issue type shared by every validation stage.

use serde::{Deserialize, Serialize};

use crate::codes::{FieldCode, IssueCode, Severity};

/// A single field-level problem: field, issue type, rendered message.
///
/// The same shape is used for row-validator field errors, rule-engine issues
/// and file-level rejections so callers can render them uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub field: FieldCode,
    pub code: IssueCode,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_value: Option<String>,
}

/// Field errors produced by the row validator are validation issues.
pub type FieldError = ValidationIssue;

impl ValidationIssue {
    /// Create an error-severity issue.
    pub fn error(field: FieldCode, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
            severity: Severity::Error,
            rejected_value: None,
        }
    }

    /// Create a warning-severity issue.
    pub fn warning(field: FieldCode, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(field, code, message)
        }
    }

    /// Echo the rejected value back to the caller.
    #[must_use]
    pub fn with_rejected_value(mut self, value: impl Into<String>) -> Self {
        self.rejected_value = Some(value.into());
        self
    }

    /// Prefix the message with a 1-based line number.
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.message = crate::messages::fill_template(
            crate::messages::LINE_PREFIX,
            &[&line, &self.message],
        );
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
