//! Outcome of processing one file.

use serde::Serialize;

use assess_model::{FileCategory, FileKey, RegistrationChange, ValidationIssue};

/// Why a whole file was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionKind {
    /// Data-quality failure; resubmit a corrected file.
    Validation,
    /// Another file for the same key is in flight; retry later.
    Conflict,
}

/// A whole-file rejection. Errors are always a list, even when there is one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionReport {
    pub file_name: String,
    pub kind: RejectionKind,
    pub errors: Vec<ValidationIssue>,
}

impl RejectionReport {
    pub fn validation(file_name: impl Into<String>, issue: ValidationIssue) -> Self {
        Self {
            file_name: file_name.into(),
            kind: RejectionKind::Validation,
            errors: vec![issue],
        }
    }

    pub fn conflict(file_name: impl Into<String>, issue: ValidationIssue) -> Self {
        Self {
            file_name: file_name.into(),
            kind: RejectionKind::Conflict,
            errors: vec![issue],
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == RejectionKind::Conflict
    }
}

/// A row skipped while the rest of its file went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRejection {
    /// 1-based data-row index.
    pub line: usize,
    pub issues: Vec<ValidationIssue>,
}

/// Registration changes committed by one file or promotion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCounts {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl ChangeCounts {
    pub fn from_changes(changes: &[RegistrationChange]) -> Self {
        let mut counts = Self::default();
        counts.add(changes);
        counts
    }

    pub fn add(&mut self, changes: &[RegistrationChange]) {
        for change in changes {
            match change {
                RegistrationChange::Created(_) => self.created += 1,
                RegistrationChange::Updated(_) => self.updated += 1,
                RegistrationChange::Deleted(_) => self.deleted += 1,
            }
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

/// A file whose accepted rows were committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub file_name: String,
    pub category: FileCategory,
    pub key: FileKey,
    /// Data rows seen by the decoder, good or bad.
    pub total_rows: usize,
    /// Rows staged (results), stored (keys) or accepted (registrations).
    pub accepted_rows: usize,
    pub rejected_rows: Vec<RowRejection>,
    /// Mincode of the first data row of a result file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporting_school: Option<String>,
    pub changes: ChangeCounts,
}

impl BatchSummary {
    pub fn rejected_count(&self) -> usize {
        self.rejected_rows.len()
    }
}

/// What `process_file` hands back for expected outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessOutcome {
    Committed(BatchSummary),
    Rejected(RejectionReport),
}

impl ProcessOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    pub fn summary(&self) -> Option<&BatchSummary> {
        match self {
            Self::Committed(summary) => Some(summary),
            Self::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&RejectionReport> {
        match self {
            Self::Committed(_) => None,
            Self::Rejected(report) => Some(report),
        }
    }
}

/// Result of one promotion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionSummary {
    pub claimed: usize,
    pub completed: usize,
    pub failed: usize,
    /// Registrations moved off merged-from PENs.
    pub transferred: usize,
    pub changes: ChangeCounts,
}
