//! Staged result rows awaiting promotion.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codes::StagedStatus;
use crate::ids::{AssessmentId, Pen, RowId, SessionId, StudentId};
use crate::records::ResultRecord;

/// Logical-mutex key: one assessment type within one session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileKey {
    pub session_id: SessionId,
    pub assessment_type: String,
}

impl FileKey {
    pub fn new(session_id: SessionId, assessment_type: impl Into<String>) -> Self {
        Self {
            session_id,
            assessment_type: assessment_type.into().to_ascii_uppercase(),
        }
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.session_id, self.assessment_type)
    }
}

/// A result row bound to a resolved student and an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedResult {
    pub id: RowId,
    pub key: FileKey,
    pub assessment_id: AssessmentId,
    pub student_id: StudentId,
    /// PEN as submitted in the file, before merge resolution.
    pub submitted_pen: Pen,
    /// PEN of the resolved (active) student.
    pub resolved_pen: Pen,
    pub line: usize,
    pub status: StagedStatus,
    pub record: ResultRecord,
}
