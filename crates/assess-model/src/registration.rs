//! Committed student registrations.

use serde::{Deserialize, Serialize};

use crate::codes::CourseStatus;
use crate::ids::{AssessmentId, Pen, RegistrationId, SchoolId, SessionId, StudentId};

/// A student's registration for one assessment in one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRegistration {
    pub id: RegistrationId,
    pub student_id: StudentId,
    pub pen: Pen,
    pub assessment_id: AssessmentId,
    pub assessment_type: String,
    pub session_id: SessionId,
    #[serde(default)]
    pub school_of_record_id: Option<SchoolId>,
    #[serde(default)]
    pub assessment_centre_id: Option<SchoolId>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    pub course_status: CourseStatus,
    #[serde(default)]
    pub proficiency_score: Option<u8>,
    #[serde(default)]
    pub irt_score: Option<f64>,
    #[serde(default)]
    pub special_case: Option<String>,
    #[serde(default)]
    pub adapted_assessment: Option<String>,
}

impl StudentRegistration {
    /// A completed attempt has a proficiency score or a special-case code.
    pub fn has_written(&self) -> bool {
        self.proficiency_score.is_some() || self.special_case.is_some()
    }
}

/// A change to the committed registration store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationChange {
    Created(StudentRegistration),
    Updated(StudentRegistration),
    Deleted(StudentRegistration),
}

impl RegistrationChange {
    pub fn registration(&self) -> &StudentRegistration {
        match self {
            Self::Created(reg) | Self::Updated(reg) | Self::Deleted(reg) => reg,
        }
    }
}
