//! Reference data owned by external collaborators.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::codes::StudentStatus;
use crate::ids::{AssessmentId, Pen, SchoolId, SessionId, StudentId};

/// An assessment offered within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub type_code: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// An assessment session (one sitting month).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub course_year: u16,
    pub course_month: u8,
    #[serde(default)]
    pub assessments: Vec<Assessment>,
}

impl Session {
    /// `YYYYMM`, as embedded in file names and key rows.
    pub fn token(&self) -> String {
        format!("{:04}{:02}", self.course_year, self.course_month)
    }

    /// Active assessment of the given type, matched case-insensitively.
    pub fn active_assessment(&self, type_code: &str) -> Option<&Assessment> {
        self.assessments
            .iter()
            .find(|a| a.active && a.type_code.eq_ignore_ascii_case(type_code))
    }
}

/// A school or assessment centre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: SchoolId,
    pub mincode: String,
    pub display_name: String,
    #[serde(default)]
    pub reporting_requirement: Option<String>,
    #[serde(default)]
    pub opened_on: Option<NaiveDate>,
    #[serde(default)]
    pub closed_on: Option<NaiveDate>,
}

impl School {
    /// Opened on or before `date` and not closed on or before it.
    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        let opened = self.opened_on.is_none_or(|opened| opened <= date);
        let closed = self.closed_on.is_some_and(|closed| closed <= date);
        opened && !closed
    }
}

/// A student as held by the external student registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub pen: Pen,
    #[serde(default)]
    pub legal_surname: Option<String>,
    #[serde(default)]
    pub legal_given_name: Option<String>,
    pub status: StudentStatus,
    /// Forward pointer for merged students.
    #[serde(default)]
    pub true_student_id: Option<StudentId>,
}

impl Student {
    pub fn is_active(&self) -> bool {
        self.status == StudentStatus::Active
    }

    pub fn merge_link(&self) -> MergeChainLink {
        MergeChainLink {
            from_student_id: self.id.clone(),
            status_code: self.status,
            to_student_id: self.true_student_id.clone(),
        }
    }
}

/// One hop in the historical merge graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeChainLink {
    pub from_student_id: StudentId,
    pub status_code: StudentStatus,
    pub to_student_id: Option<StudentId>,
}

impl MergeChainLink {
    /// Target of this hop when it is a merge with a forward pointer.
    pub fn next(&self) -> Option<&StudentId> {
        match self.status_code {
            StudentStatus::Merged => self.to_student_id.as_ref(),
            _ => None,
        }
    }
}

/// Graduation record used to find a student's school of record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradRecord {
    pub student_id: StudentId,
    #[serde(default)]
    pub school_of_record_id: Option<SchoolId>,
}
