//! Reference data read from a JSON file.
//!
//! Stands in for the school directory and the student registry when the
//! pipeline runs from the command line.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use assess_core::{LookupError, ReferenceData, StudentRegistry};
use assess_model::{GradRecord, Pen, School, SchoolId, Session, Student, StudentId};

/// Contents of a `reference.json` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceFile {
    pub sessions: Vec<Session>,
    pub schools: Vec<School>,
    pub students: Vec<Student>,
    pub grad_records: Vec<GradRecord>,
}

impl ReferenceFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("read reference data {}", path.display()))?;
        let reference: Self = serde_json::from_str(&content)
            .with_context(|| format!("parse reference data {}", path.display()))?;
        tracing::debug!(
            sessions = reference.sessions.len(),
            schools = reference.schools.len(),
            students = reference.students.len(),
            "loaded reference data"
        );
        Ok(reference)
    }
}

impl ReferenceData for ReferenceFile {
    fn school_by_id(&self, id: &SchoolId) -> Result<Option<School>, LookupError> {
        Ok(self.schools.iter().find(|school| &school.id == id).cloned())
    }

    fn school_by_mincode(&self, mincode: &str) -> Result<Option<School>, LookupError> {
        Ok(self
            .schools
            .iter()
            .find(|school| school.mincode == mincode)
            .cloned())
    }
}

impl StudentRegistry for ReferenceFile {
    fn student_by_pen(&self, pen: &Pen) -> Result<Option<Student>, LookupError> {
        Ok(self.students.iter().find(|student| &student.pen == pen).cloned())
    }

    fn students_by_ids(&self, ids: &[StudentId]) -> Result<Vec<Student>, LookupError> {
        Ok(self
            .students
            .iter()
            .filter(|student| ids.contains(&student.id))
            .cloned()
            .collect())
    }

    fn grad_record(&self, student: &StudentId) -> Result<Option<GradRecord>, LookupError> {
        Ok(self
            .grad_records
            .iter()
            .find(|record| &record.student_id == student)
            .cloned())
    }
}
