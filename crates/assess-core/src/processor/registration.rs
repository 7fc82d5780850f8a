//! Registration files: each row is a candidate for the rule engine.
//!
//! Accepted rows become registration changes that are committed together
//! once the whole file has been read. Later rows see the changes of earlier
//! ones.

use std::collections::{BTreeMap, HashMap, HashSet};

use assess_model::messages::{self, fill_template};
use assess_model::{
    CourseStatus, FieldCode, FileCategory, IssueCode, RegistrationChange, RegistrationId,
    RegistrationRecord, School, Student, StudentId, StudentRegistration, ValidationIssue,
};
use assess_validate::{
    RegistrationCandidate, StudentRuleData, check_headers, registration_required_headers,
    validate_and_extract,
};

use super::{
    BatchProcessor, FileContext, file_rejection, parse_issue, row_rejections,
    school_lookup_issue,
};
use crate::error::{LookupError, Result};
use crate::events::{EventType, RegistrationEvent};
use crate::identity::IdentityResolver;
use crate::report::{BatchSummary, ChangeCounts, ProcessOutcome};

enum RowDecision {
    Change(RegistrationChange),
    NoChange,
    Rejected(Vec<ValidationIssue>),
}

/// Changes accumulated while reading one file.
#[derive(Default)]
struct PendingChanges {
    changes: Vec<RegistrationChange>,
    touched: HashSet<RegistrationId>,
}

impl PendingChanges {
    fn push(&mut self, change: RegistrationChange) {
        self.touched.insert(change.registration().id.clone());
        self.changes.push(change);
    }

    /// Committed registrations of `student` with pending changes applied.
    fn overlay(
        &self,
        mut registrations: Vec<StudentRegistration>,
        student: &StudentId,
    ) -> Vec<StudentRegistration> {
        for change in &self.changes {
            let reg = change.registration();
            if &reg.student_id != student {
                continue;
            }
            registrations.retain(|existing| existing.id != reg.id);
            if !matches!(change, RegistrationChange::Deleted(_)) {
                registrations.push(reg.clone());
            }
        }
        registrations
    }
}

impl BatchProcessor {
    pub(crate) fn process_registrations(&self, ctx: &FileContext<'_>) -> Result<ProcessOutcome> {
        let file_name = ctx.file.file_name.as_str();
        let table = ctx.table;

        if let Err(e) = check_headers(table, &registration_required_headers()) {
            return Ok(file_rejection(file_name, e));
        }

        let mut rejected: BTreeMap<usize, Vec<ValidationIssue>> = BTreeMap::new();
        for error in table.blocking_errors() {
            rejected
                .entry(error.row_index)
                .or_default()
                .push(parse_issue(error));
        }

        let resolver = self.resolver();
        let mut schools = HashMap::new();
        let mut pending = PendingChanges::default();
        let mut accepted_rows = 0;

        for row in &table.rows {
            let record = match validate_and_extract::<RegistrationRecord>(row, &()) {
                Ok(record) => record,
                Err(issues) => {
                    rejected.insert(row.index, issues);
                    continue;
                }
            };
            match self.decide(ctx, &resolver, &mut schools, &pending, record)? {
                RowDecision::Change(change) => {
                    accepted_rows += 1;
                    pending.push(change);
                }
                RowDecision::NoChange => accepted_rows += 1,
                RowDecision::Rejected(issues) => {
                    tracing::warn!(line = row.index, issues = issues.len(), "registration row rejected");
                    rejected.insert(row.index, issues);
                }
            }
        }

        self.store().apply_registration_changes(&pending.changes)?;
        let changes = ChangeCounts::from_changes(&pending.changes);
        tracing::info!(
            created = changes.created,
            updated = changes.updated,
            deleted = changes.deleted,
            "registration changes committed"
        );
        for change in &pending.changes {
            self.events().publish(RegistrationEvent::from_change(
                EventType::StudentRegistration,
                change,
            ));
        }

        Ok(ProcessOutcome::Committed(BatchSummary {
            file_name: file_name.to_string(),
            category: FileCategory::Registration,
            key: ctx.validated.key.clone(),
            total_rows: table.total_rows,
            accepted_rows,
            rejected_rows: row_rejections(rejected),
            reporting_school: None,
            changes,
        }))
    }

    fn decide(
        &self,
        ctx: &FileContext<'_>,
        resolver: &IdentityResolver<'_>,
        schools: &mut HashMap<String, Option<School>>,
        pending: &PendingChanges,
        record: RegistrationRecord,
    ) -> Result<RowDecision> {
        let resolution = resolver.resolve(&record.pen);
        if resolution.is_retryable() {
            return Ok(RowDecision::Rejected(
                resolution.issue(&record.pen).into_iter().collect(),
            ));
        }
        let student = resolution.student().cloned();

        let school_of_record = match self.school_of_record(schools, &record, student.as_ref()) {
            Ok(school) => school,
            Err(issue) => return Ok(RowDecision::Rejected(vec![issue])),
        };
        let assessment_centre = match record.assessment_centre.as_deref() {
            Some(mincode) => match self.school_for_mincode(schools, mincode) {
                Ok(school) => school,
                Err(_) => {
                    return Ok(RowDecision::Rejected(vec![school_lookup_issue(
                        FieldCode::AssessmentCentre,
                        mincode,
                    )]));
                }
            },
            None => None,
        };

        let assessment = &ctx.validated.assessment;
        let registrations = match &student {
            Some(student) => {
                pending.overlay(self.store().registrations_for_student(&student.id)?, &student.id)
            }
            None => Vec::new(),
        };
        let existing = registrations
            .iter()
            .find(|reg| reg.assessment_id == assessment.id && reg.session_id == ctx.session.id)
            .cloned();
        let registration_id = existing
            .as_ref()
            .filter(|reg| !pending.touched.contains(&reg.id))
            .map(|reg| reg.id.clone());

        let data = StudentRuleData {
            candidate: RegistrationCandidate {
                record,
                session_id: ctx.session.id.clone(),
                assessment_type: ctx.validated.name.assessment_type.clone(),
                registration_id,
            },
            student,
            school_of_record,
            assessment_centre,
            assessment: Some(assessment.clone()),
            registrations,
            today: self.today,
        };
        let report = self.rules.run(&data);
        if !report.is_accepted() {
            return Ok(RowDecision::Rejected(report.issues));
        }

        let StudentRuleData {
            candidate,
            student,
            school_of_record,
            assessment_centre,
            ..
        } = data;
        let Some(student) = student else {
            return Ok(RowDecision::Rejected(
                resolution.issue(&candidate.record.pen).into_iter().collect(),
            ));
        };
        let record = candidate.record;

        if record.course_status == CourseStatus::Withdrawn {
            return Ok(match existing {
                Some(reg) => RowDecision::Change(RegistrationChange::Deleted(reg)),
                None => RowDecision::NoChange,
            });
        }

        let (base, is_update) = match existing {
            Some(reg) => (reg, true),
            None => {
                let fresh = StudentRegistration {
                    id: RegistrationId::derive(&ctx.session.id, &assessment.id, &student.id),
                    student_id: student.id.clone(),
                    pen: student.pen.clone(),
                    assessment_id: assessment.id.clone(),
                    assessment_type: ctx.validated.name.assessment_type.clone(),
                    session_id: ctx.session.id.clone(),
                    school_of_record_id: None,
                    assessment_centre_id: None,
                    surname: None,
                    given_name: None,
                    course_status: CourseStatus::Active,
                    proficiency_score: None,
                    irt_score: None,
                    special_case: None,
                    adapted_assessment: None,
                };
                (fresh, false)
            }
        };
        let registration = StudentRegistration {
            school_of_record_id: school_of_record.map(|school| school.id),
            assessment_centre_id: assessment_centre.map(|school| school.id),
            surname: record.surname,
            given_name: record.given_name,
            course_status: CourseStatus::Active,
            ..base
        };
        Ok(RowDecision::Change(if is_update {
            RegistrationChange::Updated(registration)
        } else {
            RegistrationChange::Created(registration)
        }))
    }

    /// The submitted school of record, or the student's graduation-record
    /// school when the cell is blank.
    fn school_of_record(
        &self,
        schools: &mut HashMap<String, Option<School>>,
        record: &RegistrationRecord,
        student: Option<&Student>,
    ) -> std::result::Result<Option<School>, ValidationIssue> {
        if !record.school_of_record.is_empty() {
            return self
                .school_for_mincode(schools, &record.school_of_record)
                .map_err(|_| school_lookup_issue(FieldCode::SchoolOfRecord, &record.school_of_record));
        }
        let Some(student) = student else {
            return Ok(None);
        };
        self.grad_record_school(&student.id).map_err(|e| {
            tracing::warn!(error = %e, "graduation record lookup failed");
            ValidationIssue::error(
                FieldCode::SchoolOfRecord,
                IssueCode::LookupUnavailable,
                fill_template(messages::LOOKUP_UNAVAILABLE, &[&record.pen]),
            )
            .with_rejected_value(record.pen.as_str())
        })
    }

    fn grad_record_school(
        &self,
        student: &StudentId,
    ) -> std::result::Result<Option<School>, LookupError> {
        let Some(grad) = self.students().grad_record(student)? else {
            return Ok(None);
        };
        match grad.school_of_record_id {
            Some(id) => self.reference().school_by_id(&id),
            None => Ok(None),
        }
    }
}
