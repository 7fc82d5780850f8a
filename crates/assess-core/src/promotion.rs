//! Promotion of staged result rows into student registrations, and purge.
//!
//! Promotion claims every `LOADED`/`TRANSFER` row for a key in one store
//! call, so a concurrent or repeated run finds nothing left to claim. Each
//! claimed row is then committed on its own: a failing row is marked
//! `ERROR` and the rest carry on.

use thiserror::Error;

use assess_model::{
    CourseStatus, FileKey, RegistrationChange, RegistrationId, SessionId,
    StagedResult, StagedStatus, StudentRegistration,
};

use crate::error::{LookupError, Result, StoreError};
use crate::events::{EventType, RegistrationEvent};
use crate::processor::BatchProcessor;
use crate::report::PromotionSummary;

#[derive(Debug, Error)]
enum RowFailure {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Registration changes for one staged row.
#[derive(Default)]
struct RowPlan {
    changes: Vec<RegistrationChange>,
    transferred: usize,
}

impl BatchProcessor {
    /// Promote every unclaimed staged row for (session, assessment type).
    ///
    /// # Errors
    ///
    /// Fails only when the claim or a status update cannot reach the store.
    pub fn promote(&self, session_id: &SessionId, assessment_type: &str) -> Result<PromotionSummary> {
        let key = FileKey::new(session_id.clone(), assessment_type);
        let span = tracing::info_span!("promote", key = %key);
        let _enter = span.enter();

        let claimed = self.store().claim_staged(&key)?;
        let mut summary = PromotionSummary {
            claimed: claimed.len(),
            ..PromotionSummary::default()
        };
        if claimed.is_empty() {
            tracing::info!("nothing to promote");
            return Ok(summary);
        }

        for row in &claimed {
            let committed = self.plan_row(row).and_then(|plan| {
                self.store().apply_registration_changes(&plan.changes)?;
                Ok(plan)
            });
            match committed {
                Ok(plan) => {
                    self.store()
                        .set_staged_status(&row.id, StagedStatus::Completed)?;
                    summary.completed += 1;
                    summary.transferred += plan.transferred;
                    summary.changes.add(&plan.changes);
                    for change in &plan.changes {
                        self.events().publish(RegistrationEvent::from_change(
                            EventType::ResultPromotion,
                            change,
                        ));
                    }
                }
                Err(e) => {
                    tracing::warn!(line = row.line, error = %e, "promotion of staged row failed");
                    self.store().set_staged_status(&row.id, StagedStatus::Error)?;
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            claimed = summary.claimed,
            completed = summary.completed,
            failed = summary.failed,
            transferred = summary.transferred,
            "promotion finished"
        );
        Ok(summary)
    }

    /// Delete `COMPLETED` staged rows for (session, assessment type).
    pub fn purge_completed(&self, session_id: &SessionId, assessment_type: &str) -> Result<usize> {
        let key = FileKey::new(session_id.clone(), assessment_type);
        let purged = self.store().purge_completed(&key)?;
        tracing::info!(key = %key, purged, "completed staged rows purged");
        Ok(purged)
    }

    fn plan_row(&self, row: &StagedResult) -> std::result::Result<RowPlan, RowFailure> {
        let mut plan = RowPlan::default();
        let mut registrations = self.store().registrations_for_student(&row.student_id)?;

        if row.status == StagedStatus::Transfer || row.submitted_pen != row.resolved_pen {
            for held in self.store().registrations_for_pen(&row.submitted_pen)? {
                if held.student_id == row.student_id {
                    continue;
                }
                plan.transferred += 1;
                let survivor = registrations.iter().any(|reg| {
                    reg.assessment_id == held.assessment_id && reg.session_id == held.session_id
                });
                if survivor {
                    // The true student's own registration absorbs this one.
                    plan.changes.push(RegistrationChange::Deleted(held));
                    continue;
                }
                let moved = StudentRegistration {
                    student_id: row.student_id.clone(),
                    pen: row.resolved_pen.clone(),
                    ..held
                };
                registrations.push(moved.clone());
                plan.changes.push(RegistrationChange::Updated(moved));
            }
        }

        let record = &row.record;
        let existing = registrations.into_iter().find(|reg| {
            reg.assessment_id == row.assessment_id && reg.session_id == row.key.session_id
        });
        match existing {
            Some(reg) => {
                let updated = StudentRegistration {
                    proficiency_score: record.proficiency_score,
                    irt_score: record.irt_score,
                    special_case: record.special_case.clone(),
                    adapted_assessment: record.adapted_assessment.clone(),
                    ..reg
                };
                // A moved registration is updated once, with the scores.
                plan.changes.retain(|change| change.registration().id != updated.id);
                plan.changes.push(RegistrationChange::Updated(updated));
            }
            None => {
                let school = self.reference().school_by_mincode(&record.mincode)?;
                plan.changes.push(RegistrationChange::Created(StudentRegistration {
                    id: RegistrationId::derive(&row.key.session_id, &row.assessment_id, &row.student_id),
                    student_id: row.student_id.clone(),
                    pen: row.resolved_pen.clone(),
                    assessment_id: row.assessment_id.clone(),
                    assessment_type: row.key.assessment_type.clone(),
                    session_id: row.key.session_id.clone(),
                    school_of_record_id: school.map(|school| school.id),
                    assessment_centre_id: None,
                    surname: None,
                    given_name: None,
                    course_status: CourseStatus::Active,
                    proficiency_score: record.proficiency_score,
                    irt_score: record.irt_score,
                    special_case: record.special_case.clone(),
                    adapted_assessment: record.adapted_assessment.clone(),
                }));
            }
        }
        Ok(plan)
    }
}
