//! Persistence interface for sessions, keys, staged results and registrations.

use assess_model::{
    AssessmentId, FileKey, KeyRecord, Pen, RegistrationChange, RowId, Session, SessionId,
    StagedResult, StagedStatus, StudentId, StudentRegistration,
};

use crate::error::StoreError;

/// The system of record as seen by the pipeline.
///
/// Every mutating method is one commit unit: it either applies completely or
/// leaves the store untouched.
pub trait AssessmentStore: Send + Sync {
    fn session(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;

    // === Registrations ===

    fn registrations_for_student(
        &self,
        student: &StudentId,
    ) -> Result<Vec<StudentRegistration>, StoreError>;

    fn registrations_for_pen(&self, pen: &Pen) -> Result<Vec<StudentRegistration>, StoreError>;

    /// Apply all changes or none.
    fn apply_registration_changes(&self, changes: &[RegistrationChange])
    -> Result<(), StoreError>;

    // === Keys ===

    /// Replace every key of an assessment; returns the number stored.
    fn replace_keys(
        &self,
        assessment: &AssessmentId,
        keys: Vec<KeyRecord>,
    ) -> Result<usize, StoreError>;

    fn keys(&self, assessment: &AssessmentId) -> Result<Vec<KeyRecord>, StoreError>;

    // === Staged results ===

    /// Whether any row for `key` still awaits (or is undergoing) promotion.
    fn has_pending_results(&self, key: &FileKey) -> Result<bool, StoreError>;

    /// Insert staged rows, replacing rows with the same id.
    fn stage_results(&self, rows: Vec<StagedResult>) -> Result<usize, StoreError>;

    /// Move every `LOADED`/`TRANSFER` row of `key` to `TRANSFERIN`.
    ///
    /// Returns the claimed rows as they were before the claim.
    fn claim_staged(&self, key: &FileKey) -> Result<Vec<StagedResult>, StoreError>;

    fn set_staged_status(&self, id: &RowId, status: StagedStatus) -> Result<(), StoreError>;

    fn staged(&self, key: &FileKey) -> Result<Vec<StagedResult>, StoreError>;

    /// Delete `COMPLETED` rows of `key`; returns the number deleted.
    fn purge_completed(&self, key: &FileKey) -> Result<usize, StoreError>;
}
