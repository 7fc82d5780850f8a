//! In-memory store with JSON snapshot persistence.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use assess_model::{
    AssessmentId, FileKey, KeyRecord, Pen, RegistrationChange, RegistrationId, RowId, Session,
    SessionId, StagedResult, StagedStatus, StudentId, StudentRegistration,
};

use crate::error::StoreError;
use crate::store::AssessmentStore;

/// Serializable store contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreState {
    pub sessions: Vec<Session>,
    pub registrations: BTreeMap<RegistrationId, StudentRegistration>,
    pub keys: BTreeMap<AssessmentId, Vec<KeyRecord>>,
    pub staged: BTreeMap<RowId, StagedResult>,
}

/// A [`AssessmentStore`] held in memory behind one lock.
///
/// Each trait method holds the lock for its whole duration, which makes
/// every call a single commit unit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: StoreState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        Self::from_state(StoreState {
            sessions,
            ..StoreState::default()
        })
    }

    /// Load a JSON snapshot; a missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No store snapshot at {:?}, starting empty", path);
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(StoreError::SnapshotIo {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let state = serde_json::from_str(&content).map_err(|e| StoreError::SnapshotFormat {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!("Loaded store snapshot from {:?}", path);
        Ok(Self::from_state(state))
    }

    /// Write the current contents as a JSON snapshot.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(&*self.lock()).map_err(|e| {
            StoreError::SnapshotFormat {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;
        fs::write(path, content).map_err(|source| StoreError::SnapshotIo {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Saved store snapshot to {:?}", path);
        Ok(())
    }

    pub fn snapshot(&self) -> StoreState {
        self.lock().clone()
    }

    pub fn add_session(&self, session: Session) {
        let mut state = self.lock();
        state.sessions.retain(|s| s.id != session.id);
        state.sessions.push(session);
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn apply_change(
    registrations: &mut BTreeMap<RegistrationId, StudentRegistration>,
    change: &RegistrationChange,
) -> Result<(), StoreError> {
    match change {
        RegistrationChange::Created(reg) => {
            if registrations.contains_key(&reg.id) {
                return Err(StoreError::RegistrationExists(reg.id.to_string()));
            }
            registrations.insert(reg.id.clone(), reg.clone());
        }
        RegistrationChange::Updated(reg) => {
            let Some(slot) = registrations.get_mut(&reg.id) else {
                return Err(StoreError::RegistrationNotFound(reg.id.to_string()));
            };
            *slot = reg.clone();
        }
        RegistrationChange::Deleted(reg) => {
            if registrations.remove(&reg.id).is_none() {
                return Err(StoreError::RegistrationNotFound(reg.id.to_string()));
            }
        }
    }
    Ok(())
}

impl AssessmentStore for MemoryStore {
    fn session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.lock().sessions.iter().find(|s| &s.id == id).cloned())
    }

    fn registrations_for_student(
        &self,
        student: &StudentId,
    ) -> Result<Vec<StudentRegistration>, StoreError> {
        Ok(self
            .lock()
            .registrations
            .values()
            .filter(|reg| &reg.student_id == student)
            .cloned()
            .collect())
    }

    fn registrations_for_pen(&self, pen: &Pen) -> Result<Vec<StudentRegistration>, StoreError> {
        Ok(self
            .lock()
            .registrations
            .values()
            .filter(|reg| &reg.pen == pen)
            .cloned()
            .collect())
    }

    fn apply_registration_changes(
        &self,
        changes: &[RegistrationChange],
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        let mut next = state.registrations.clone();
        for change in changes {
            apply_change(&mut next, change)?;
        }
        state.registrations = next;
        Ok(())
    }

    fn replace_keys(
        &self,
        assessment: &AssessmentId,
        keys: Vec<KeyRecord>,
    ) -> Result<usize, StoreError> {
        let count = keys.len();
        self.lock().keys.insert(assessment.clone(), keys);
        Ok(count)
    }

    fn keys(&self, assessment: &AssessmentId) -> Result<Vec<KeyRecord>, StoreError> {
        Ok(self.lock().keys.get(assessment).cloned().unwrap_or_default())
    }

    fn has_pending_results(&self, key: &FileKey) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .staged
            .values()
            .any(|row| &row.key == key && row.status.is_pending()))
    }

    fn stage_results(&self, rows: Vec<StagedResult>) -> Result<usize, StoreError> {
        let count = rows.len();
        let mut state = self.lock();
        for row in rows {
            state.staged.insert(row.id, row);
        }
        Ok(count)
    }

    fn claim_staged(&self, key: &FileKey) -> Result<Vec<StagedResult>, StoreError> {
        let mut state = self.lock();
        let mut claimed = Vec::new();
        for row in state.staged.values_mut() {
            if &row.key == key
                && matches!(row.status, StagedStatus::Loaded | StagedStatus::Transfer)
            {
                claimed.push(row.clone());
                row.status = StagedStatus::TransferIn;
            }
        }
        claimed.sort_by_key(|row| row.line);
        Ok(claimed)
    }

    fn set_staged_status(&self, id: &RowId, status: StagedStatus) -> Result<(), StoreError> {
        let mut state = self.lock();
        let Some(row) = state.staged.get_mut(id) else {
            return Err(StoreError::StagedRowNotFound(id.to_hex()));
        };
        row.status = status;
        Ok(())
    }

    fn staged(&self, key: &FileKey) -> Result<Vec<StagedResult>, StoreError> {
        let mut rows: Vec<StagedResult> = self
            .lock()
            .staged
            .values()
            .filter(|row| &row.key == key)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.line);
        Ok(rows)
    }

    fn purge_completed(&self, key: &FileKey) -> Result<usize, StoreError> {
        let mut state = self.lock();
        let before = state.staged.len();
        state
            .staged
            .retain(|_, row| !(&row.key == key && row.status == StagedStatus::Completed));
        Ok(before - state.staged.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_model::CourseStatus;

    fn registration(id: &str, student: &str) -> StudentRegistration {
        StudentRegistration {
            id: RegistrationId::new(id).unwrap(),
            student_id: StudentId::new(student).unwrap(),
            pen: Pen::parse("123456789").unwrap(),
            assessment_id: AssessmentId::new("A-NME10").unwrap(),
            assessment_type: "NME10".to_string(),
            session_id: SessionId::new("S-202409").unwrap(),
            school_of_record_id: None,
            assessment_centre_id: None,
            surname: None,
            given_name: None,
            course_status: CourseStatus::Active,
            proficiency_score: None,
            irt_score: None,
            special_case: None,
            adapted_assessment: None,
        }
    }

    #[test]
    fn test_changes_apply_all_or_nothing() {
        let store = MemoryStore::new();
        store
            .apply_registration_changes(&[RegistrationChange::Created(registration("R1", "S1"))])
            .unwrap();

        let result = store.apply_registration_changes(&[
            RegistrationChange::Created(registration("R2", "S1")),
            RegistrationChange::Deleted(registration("R-missing", "S1")),
        ]);
        assert!(matches!(result, Err(StoreError::RegistrationNotFound(_))));

        let regs = store
            .registrations_for_student(&StudentId::new("S1").unwrap())
            .unwrap();
        assert_eq!(regs.len(), 1);
        assert_eq!(regs[0].id.as_str(), "R1");
    }

    #[test]
    fn test_duplicate_create_is_rejected() {
        let store = MemoryStore::new();
        let create = RegistrationChange::Created(registration("R1", "S1"));
        store.apply_registration_changes(&[create.clone()]).unwrap();
        assert!(matches!(
            store.apply_registration_changes(&[create]),
            Err(StoreError::RegistrationExists(_))
        ));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = MemoryStore::new();
        store
            .apply_registration_changes(&[RegistrationChange::Created(registration("R1", "S1"))])
            .unwrap();
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.snapshot(), store.snapshot());
    }

    #[test]
    fn test_missing_snapshot_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(store.snapshot(), StoreState::default());
    }

    #[test]
    fn test_corrupt_snapshot_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            MemoryStore::load(&path),
            Err(StoreError::SnapshotFormat { .. })
        ));
    }
}
