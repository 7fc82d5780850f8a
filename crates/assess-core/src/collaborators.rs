//! Narrow interfaces to services this pipeline consumes but does not own.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use assess_model::{GradRecord, Pen, School, SchoolId, Student, StudentId};

use crate::error::LookupError;

/// School and assessment-centre lookups.
pub trait ReferenceData: Send + Sync {
    fn school_by_id(&self, id: &SchoolId) -> Result<Option<School>, LookupError>;

    fn school_by_mincode(&self, mincode: &str) -> Result<Option<School>, LookupError>;
}

/// The external student registry.
pub trait StudentRegistry: Send + Sync {
    fn student_by_pen(&self, pen: &Pen) -> Result<Option<Student>, LookupError>;

    /// Batched lookup. Ids that are not found are simply absent from the
    /// response.
    fn students_by_ids(&self, ids: &[StudentId]) -> Result<Vec<Student>, LookupError>;

    fn grad_record(&self, student: &StudentId) -> Result<Option<GradRecord>, LookupError>;
}

/// Read-through cache over a [`ReferenceData`] source.
///
/// A miss (including a cached "not found") triggers a refresh from the
/// source, so schools added upstream become visible without a restart.
/// Lookup failures are passed through and never cached.
pub struct CachedReferenceData<R> {
    source: R,
    by_mincode: Mutex<HashMap<String, School>>,
}

impl<R: ReferenceData> CachedReferenceData<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            by_mincode: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.by_mincode
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn remember(&self, school: &School) {
        self.by_mincode
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(school.mincode.clone(), school.clone());
    }
}

impl<R: ReferenceData> ReferenceData for CachedReferenceData<R> {
    fn school_by_id(&self, id: &SchoolId) -> Result<Option<School>, LookupError> {
        let cached = self
            .by_mincode
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|school| &school.id == id)
            .cloned();
        if cached.is_some() {
            return Ok(cached);
        }
        let school = self.source.school_by_id(id)?;
        if let Some(school) = &school {
            self.remember(school);
        }
        Ok(school)
    }

    fn school_by_mincode(&self, mincode: &str) -> Result<Option<School>, LookupError> {
        let cached = self
            .by_mincode
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(mincode)
            .cloned();
        if cached.is_some() {
            return Ok(cached);
        }
        tracing::debug!(mincode, "school cache miss");
        let school = self.source.school_by_mincode(mincode)?;
        if let Some(school) = &school {
            self.remember(school);
        }
        Ok(school)
    }
}
