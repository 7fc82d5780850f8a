//! Process-local logical mutex over (session, assessment type).

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use assess_model::FileKey;

/// Keys of files currently being processed.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    active: Mutex<HashSet<FileKey>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, or `None` when another file holds it.
    ///
    /// Check and insert happen under one lock.
    pub fn try_acquire(&self, key: &FileKey) -> Option<InFlightGuard<'_>> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            registry: self,
            key: key.clone(),
        })
    }

    fn release(&self, key: &FileKey) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Releases its key when dropped.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    registry: &'a InFlightRegistry,
    key: FileKey,
}

impl InFlightGuard<'_> {
    pub fn key(&self) -> &FileKey {
        &self.key
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.key);
    }
}
