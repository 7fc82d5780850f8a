//! Store snapshot, reference data and processor wired together for one run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast;

use assess_core::{
    BatchProcessor, CachedReferenceData, Collaborators, EventBus, MemoryStore, PipelineSettings,
    RegistrationEvent, load_settings,
};

use crate::fixtures::ReferenceFile;

/// Everything a command needs.
pub struct Workspace {
    store: Arc<MemoryStore>,
    store_path: PathBuf,
    processor: BatchProcessor,
    events: broadcast::Receiver<RegistrationEvent>,
}

impl Workspace {
    /// Load settings, the store snapshot and reference data.
    ///
    /// Sessions listed in the reference file are registered with the store.
    pub fn open(store_path: &Path, reference_path: &Path, config: Option<&Path>) -> Result<Self> {
        let settings = load_settings(config).context("load settings")?;
        let store = MemoryStore::load(store_path).context("open store")?;
        let reference = ReferenceFile::load(reference_path)?;
        for session in &reference.sessions {
            store.add_session(session.clone());
        }
        Ok(Self::new(
            Arc::new(store),
            store_path.to_path_buf(),
            reference,
            settings,
        ))
    }

    pub fn new(
        store: Arc<MemoryStore>,
        store_path: PathBuf,
        reference: ReferenceFile,
        settings: PipelineSettings,
    ) -> Self {
        let bus = EventBus::new(settings.events.capacity);
        let events = bus.subscribe();
        let collaborators = Collaborators {
            store: store.clone(),
            reference: Arc::new(CachedReferenceData::new(reference.clone())),
            students: Arc::new(reference),
            events: Arc::new(bus),
        };
        Self {
            store,
            store_path,
            processor: BatchProcessor::new(collaborators, settings),
            events,
        }
    }

    pub fn processor(&self) -> &BatchProcessor {
        &self.processor
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Events published since the last call.
    pub fn take_events(&mut self) -> Vec<RegistrationEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "event summary lagged; oldest events dropped");
                }
                Err(_) => break,
            }
        }
        events
    }

    /// Write the store snapshot back to where it was loaded from.
    pub fn save(&self) -> Result<()> {
        self.store
            .save(&self.store_path)
            .with_context(|| format!("save store {}", self.store_path.display()))
    }
}
