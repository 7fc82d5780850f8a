//! Orchestration for provincial assessment ingestion.
//!
//! [`BatchProcessor`] takes one uploaded file through decoding, validation,
//! identity resolution and a single store commit, and later promotes staged
//! results into student registrations. External systems are reached only
//! through the traits in [`collaborators`], [`store`] and [`events`];
//! [`MemoryStore`] and [`EventBus`] are the in-process implementations.

pub mod collaborators;
pub mod error;
pub mod events;
pub mod identity;
pub mod inflight;
pub mod memory;
pub mod processor;
mod promotion;
pub mod report;
pub mod settings;
pub mod store;
pub mod upload;

pub use collaborators::{CachedReferenceData, ReferenceData, StudentRegistry};
pub use error::{LookupError, PipelineError, Result, StoreError};
pub use events::{EventBus, EventOutcome, EventPublisher, EventType, RegistrationEvent};
pub use identity::{IdentityResolver, Resolution, Unresolved};
pub use inflight::{InFlightGuard, InFlightRegistry};
pub use memory::{MemoryStore, StoreState};
pub use processor::{BatchProcessor, Collaborators};
pub use report::{
    BatchSummary, ChangeCounts, ProcessOutcome, PromotionSummary, RejectionKind,
    RejectionReport, RowRejection,
};
pub use settings::{
    DecoderSettings, EventSettings, FileSettings, IdentitySettings, PipelineSettings,
    load_settings,
};
pub use store::AssessmentStore;
pub use upload::FileUpload;
