use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{info, info_span};

use assess_cli::fixtures::ReferenceFile;
use assess_cli::input::{upload_from_file, upload_from_payload};
use assess_cli::logging::redact_value;
use assess_cli::workspace::Workspace;
use assess_core::{
    IdentityResolver, PipelineError, ProcessOutcome, PromotionSummary, RegistrationEvent,
    Resolution, load_settings,
};
use assess_model::{FileCategory, Pen, SessionId};

use crate::cli::{IngestArgs, KeyArgs, ResolveArgs};

pub struct IngestResult {
    pub outcome: ProcessOutcome,
    pub events: Vec<RegistrationEvent>,
}

pub struct PromoteResult {
    pub summary: PromotionSummary,
    pub events: Vec<RegistrationEvent>,
}

pub fn run_ingest(args: &IngestArgs, config: Option<&Path>) -> Result<IngestResult> {
    let category = FileCategory::from(args.kind);
    let session_id = SessionId::new(args.session.as_str()).context("invalid session id")?;
    let upload = match (&args.file, &args.payload) {
        (_, Some(payload)) => upload_from_payload(payload, category)?,
        (Some(file), None) => upload_from_file(file, category)?,
        (None, None) => return Err(anyhow!("either FILE or --payload is required")),
    };

    let mut workspace = Workspace::open(&args.store.store, &args.store.reference, config)?;
    let outcome = workspace
        .processor()
        .process_upload(&upload, &session_id)
        .map_err(|error| fatal(&error))?;
    if outcome.is_committed() {
        workspace.save()?;
    }
    Ok(IngestResult {
        outcome,
        events: workspace.take_events(),
    })
}

pub fn run_promote(args: &KeyArgs, config: Option<&Path>) -> Result<PromoteResult> {
    let session_id = SessionId::new(args.session.as_str()).context("invalid session id")?;
    let mut workspace = Workspace::open(&args.store.store, &args.store.reference, config)?;
    let summary = workspace
        .processor()
        .promote(&session_id, &args.assessment_type)
        .map_err(|error| fatal(&error))?;
    workspace.save()?;
    Ok(PromoteResult {
        summary,
        events: workspace.take_events(),
    })
}

pub fn run_purge(args: &KeyArgs, config: Option<&Path>) -> Result<usize> {
    let session_id = SessionId::new(args.session.as_str()).context("invalid session id")?;
    let workspace = Workspace::open(&args.store.store, &args.store.reference, config)?;
    let purged = workspace
        .processor()
        .purge_completed(&session_id, &args.assessment_type)
        .map_err(|error| fatal(&error))?;
    workspace.save()?;
    Ok(purged)
}

pub fn run_resolve(args: &ResolveArgs, config: Option<&Path>) -> Result<Resolution> {
    let pen = Pen::parse(&args.pen).context("invalid PEN")?;
    let settings = load_settings(config).context("load settings")?;
    let reference = ReferenceFile::load(&args.reference)?;
    let span = info_span!("resolve", pen = %redact_value(pen.as_str()));
    let _enter = span.enter();
    let resolution = IdentityResolver::new(&reference, settings.identity.max_merge_hops).resolve(&pen);
    info!(resolved = resolution.is_resolved(), "resolution finished");
    Ok(resolution)
}

/// Log the full error and hand the caller the generic message only.
fn fatal(error: &PipelineError) -> anyhow::Error {
    tracing::error!(error = %error, "pipeline failed");
    anyhow!(error.user_message().to_string())
}
