//! Batch orchestration: one pipeline invocation per uploaded file.
//!
//! # Pipeline
//!
//! 1. Resolve the target session
//! 2. Whole-file checks and in-flight claim
//! 3. Decode with the category's layout
//! 4. Per-row validation and extraction
//! 5. Identity resolution / rule evaluation
//! 6. One store commit, then events
//!
//! Expected failures come back as [`ProcessOutcome::Rejected`] or as row
//! rejections inside the summary. Only faults outside the file's control
//! (layout templates, the store) are returned as [`PipelineError`].

mod key;
mod registration;
mod result;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;

use assess_ingest::{DecodedTable, IngestError, decode};
use assess_model::messages::{self, fill_template};
use assess_model::{
    FieldCode, FileCategory, IssueCode, ParseError, RowId, School, Session, SessionId,
    UploadedFile, ValidationIssue,
};
use assess_validate::{FileError, RuleEngine, ValidatedFile, validate_file};

use crate::collaborators::{ReferenceData, StudentRegistry};
use crate::error::{LookupError, PipelineError, Result};
use crate::events::EventPublisher;
use crate::identity::IdentityResolver;
use crate::inflight::InFlightRegistry;
use crate::report::{ProcessOutcome, RejectionReport, RowRejection};
use crate::settings::PipelineSettings;
use crate::store::AssessmentStore;
use crate::upload::FileUpload;

/// Services the pipeline consumes.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn AssessmentStore>,
    pub reference: Arc<dyn ReferenceData>,
    pub students: Arc<dyn StudentRegistry>,
    pub events: Arc<dyn EventPublisher>,
}

/// Runs the ingestion pipeline and promotion over shared collaborators.
pub struct BatchProcessor {
    collaborators: Collaborators,
    in_flight: Arc<InFlightRegistry>,
    settings: PipelineSettings,
    rules: RuleEngine,
    today: NaiveDate,
}

/// Per-file state shared by the category handlers.
pub(crate) struct FileContext<'a> {
    pub file: &'a UploadedFile,
    pub session: &'a Session,
    pub validated: &'a ValidatedFile,
    pub table: &'a DecodedTable,
}

impl FileContext<'_> {
    /// Deterministic id for a row of this file.
    pub fn row_id(&self, line: usize) -> RowId {
        RowId::derive(&[
            self.file.file_name.as_str(),
            self.session.id.as_str(),
            line.to_string().as_str(),
        ])
    }
}

impl BatchProcessor {
    pub fn new(collaborators: Collaborators, settings: PipelineSettings) -> Self {
        Self {
            rules: RuleEngine::standard(&settings.rules),
            collaborators,
            in_flight: Arc::new(InFlightRegistry::new()),
            settings,
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Share an in-flight registry with other processors.
    #[must_use]
    pub fn with_in_flight(mut self, in_flight: Arc<InFlightRegistry>) -> Self {
        self.in_flight = in_flight;
        self
    }

    /// Fix the date schools are checked against.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: RuleEngine) -> Self {
        self.rules = rules;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.in_flight
    }

    pub fn resolver(&self) -> IdentityResolver<'_> {
        IdentityResolver::new(
            self.collaborators.students.as_ref(),
            self.settings.identity.max_merge_hops,
        )
    }

    pub(crate) fn store(&self) -> &dyn AssessmentStore {
        self.collaborators.store.as_ref()
    }

    pub(crate) fn reference(&self) -> &dyn ReferenceData {
        self.collaborators.reference.as_ref()
    }

    pub(crate) fn students(&self) -> &dyn StudentRegistry {
        self.collaborators.students.as_ref()
    }

    pub(crate) fn events(&self) -> &dyn EventPublisher {
        self.collaborators.events.as_ref()
    }

    /// School lookup memoized for one file. Failures are not memoized.
    pub(crate) fn school_for_mincode(
        &self,
        memo: &mut HashMap<String, Option<School>>,
        mincode: &str,
    ) -> std::result::Result<Option<School>, LookupError> {
        if let Some(school) = memo.get(mincode) {
            return Ok(school.clone());
        }
        let school = self.reference().school_by_mincode(mincode)?;
        memo.insert(mincode.to_string(), school.clone());
        Ok(school)
    }

    /// Decode a base64 upload, then process it.
    pub fn process_upload(
        &self,
        upload: &FileUpload,
        session_id: &SessionId,
    ) -> Result<ProcessOutcome> {
        match upload.decode() {
            Ok(file) => self.process_file(&file, session_id),
            Err(issue) => {
                tracing::warn!(file = %upload.file_name, code = %issue.code, "upload rejected");
                Ok(ProcessOutcome::Rejected(RejectionReport::validation(
                    &upload.file_name,
                    issue,
                )))
            }
        }
    }

    /// Run one file through the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] only for faults outside the file's control.
    pub fn process_file(
        &self,
        file: &UploadedFile,
        session_id: &SessionId,
    ) -> Result<ProcessOutcome> {
        let span = tracing::info_span!(
            "process_file",
            file = %file.file_name,
            category = %file.category,
            session = %session_id,
        );
        let _enter = span.enter();

        let outcome = self.run(file, session_id);
        match &outcome {
            Ok(ProcessOutcome::Committed(summary)) => tracing::info!(
                total = summary.total_rows,
                accepted = summary.accepted_rows,
                rejected = summary.rejected_count(),
                "file committed"
            ),
            Ok(ProcessOutcome::Rejected(report)) => tracing::warn!(
                kind = ?report.kind,
                errors = report.errors.len(),
                "file rejected"
            ),
            Err(e) => tracing::error!(error = %e, "file processing failed"),
        }
        outcome
    }

    fn run(&self, file: &UploadedFile, session_id: &SessionId) -> Result<ProcessOutcome> {
        let reject = |issue: ValidationIssue| -> Result<ProcessOutcome> {
            Ok(ProcessOutcome::Rejected(RejectionReport::validation(
                &file.file_name,
                issue,
            )))
        };

        let Some(session) = self.store().session(session_id)? else {
            return reject(ValidationIssue::error(
                FieldCode::Session,
                IssueCode::InvalidSession,
                fill_template(messages::INVALID_SESSION, &[session_id]),
            ));
        };

        let extension = self.settings.files.extension_for(file.category);
        let validated = match validate_file(file, &session, extension) {
            Ok(validated) => validated,
            Err(e) => return Ok(file_rejection(&file.file_name, e)),
        };

        let Some(_guard) = self.in_flight.try_acquire(&validated.key) else {
            return Ok(file_rejection(
                &file.file_name,
                FileError::conflict(&validated.key),
            ));
        };
        if file.category == FileCategory::Result
            && self.store().has_pending_results(&validated.key)?
        {
            tracing::info!(key = %validated.key, "unpromoted results still staged");
            return Ok(file_rejection(
                &file.file_name,
                FileError::conflict(&validated.key),
            ));
        }

        let layout = self.settings.decoder.layout_for(file.category)?;
        let table = match decode(&file.contents, &layout) {
            Ok(table) => table,
            Err(IngestError::UnsupportedEncoding { encoding }) => {
                return reject(ValidationIssue::error(
                    FieldCode::File,
                    IssueCode::InvalidFileEncoding,
                    fill_template(messages::INVALID_FILE_ENCODING, &[&encoding]),
                ));
            }
            Err(e) => return Err(PipelineError::Layout(e)),
        };
        if table.is_empty() {
            return reject(ValidationIssue::error(
                FieldCode::File,
                IssueCode::EmptyFile,
                fill_template(messages::EMPTY_FILE, &[&file.file_name]),
            ));
        }
        tracing::info!(
            rows = table.rows.len(),
            parse_errors = table.errors.len(),
            "decoded"
        );

        let ctx = FileContext {
            file,
            session: &session,
            validated: &validated,
            table: &table,
        };
        match file.category {
            FileCategory::Key => self.process_keys(&ctx),
            FileCategory::Result => self.process_results(&ctx),
            FileCategory::Registration => self.process_registrations(&ctx),
        }
    }
}

pub(crate) fn file_rejection(file_name: &str, error: FileError) -> ProcessOutcome {
    ProcessOutcome::Rejected(match error {
        FileError::Invalid(issue) => RejectionReport::validation(file_name, issue),
        FileError::Conflict(issue) => RejectionReport::conflict(file_name, issue),
    })
}

pub(crate) fn row_rejections(
    rejected: BTreeMap<usize, Vec<ValidationIssue>>,
) -> Vec<RowRejection> {
    rejected
        .into_iter()
        .map(|(line, issues)| RowRejection { line, issues })
        .collect()
}

/// Issue for a structural row problem found by the decoder.
pub(crate) fn parse_issue(error: &ParseError) -> ValidationIssue {
    let code = if error.is_row_length() {
        IssueCode::RowLength
    } else {
        IssueCode::MalformedRow
    };
    ValidationIssue::error(FieldCode::Line, code, error.description.clone())
}

/// Issue for a row whose school lookup could not complete.
pub(crate) fn school_lookup_issue(field: FieldCode, mincode: &str) -> ValidationIssue {
    ValidationIssue::error(
        field,
        IssueCode::LookupUnavailable,
        fill_template(messages::SCHOOL_LOOKUP_UNAVAILABLE, &[&mincode]),
    )
    .with_rejected_value(mincode)
}
