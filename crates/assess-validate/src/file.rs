//! Whole-file preconditions.
//!
//! Checks run in a fixed order and stop at the first failure: payload
//! present, extension present and expected, file name shape, session token,
//! active assessment. Header checks run after decoding.

use thiserror::Error;

use assess_ingest::DecodedTable;
use assess_model::messages::{self, fill_template};
use assess_model::{
    Assessment, FieldCode, FileKey, IssueCode, Session, UploadedFile, ValidationIssue,
};

/// A whole-file rejection.
///
/// Conflicts are kept apart from data-quality failures: they are retryable
/// once the in-flight file completes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileError {
    #[error("{}", .0.message)]
    Invalid(ValidationIssue),
    #[error("{}", .0.message)]
    Conflict(ValidationIssue),
}

impl FileError {
    pub fn invalid(field: FieldCode, code: IssueCode, message: impl Into<String>) -> Self {
        Self::Invalid(ValidationIssue::error(field, code, message))
    }

    /// Another file for `key` is still being processed or awaits promotion.
    pub fn conflict(key: &FileKey) -> Self {
        Self::Conflict(ValidationIssue::error(
            FieldCode::File,
            IssueCode::FileInProgress,
            fill_template(
                messages::FILE_IN_PROGRESS,
                &[&key.assessment_type, &key.session_id],
            ),
        ))
    }

    pub fn issue(&self) -> &ValidationIssue {
        match self {
            Self::Invalid(issue) | Self::Conflict(issue) => issue,
        }
    }

    pub fn into_issue(self) -> ValidationIssue {
        match self {
            Self::Invalid(issue) | Self::Conflict(issue) => issue,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Parts of a `{prefix}_{YYYYMM}_{assessmentType}.{ext}` file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameParts {
    pub prefix: String,
    pub session_token: String,
    pub assessment_type: String,
    pub extension: String,
}

/// Split a file name into its parts.
///
/// The prefix may itself contain underscores; the session token and
/// assessment type are the last two segments of the stem.
pub fn decompose_file_name(file_name: &str) -> Option<FileNameParts> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    let (rest, assessment_type) = stem.rsplit_once('_')?;
    let (prefix, session_token) = rest.rsplit_once('_')?;

    let token_ok = session_token.len() == 6 && session_token.bytes().all(|b| b.is_ascii_digit());
    let type_ok = !assessment_type.is_empty()
        && assessment_type.bytes().all(|b| b.is_ascii_alphanumeric());
    if prefix.is_empty() || extension.is_empty() || !token_ok || !type_ok {
        return None;
    }
    Some(FileNameParts {
        prefix: prefix.to_string(),
        session_token: session_token.to_string(),
        assessment_type: assessment_type.to_ascii_uppercase(),
        extension: extension.to_string(),
    })
}

/// A file that passed the whole-file checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFile {
    pub name: FileNameParts,
    pub assessment: Assessment,
    pub key: FileKey,
}

/// Validate whole-file preconditions against the target session.
pub fn validate_file(
    upload: &UploadedFile,
    session: &Session,
    expected_extension: &str,
) -> Result<ValidatedFile, FileError> {
    let file_name = upload.file_name.as_str();

    if upload.is_empty() {
        return Err(FileError::invalid(
            FieldCode::File,
            IssueCode::EmptyFile,
            fill_template(messages::EMPTY_FILE, &[&file_name]),
        ));
    }

    let Some(extension) = upload.extension() else {
        return Err(FileError::invalid(
            FieldCode::File,
            IssueCode::MissingExtension,
            fill_template(messages::MISSING_EXTENSION, &[&file_name]),
        ));
    };
    if !extension.eq_ignore_ascii_case(expected_extension) {
        return Err(FileError::invalid(
            FieldCode::File,
            IssueCode::InvalidFileExtension,
            fill_template(
                messages::INVALID_FILE_EXTENSION,
                &[&file_name, &expected_extension],
            ),
        ));
    }

    let Some(name) = decompose_file_name(file_name) else {
        return Err(FileError::invalid(
            FieldCode::File,
            IssueCode::InvalidFileName,
            fill_template(messages::FILE_NAME_SHAPE, &[&file_name]),
        ));
    };

    let token = session.token();
    if name.session_token != token {
        return Err(FileError::invalid(
            FieldCode::File,
            IssueCode::InvalidFileName,
            fill_template(messages::FILE_NAME_SESSION, &[&file_name, &token]),
        ));
    }

    let Some(assessment) = session.active_assessment(&name.assessment_type) else {
        return Err(FileError::invalid(
            FieldCode::AssessmentType,
            IssueCode::InvalidAssessmentType,
            fill_template(
                messages::INVALID_ASSESSMENT_TYPE,
                &[&name.assessment_type, &token],
            ),
        ));
    };

    tracing::debug!(
        file = file_name,
        assessment_type = %name.assessment_type,
        "file-level checks passed"
    );
    Ok(ValidatedFile {
        key: FileKey::new(session.id.clone(), name.assessment_type.clone()),
        assessment: assessment.clone(),
        name,
    })
}

/// Check the decoded header row: no blank cells, every required column present.
pub fn check_headers(table: &DecodedTable, required: &[FieldCode]) -> Result<(), FileError> {
    if let Some(position) = table.headers.iter().position(|h| h.trim().is_empty()) {
        return Err(FileError::invalid(
            FieldCode::Header,
            IssueCode::BlankHeader,
            fill_template(messages::BLANK_HEADER, &[&(position + 1)]),
        ));
    }
    if let Some(missing) = required.iter().find(|f| !table.has_column(f.as_str())) {
        return Err(FileError::invalid(
            FieldCode::Header,
            IssueCode::MissingHeader,
            fill_template(messages::MISSING_HEADER, &[missing]),
        ));
    }
    Ok(())
}
