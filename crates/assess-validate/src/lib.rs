//! Validation for assessment ingestion.
//!
//! Three layers, applied in pipeline order:
//! - [`file`] - whole-file preconditions and header checks
//! - [`row`] / [`extract`] - per-field constraints and typed record extraction
//! - [`rules`] - dependency-gated business rules for registration candidates
//!
//! Expected validation failures are returned as values, never as errors.

pub mod extract;
pub mod file;
pub mod row;
pub mod rules;

pub use extract::{KeyScope, key_required_headers, registration_required_headers};
pub use file::{FileError, FileNameParts, ValidatedFile, check_headers, decompose_file_name, validate_file};
pub use row::{CheckedFields, FieldKind, FieldSpec, RowRecord, validate_and_extract, validate_fields};
pub use rules::{
    DependencyTable, Gate, RegistrationCandidate, RuleEngine, RuleId, RuleRunReport,
    RuleSettings, StudentRuleData, ValidationRule, ValidationRuleOutcome,
};
