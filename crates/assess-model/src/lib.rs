//! Data model for provincial assessment ingestion.
//!
//! Defines the records that flow through the pipeline (parsed rows, key and
//! result records, staged results, registrations), the closed code
//! enumerations used in rejection reports, and the translatable message
//! catalog.

pub mod codes;
pub mod error;
pub mod ids;
pub mod issue;
pub mod messages;
pub mod records;
pub mod reference;
pub mod registration;
pub mod staging;
pub mod upload;

pub use codes::{
    CourseStatus, FieldCode, FileCategory, IssueCode, Severity, StagedStatus, StudentStatus,
};
pub use error::{ModelError, Result};
pub use ids::{AssessmentId, Pen, RegistrationId, RowId, SchoolId, SessionId, StudentId};
pub use issue::{FieldError, ValidationIssue};
pub use messages::fill_template;
pub use records::{
    KeyRecord, ParseError, ParseErrorKind, ParsedRow, RegistrationRecord, ResultRecord,
};
pub use reference::{Assessment, GradRecord, MergeChainLink, School, Session, Student};
pub use registration::{RegistrationChange, StudentRegistration};
pub use staging::{FileKey, StagedResult};
pub use upload::UploadedFile;
