//! Closed code enumerations shared by the ingestion pipeline.
//!
//! Every code renders to (and parses from) the exact string used in file
//! interchange and in rejection reports.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $code:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $code)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code),+
                }
            }

            /// Case-insensitive lookup of a code string.
            pub fn parse(value: &str) -> Option<Self> {
                let value = value.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|code| code.as_str().eq_ignore_ascii_case(value))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

code_enum! {
    /// The kind of uploaded file, which selects layout and error policy.
    FileCategory {
        /// Answer-key file (fail-fast).
        Key => "KEY",
        /// Scanner result file (row-granular).
        Result => "RESULT",
        /// Student registration file (row-granular).
        Registration => "REGISTRATION",
    }
}

code_enum! {
    /// Field a validation issue is attached to.
    FieldCode {
        File => "FILE",
        Header => "HEADER",
        Line => "LINE",
        Session => "SESSION",
        AssessmentType => "ASSESSMENT_TYPE",
        Pen => "PEN",
        Mincode => "MINCODE",
        ComponentType => "COMPONENT_TYPE",
        ComponentSubType => "COMPONENT_SUB_TYPE",
        SpecialCase => "SPECIAL_CASE",
        AdaptedAssessment => "ADAPTED_ASSESSMENT",
        OpenEndedMarks => "OPEN_ENDED_MARKS",
        McMarks => "MC_MARKS",
        ProficiencyScore => "PROFICIENCY_SCORE",
        IrtScore => "IRT_SCORE",
        ChoicePath => "CHOICE_PATH",
        AssessmentSession => "ASSMT_SESSION",
        AssessmentCode => "ASSMT_CODE",
        FormCode => "FORM_CODE",
        QuestionNumber => "QUES_NUMBER",
        ItemType => "ITEM_TYPE",
        CorrectAnswer => "CORRECT_ANSWER",
        MarkValue => "MARK_VALUE",
        CognitiveLevel => "COGN_LEVEL",
        TaskCode => "TASK_CODE",
        ClaimCode => "CLAIM_CODE",
        ContextCode => "CONTEXT_CODE",
        ConceptCode => "CONCEPTS_CODE",
        ScaleFactor => "SCALE_FACTOR",
        IrtColumn => "IRT_COLUMN",
        SectionCode => "ASSMT_SECTION",
        Surname => "LEGAL_SURNAME",
        GivenName => "LEGAL_GIVEN_NAME",
        SchoolOfRecord => "SCHOOL_OF_RECORD",
        AssessmentCentre => "ASSESSMENT_CENTRE",
        CourseStatus => "COURSE_STATUS",
    }
}

code_enum! {
    /// Issue type attached to a [`crate::ValidationIssue`].
    IssueCode {
        // File-level
        InvalidSession => "INVALID_SESSION",
        EmptyFile => "EMPTY_FILE",
        MissingExtension => "MISSING_EXTENSION",
        InvalidFileExtension => "INVALID_FILE_EXTENSION",
        InvalidFileName => "INVALID_FILE_NAME",
        InvalidAssessmentType => "INVALID_ASSESSMENT_TYPE",
        InvalidFileContents => "INVALID_FILE_CONTENTS",
        InvalidFileEncoding => "INVALID_FILE_ENCODING",
        FileInProgress => "FILE_IN_PROGRESS",
        MissingHeader => "MISSING_HEADER",
        BlankHeader => "BLANK_HEADER",
        RowLength => "ROW_LENGTH",
        MalformedRow => "MALFORMED_ROW",
        GenericError => "GENERIC_ERROR",

        // Key-file scope checks
        SessionMismatch => "SESSION_MISMATCH",
        AssessmentTypeMismatch => "ASSESSMENT_TYPE_MISMATCH",
        FormCodeMismatch => "FORM_CODE_MISMATCH",

        // Field-level
        InvalidPen => "INVALID_PEN",
        InvalidMincode => "INVALID_MINCODE",
        InvalidComponentType => "INVALID_COMPONENT_TYPE",
        InvalidComponentSubType => "INVALID_COMPONENT_SUB_TYPE",
        InvalidSpecialCase => "INVALID_SPECIAL_CASE",
        InvalidAdaptedAssessment => "INVALID_ADAPTED_ASSESSMENT",
        InvalidOpenEndedMarks => "INVALID_OPEN_ENDED_MARKS",
        InvalidMcMarks => "INVALID_MC_MARKS",
        InvalidProficiencyScore => "INVALID_PROFICIENCY_SCORE",
        InvalidIrtScore => "INVALID_IRT_SCORE",
        InvalidChoicePath => "INVALID_CHOICE_PATH",
        InvalidAssessmentSession => "INVALID_ASSESSMENT_SESSION",
        InvalidAssessmentCode => "INVALID_ASSESSMENT_CODE",
        InvalidFormCode => "INVALID_FORM_CODE",
        InvalidQuestionNumber => "INVALID_QUESTION_NUMBER",
        InvalidItemType => "INVALID_ITEM_TYPE",
        InvalidCorrectAnswer => "INVALID_CORRECT_ANSWER",
        InvalidMarkValue => "INVALID_MARK_VALUE",
        InvalidCognitiveLevel => "INVALID_COGNITIVE_LEVEL",
        InvalidTaskCode => "INVALID_TASK_CODE",
        InvalidClaimCode => "INVALID_CLAIM_CODE",
        InvalidContextCode => "INVALID_CONTEXT_CODE",
        InvalidConceptCode => "INVALID_CONCEPT_CODE",
        InvalidScaleFactor => "INVALID_SCALE_FACTOR",
        InvalidIrtColumn => "INVALID_IRT_COLUMN",
        InvalidSectionCode => "INVALID_SECTION_CODE",
        InvalidSurname => "INVALID_SURNAME",
        InvalidGivenName => "INVALID_GIVEN_NAME",
        InvalidSchoolOfRecord => "INVALID_SCHOOL_OF_RECORD",
        InvalidAssessmentCentre => "INVALID_ASSESSMENT_CENTRE",
        InvalidCourseStatus => "INVALID_COURSE_STATUS",

        // Identity resolution
        StudentNotFound => "STUDENT_NOT_FOUND",
        MergeChainUnresolved => "MERGE_CHAIN_UNRESOLVED",
        LookupUnavailable => "LOOKUP_UNAVAILABLE",

        // Registration rules
        PenInvalid => "PEN_INVALID",
        SchoolInvalid => "SCHOOL_INVALID",
        AssessmentCentreInvalid => "ASSESSMENT_CENTRE_INVALID",
        AssessmentInvalid => "ASSESSMENT_INVALID",
        DuplicateRegistration => "DUPLICATE_REGISTRATION",
        NumberOfAttemptsExceeded => "NUMBER_OF_ATTEMPTS_EXCEEDED",
        CsfFrenchImmersion => "CSF_FRENCH_IMMERSION",
        SurnameMismatch => "SURNAME_MISMATCH",
        GivenNameMismatch => "GIVEN_NAME_MISMATCH",
        WrittenAssessmentWithdrawal => "WRITTEN_ASSESSMENT_WITHDRAWAL",
    }
}

code_enum! {
    /// Status of a student record in the external registry.
    StudentStatus {
        Active => "A",
        Merged => "M",
        Deceased => "D",
        Deleted => "X",
    }
}

code_enum! {
    /// Registration course status.
    CourseStatus {
        Active => "A",
        Withdrawn => "W",
    }
}

code_enum! {
    /// Lifecycle of a staged result row.
    StagedStatus {
        /// Staged; student resolved directly.
        Loaded => "LOADED",
        /// Staged; student resolved through at least one merge hop.
        Transfer => "TRANSFER",
        /// Claimed by a running promotion.
        TransferIn => "TRANSFERIN",
        Completed => "COMPLETED",
        Error => "ERROR",
    }
}

impl StagedStatus {
    /// Rows still waiting for (or undergoing) promotion.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Loaded | Self::Transfer | Self::TransferIn)
    }
}

/// Issue severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Blocks the row or file.
    Error,
    /// Reported but not blocking.
    Warning,
}

impl Severity {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
        }
    }
}
