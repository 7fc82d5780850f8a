//! Caller-facing message catalog.
//!
//! Templates carry a single generic placeholder token, [`PLACEHOLDER`],
//! filled left to right by [`fill_template`]. Keeping the arguments out of the
//! template text keeps the catalog translatable.

use std::fmt::{self, Write};

/// The only placeholder token allowed in a template.
pub const PLACEHOLDER: &str = "{}";

// File-level
pub const INVALID_SESSION: &str = "Session {} could not be found.";
pub const EMPTY_FILE: &str = "File {} contains no data.";
pub const MISSING_EXTENSION: &str = "File name {} has no extension.";
pub const INVALID_FILE_EXTENSION: &str = "File {} must have the extension .{}.";
pub const FILE_NAME_SHAPE: &str =
    "File name {} must follow the pattern PREFIX_YYYYMM_ASSESSMENTTYPE.EXT.";
pub const FILE_NAME_SESSION: &str = "File name {} does not belong to session {}.";
pub const INVALID_ASSESSMENT_TYPE: &str = "Assessment type {} is not offered in session {}.";
pub const INVALID_FILE_CONTENTS: &str = "File {} could not be decoded.";
pub const INVALID_FILE_ENCODING: &str =
    "File is encoded as {}; only UTF-8 and Windows-1252 are supported.";
pub const FILE_IN_PROGRESS: &str = "A file for assessment {} in session {} is already being processed. Try again once it completes.";
pub const MISSING_HEADER: &str = "Required column {} is missing from the header row.";
pub const BLANK_HEADER: &str = "Header cell {} is blank.";
pub const LINE_TOO_LONG: &str = "Line {} has too many characters.";
pub const LINE_TOO_SHORT: &str = "Line {} is missing characters.";
pub const LINE_MALFORMED: &str = "Line {} could not be read.";
pub const LINE_PREFIX: &str = "Line {}: {}";
pub const GENERIC_ERROR: &str =
    "An unexpected error occurred while processing the file. Please contact support.";

// Field-level
pub const FIELD_REQUIRED: &str = "{} is required.";
pub const FIELD_NOT_ALLOWED: &str = "{} value {} is not allowed.";
pub const FIELD_TOO_LONG: &str = "{} must be at most {} characters.";
pub const FIELD_NOT_INTEGER: &str = "{} value {} must be a whole number.";
pub const FIELD_NOT_DECIMAL: &str = "{} value {} must be a number.";
pub const FIELD_OUT_OF_RANGE: &str = "{} value {} must be between {} and {}.";
pub const FIELD_MALFORMED: &str = "{} value {} is not in the expected format.";
pub const UNKNOWN_MINCODE: &str = "School {} could not be found.";
pub const SCHOOL_LOOKUP_UNAVAILABLE: &str =
    "School lookup for {} did not complete; try again later.";

// Key-file scope
pub const SESSION_MISMATCH: &str = "Assessment session {} does not match the file session {}.";
pub const ASSESSMENT_TYPE_MISMATCH: &str =
    "Assessment code {} does not match the file assessment type {}.";
pub const FORM_CODE_MISMATCH: &str = "Form code {} does not belong to assessment {} in session {}.";
pub const MC_ANSWER_REQUIRED: &str =
    "Correct answer is required for multiple-choice question {}.";

// Identity resolution
pub const STUDENT_NOT_FOUND: &str = "No student record exists for PEN {}.";
pub const MERGE_CHAIN_UNRESOLVED: &str = "PEN {} could not be resolved to an active student.";
pub const LOOKUP_UNAVAILABLE: &str = "Student lookup for PEN {} did not complete; try again later.";

// Registration rules
pub const PEN_INVALID: &str = "Student PEN {} does not exist in the PEN system.";
pub const SCHOOL_INVALID: &str = "School of record {} is not an open school.";
pub const ASSESSMENT_CENTRE_INVALID: &str = "Assessment centre {} is not an open school.";
pub const ASSESSMENT_INVALID: &str = "Assessment {} is not available in this session.";
pub const DUPLICATE_REGISTRATION: &str = "Student is already registered for assessment {}.";
pub const NUMBER_OF_ATTEMPTS_EXCEEDED: &str =
    "Student has already written {} the maximum of {} times.";
pub const CSF_FRENCH_IMMERSION: &str =
    "Students at francophone (CSF) schools cannot register for {}.";
pub const DEMOGRAPHIC_SUBMITTED_BLANK: &str =
    "{} mismatch. School submitted a blank value and the Ministry PEN system has: {}.";
pub const DEMOGRAPHIC_DIFFERENT: &str =
    "{} mismatch. School submitted: {} and the Ministry PEN system has: {}.";
pub const DEMOGRAPHIC_MINISTRY_BLANK: &str =
    "{} mismatch. School submitted: {} but the Ministry PEN system has a blank value.";
pub const WRITTEN_ASSESSMENT_WITHDRAWAL: &str =
    "Student has already written {} and cannot be withdrawn.";

/// Substitute `args` into `template`, left to right.
///
/// Surplus arguments are ignored; placeholders without an argument are left
/// in place.
pub fn fill_template(template: &str, args: &[&dyn fmt::Display]) -> String {
    let mut out = String::with_capacity(template.len() + 16 * args.len());
    let mut rest = template;
    let mut args = args.iter();
    while let Some(pos) = rest.find(PLACEHOLDER) {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => {
                let _ = write!(out, "{arg}");
            }
            None => out.push_str(PLACEHOLDER),
        }
        rest = &rest[pos + PLACEHOLDER.len()..];
    }
    out.push_str(rest);
    out
}
