//! Raw and typed records produced while ingesting a file.

use serde::{Deserialize, Serialize};

use crate::codes::CourseStatus;
use crate::ids::Pen;

/// One decoded data row: ordered column-name/value pairs.
///
/// `index` is 1-based from the first data row (header excluded). Empty cells
/// are stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRow {
    pub index: usize,
    pub fields: Vec<(String, Option<String>)>,
}

impl ParsedRow {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            fields: Vec::new(),
        }
    }

    pub fn with_capacity(index: usize, capacity: usize) -> Self {
        Self {
            index,
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Append a column; blank values become `None`.
    ///
    /// Non-blank values are kept as given so position-sensitive cells can be
    /// read back with [`Self::get_raw`].
    pub fn push(&mut self, column: impl Into<String>, value: &str) {
        let value = (!value.trim().is_empty()).then(|| value.to_string());
        self.fields.push((column.into(), value));
    }

    /// Trimmed value of `column`, or `None` when absent or blank.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.get_raw(column).map(str::trim)
    }

    /// Untrimmed value of `column`, or `None` when absent or blank.
    pub fn get_raw(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.fields
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(column))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Classification of a structural row problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    TooLong { expected: usize, found: usize },
    TooShort { expected: usize, found: usize },
    Malformed,
}

/// A structural problem with one row, recorded instead of raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub row_index: usize,
    pub kind: ParseErrorKind,
    pub description: String,
}

impl ParseError {
    pub fn is_row_length(&self) -> bool {
        matches!(
            self.kind,
            ParseErrorKind::TooLong { .. } | ParseErrorKind::TooShort { .. }
        )
    }
}

/// One scoring-key row from an answer-key file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub session_token: String,
    pub assessment_type: String,
    pub form_code: String,
    pub question_number: u32,
    pub item_type: String,
    pub correct_answer: Option<String>,
    pub mark_value: u32,
    pub cognitive_level: Option<String>,
    pub task_code: Option<String>,
    pub claim_code: Option<String>,
    pub context_code: Option<String>,
    pub concept_code: Option<String>,
    pub scale_factor: Option<f64>,
    pub irt_column: Option<u32>,
    pub section_code: Option<String>,
}

/// One student row from a scanner result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub pen: Pen,
    pub mincode: String,
    pub component_type: String,
    pub component_sub_type: String,
    pub special_case: Option<String>,
    pub adapted_assessment: Option<String>,
    /// One entry per open-ended cell; `None` for a blank cell.
    pub open_ended_marks: Vec<Option<f64>>,
    pub mc_marks: String,
    pub proficiency_score: Option<u8>,
    pub irt_score: Option<f64>,
    pub choice_path: Option<String>,
}

/// One candidate row from a registration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub pen: Pen,
    pub surname: Option<String>,
    pub given_name: Option<String>,
    pub school_of_record: String,
    pub assessment_centre: Option<String>,
    pub course_status: CourseStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells_become_none() {
        let mut row = ParsedRow::new(1);
        row.push("PEN", " 123456789 ");
        row.push("MINCODE", "   ");
        assert_eq!(row.get("PEN"), Some("123456789"));
        assert_eq!(row.get_raw("PEN"), Some(" 123456789 "));
        assert_eq!(row.get("MINCODE"), None);
        assert!(row.has_column("mincode"));
        assert!(!row.has_column("CHOICE_PATH"));
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["PEN", "MINCODE"]);
    }

    #[test]
    fn row_length_classification() {
        let err = ParseError {
            row_index: 2,
            kind: ParseErrorKind::TooShort {
                expected: 110,
                found: 90,
            },
            description: String::new(),
        };
        assert!(err.is_row_length());
        let malformed = ParseError {
            kind: ParseErrorKind::Malformed,
            ..err
        };
        assert!(!malformed.is_row_length());
    }
}
