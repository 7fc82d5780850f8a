//! Decoder output: rows plus recorded structural errors.

use assess_model::{ParseError, ParsedRow};

/// Result of decoding one payload.
///
/// Rows and errors are both indexed from 1 (first data row, header excluded).
/// `total_rows` counts every data line the decoder saw, good or bad.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedTable {
    pub headers: Vec<String>,
    pub rows: Vec<ParsedRow>,
    pub errors: Vec<ParseError>,
    pub total_rows: usize,
}

impl DecodedTable {
    /// No data rows and no errors.
    pub fn is_empty(&self) -> bool {
        self.total_rows == 0
    }

    /// A row-length error on the last data line is legacy trailer padding.
    pub fn is_benign_trailer(&self, error: &ParseError) -> bool {
        error.is_row_length() && error.row_index == self.total_rows
    }

    /// Errors that are not benign trailer noise, in row order.
    pub fn blocking_errors(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter().filter(|e| !self.is_benign_trailer(e))
    }

    pub fn first_blocking_error(&self) -> Option<&ParseError> {
        self.blocking_errors().next()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_model::ParseErrorKind;

    fn too_short(row_index: usize) -> ParseError {
        ParseError {
            row_index,
            kind: ParseErrorKind::TooShort {
                expected: 10,
                found: 4,
            },
            description: String::new(),
        }
    }

    #[test]
    fn test_trailer_on_last_row_is_benign() {
        let table = DecodedTable {
            errors: vec![too_short(3)],
            total_rows: 3,
            ..DecodedTable::default()
        };
        assert!(table.first_blocking_error().is_none());
    }

    #[test]
    fn test_row_length_error_before_last_row_blocks() {
        let table = DecodedTable {
            errors: vec![too_short(2), too_short(3)],
            total_rows: 3,
            ..DecodedTable::default()
        };
        let blocking: Vec<usize> = table.blocking_errors().map(|e| e.row_index).collect();
        assert_eq!(blocking, vec![2]);
    }

    #[test]
    fn test_malformed_last_row_is_not_benign() {
        let table = DecodedTable {
            errors: vec![ParseError {
                kind: ParseErrorKind::Malformed,
                ..too_short(3)
            }],
            total_rows: 3,
            ..DecodedTable::default()
        };
        assert!(table.first_blocking_error().is_some());
    }
}
