//! Column-layout descriptions for the tabular decoder.

use std::path::Path;

use serde::{Deserialize, Serialize};

use assess_model::FieldCode;

use crate::error::{IngestError, Result};

/// How a payload is split into rows and columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Layout {
    /// Delimiter-separated values with a header row.
    Delimited(DelimitedLayout),
    /// Fixed-width columns without a header row.
    FixedWidth(FixedWidthLayout),
}

impl Layout {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Delimited(layout) => layout.validate(),
            Self::FixedWidth(layout) => layout.validate(),
        }
    }

    pub fn has_header(&self) -> bool {
        matches!(self, Self::Delimited(_))
    }
}

/// Delimiter-separated layout. Column names come from the header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimitedLayout {
    pub delimiter: char,
    #[serde(default = "default_quote")]
    pub quote: char,
}

fn default_quote() -> char {
    '"'
}

impl DelimitedLayout {
    pub fn new(delimiter: char, quote: char) -> Self {
        Self { delimiter, quote }
    }

    pub fn tab() -> Self {
        Self::new('\t', default_quote())
    }

    pub fn comma() -> Self {
        Self::new(',', default_quote())
    }

    pub(crate) fn delimiter_byte(&self) -> u8 {
        ascii_byte(self.delimiter)
    }

    pub(crate) fn quote_byte(&self) -> u8 {
        ascii_byte(self.quote)
    }

    fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() || !self.quote.is_ascii() {
            return Err(IngestError::InvalidLayout {
                reason: "delimiter and quote must be ASCII characters".to_string(),
            });
        }
        if self.delimiter == self.quote {
            return Err(IngestError::InvalidLayout {
                reason: "delimiter and quote must differ".to_string(),
            });
        }
        Ok(())
    }
}

fn ascii_byte(ch: char) -> u8 {
    u8::try_from(u32::from(ch)).unwrap_or(b'?')
}

/// One fixed-width column: zero-based character offset and length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedWidthColumn {
    pub name: String,
    pub start: usize,
    pub length: usize,
}

impl FixedWidthColumn {
    pub fn new(name: impl Into<String>, start: usize, length: usize) -> Self {
        Self {
            name: name.into(),
            start,
            length,
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// Fixed-width layout: every line must be exactly [`Self::width`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedWidthLayout {
    pub columns: Vec<FixedWidthColumn>,
}

impl FixedWidthLayout {
    pub fn new(columns: Vec<FixedWidthColumn>) -> Self {
        Self { columns }
    }

    /// Lay columns out back to back from offset zero.
    pub fn contiguous<'a>(columns: impl IntoIterator<Item = (&'a str, usize)>) -> Self {
        let mut start = 0;
        let columns = columns
            .into_iter()
            .map(|(name, length)| {
                let column = FixedWidthColumn::new(name, start, length);
                start += length;
                column
            })
            .collect();
        Self { columns }
    }

    /// Expected line width in characters.
    pub fn width(&self) -> usize {
        self.columns.iter().map(FixedWidthColumn::end).max().unwrap_or(0)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(IngestError::InvalidLayout {
                reason: "fixed-width layout has no columns".to_string(),
            });
        }
        let mut sorted: Vec<&FixedWidthColumn> = self.columns.iter().collect();
        sorted.sort_by_key(|c| c.start);
        for column in &sorted {
            if column.name.trim().is_empty() || column.length == 0 {
                return Err(IngestError::InvalidLayout {
                    reason: format!("column at offset {} is unnamed or empty", column.start),
                });
            }
        }
        for pair in sorted.windows(2) {
            if pair[0].end() > pair[1].start {
                return Err(IngestError::InvalidLayout {
                    reason: format!("columns {} and {} overlap", pair[0].name, pair[1].name),
                });
            }
        }
        Ok(())
    }
}

/// Load a layout template from a TOML file.
pub fn load_layout(path: &Path) -> Result<Layout> {
    let text = std::fs::read_to_string(path).map_err(|source| IngestError::LayoutRead {
        path: path.to_path_buf(),
        source,
    })?;
    let layout: Layout = toml::from_str(&text).map_err(|e| IngestError::LayoutParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    layout.validate()?;
    Ok(layout)
}

/// Built-in scanner result layout (110 characters, no header).
pub fn result_file_layout() -> Layout {
    Layout::FixedWidth(FixedWidthLayout::contiguous([
        (FieldCode::Pen.as_str(), 9),
        (FieldCode::Mincode.as_str(), 8),
        (FieldCode::ComponentType.as_str(), 1),
        (FieldCode::ComponentSubType.as_str(), 1),
        (FieldCode::SpecialCase.as_str(), 1),
        (FieldCode::AdaptedAssessment.as_str(), 1),
        (FieldCode::OpenEndedMarks.as_str(), 40),
        (FieldCode::McMarks.as_str(), 40),
        (FieldCode::ProficiencyScore.as_str(), 1),
        (FieldCode::IrtScore.as_str(), 7),
        (FieldCode::ChoicePath.as_str(), 1),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_layout_width() {
        let Layout::FixedWidth(layout) = result_file_layout() else {
            panic!("result layout must be fixed width");
        };
        assert_eq!(layout.width(), 110);
        assert_eq!(layout.columns[6].name, "OPEN_ENDED_MARKS");
        assert_eq!(layout.columns[6].start, 21);
        assert!(result_file_layout().validate().is_ok());
    }

    #[test]
    fn test_overlapping_columns_are_rejected() {
        let layout = Layout::FixedWidth(FixedWidthLayout::new(vec![
            FixedWidthColumn::new("A", 0, 5),
            FixedWidthColumn::new("B", 4, 2),
        ]));
        assert!(matches!(
            layout.validate(),
            Err(IngestError::InvalidLayout { .. })
        ));
    }

    #[test]
    fn test_delimiter_must_differ_from_quote() {
        let layout = Layout::Delimited(DelimitedLayout::new('"', '"'));
        assert!(layout.validate().is_err());
        assert!(Layout::Delimited(DelimitedLayout::tab()).validate().is_ok());
    }

    #[test]
    fn test_gaps_are_allowed() {
        let layout = FixedWidthLayout::new(vec![
            FixedWidthColumn::new("A", 0, 2),
            FixedWidthColumn::new("B", 5, 2),
        ]);
        assert_eq!(layout.width(), 7);
        assert!(Layout::FixedWidth(layout).validate().is_ok());
    }
}
