//! Fixed-width decoding without a header row.

use assess_model::messages::{self, fill_template};
use assess_model::{ParseError, ParseErrorKind, ParsedRow};

use crate::layout::FixedWidthLayout;
use crate::table::DecodedTable;

/// Decode fixed-width text, one row per line.
///
/// Widths are measured in characters. Every physical line counts as a data
/// row, so a trailing blank line shows up as a short last row.
pub fn decode_fixed_width(text: &str, layout: &FixedWidthLayout) -> DecodedTable {
    let width = layout.width();
    let mut table = DecodedTable {
        headers: layout.column_names(),
        ..DecodedTable::default()
    };

    for (offset, line) in text.lines().enumerate() {
        let index = offset + 1;
        table.total_rows = index;
        let chars: Vec<char> = line.chars().collect();
        let found = chars.len();

        if found != width {
            let (kind, template) = if found > width {
                (
                    ParseErrorKind::TooLong {
                        expected: width,
                        found,
                    },
                    messages::LINE_TOO_LONG,
                )
            } else {
                (
                    ParseErrorKind::TooShort {
                        expected: width,
                        found,
                    },
                    messages::LINE_TOO_SHORT,
                )
            };
            tracing::debug!(row = index, expected = width, found, "fixed-width row length mismatch");
            table.errors.push(ParseError {
                row_index: index,
                kind,
                description: fill_template(template, &[&index]),
            });
            continue;
        }

        let mut row = ParsedRow::with_capacity(index, layout.columns.len());
        for column in &layout.columns {
            let cell: String = chars[column.start..column.end()].iter().collect();
            row.push(column.name.as_str(), &cell);
        }
        table.rows.push(row);
    }
    table
}
