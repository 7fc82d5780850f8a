//! Delimiter-separated decoding with a header row.

use csv::ReaderBuilder;

use assess_model::messages::{self, fill_template};
use assess_model::{ParseError, ParseErrorKind, ParsedRow};

use crate::layout::DelimitedLayout;
use crate::table::DecodedTable;

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_cell(raw: &str) -> &str {
    raw.trim().trim_matches('\u{feff}')
}

/// Decode delimited text. The first record is the header row.
///
/// Records with more or fewer cells than the header are recorded as
/// row-length errors; records the reader cannot parse are recorded as
/// malformed. Decoding always continues with the next record.
pub fn decode_delimited(text: &str, layout: &DelimitedLayout) -> DecodedTable {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(layout.delimiter_byte())
        .quote(layout.quote_byte())
        .from_reader(text.as_bytes());

    let mut table = DecodedTable::default();
    let mut records = reader.records();

    match records.next() {
        Some(Ok(header)) => {
            table.headers = header.iter().map(normalize_header).collect();
        }
        Some(Err(err)) => {
            tracing::debug!(error = %err, "header row could not be read");
            return table;
        }
        None => return table,
    }

    let expected = table.headers.len();
    for (offset, record) in records.enumerate() {
        let index = offset + 1;
        table.total_rows = index;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                tracing::debug!(row = index, error = %err, "malformed delimited row");
                table.errors.push(ParseError {
                    row_index: index,
                    kind: ParseErrorKind::Malformed,
                    description: fill_template(messages::LINE_MALFORMED, &[&index]),
                });
                continue;
            }
        };

        let found = record.len();
        if found != expected {
            let (kind, template) = if found > expected {
                (ParseErrorKind::TooLong { expected, found }, messages::LINE_TOO_LONG)
            } else {
                (ParseErrorKind::TooShort { expected, found }, messages::LINE_TOO_SHORT)
            };
            tracing::debug!(row = index, expected, found, "delimited row length mismatch");
            table.errors.push(ParseError {
                row_index: index,
                kind,
                description: fill_template(template, &[&index]),
            });
            continue;
        }

        let mut row = ParsedRow::with_capacity(index, expected);
        for (header, cell) in table.headers.iter().zip(record.iter()) {
            row.push(header.as_str(), normalize_cell(cell));
        }
        table.rows.push(row);
    }
    table
}
