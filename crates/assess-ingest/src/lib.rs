//! Tabular decoding for assessment files.
//!
//! Turns raw payload bytes plus a [`Layout`] into a [`DecodedTable`]: ordered
//! [`assess_model::ParsedRow`]s and the structural
//! [`assess_model::ParseError`]s found along the way. Malformed rows never
//! abort decoding; the caller decides whether they reject the file.

pub mod delimited;
pub mod error;
pub mod fixed;
pub mod layout;
pub mod table;
pub mod text;

pub use delimited::decode_delimited;
pub use error::{IngestError, Result};
pub use fixed::decode_fixed_width;
pub use layout::{
    DelimitedLayout, FixedWidthColumn, FixedWidthLayout, Layout, load_layout, result_file_layout,
};
pub use table::DecodedTable;
pub use text::decode_text;

/// Decode text that is already in memory.
pub fn decode_str(text: &str, layout: &Layout) -> DecodedTable {
    match layout {
        Layout::Delimited(layout) => decode_delimited(text, layout),
        Layout::FixedWidth(layout) => decode_fixed_width(text, layout),
    }
}

/// Decode a raw payload.
///
/// Fails only when the bytes cannot be turned into text at all.
pub fn decode(bytes: &[u8], layout: &Layout) -> Result<DecodedTable> {
    let text = decode_text(bytes)?;
    let table = decode_str(&text, layout);
    tracing::debug!(
        rows = table.rows.len(),
        errors = table.errors.len(),
        total = table.total_rows,
        "decoded payload"
    );
    Ok(table)
}
