//! Byte-to-text decoding for uploaded payloads.

use std::borrow::Cow;

use encoding_rs::WINDOWS_1252;

use crate::error::{IngestError, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decode an uploaded payload to text.
///
/// - UTF-16 byte-order marks are rejected.
/// - A UTF-8 BOM is stripped.
/// - Bytes that are not valid UTF-8 are decoded as Windows-1252, the
///   encoding legacy scanner exports use.
pub fn decode_text(bytes: &[u8]) -> Result<Cow<'_, str>> {
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return Err(IngestError::UnsupportedEncoding {
            encoding: "UTF-16 LE",
        });
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return Err(IngestError::UnsupportedEncoding {
            encoding: "UTF-16 BE",
        });
    }

    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(Cow::Borrowed(text)),
        Err(_) => {
            tracing::debug!("payload is not UTF-8, decoding as Windows-1252");
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            Ok(text)
        }
    }
}
