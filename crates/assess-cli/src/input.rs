//! Turning command-line inputs into upload payloads.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use assess_core::FileUpload;
use assess_model::FileCategory;

/// Read a file from disk as an upload named after the file.
pub fn upload_from_file(path: &Path, category: FileCategory) -> Result<FileUpload> {
    let contents = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    tracing::debug!(file = %file_name, bytes = contents.len(), "read upload from disk");
    Ok(FileUpload::new(file_name, category, &contents))
}

/// Read a JSON upload payload.
///
/// The declared file type must agree with `category`.
pub fn upload_from_payload(path: &Path, category: FileCategory) -> Result<FileUpload> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read payload {}", path.display()))?;
    let upload: FileUpload = serde_json::from_str(&content)
        .with_context(|| format!("parse payload {}", path.display()))?;
    if upload.file_type != category {
        bail!(
            "payload declares a {} file but --kind is {}",
            upload.file_type,
            category
        );
    }
    Ok(upload)
}
