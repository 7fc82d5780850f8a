use serde::{Deserialize, Serialize};

use crate::codes::FileCategory;

/// An uploaded file for the duration of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub category: FileCategory,
    pub contents: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, category: FileCategory, contents: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            category,
            contents,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contents.iter().all(u8::is_ascii_whitespace)
    }

    /// Extension after the last dot, if any.
    pub fn extension(&self) -> Option<&str> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        (!stem.is_empty() && !ext.is_empty()).then_some(ext)
    }
}
