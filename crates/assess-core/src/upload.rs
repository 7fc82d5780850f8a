//! Upload payloads as submitted by callers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use assess_model::messages::{self, fill_template};
use assess_model::{FieldCode, FileCategory, IssueCode, UploadedFile, ValidationIssue};

/// A file upload with base64-encoded contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpload {
    pub file_name: String,
    pub base64_contents: String,
    #[serde(alias = "declaredFileType")]
    pub file_type: FileCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, file_type: FileCategory, contents: &[u8]) -> Self {
        Self {
            file_name: file_name.into(),
            base64_contents: STANDARD.encode(contents),
            file_type,
            content_type: None,
        }
    }

    /// Decode the payload.
    ///
    /// Line breaks and other whitespace inside the base64 text are ignored.
    pub fn decode(&self) -> Result<UploadedFile, ValidationIssue> {
        let compact: String = self
            .base64_contents
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let contents = STANDARD.decode(compact.as_bytes()).map_err(|e| {
            tracing::debug!(error = %e, "upload payload is not valid base64");
            ValidationIssue::error(
                FieldCode::File,
                IssueCode::InvalidFileContents,
                fill_template(messages::INVALID_FILE_CONTENTS, &[&self.file_name]),
            )
        })?;
        Ok(UploadedFile {
            file_name: self.file_name.clone(),
            content_type: self.content_type.clone(),
            category: self.file_type,
            contents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_camel_case_payload() {
        let json = r#"{
            "fileName": "TRAX_202409_NME10.txt",
            "base64Contents": "aGVs\nbG8=",
            "fileType": "KEY"
        }"#;
        let upload: FileUpload = serde_json::from_str(json).unwrap();
        let file = upload.decode().unwrap();
        assert_eq!(file.contents, b"hello");
        assert_eq!(file.category, FileCategory::Key);
    }

    #[test]
    fn test_declared_file_type_alias() {
        let json = r#"{"fileName":"a.txt","base64Contents":"","declaredFileType":"RESULT"}"#;
        let upload: FileUpload = serde_json::from_str(json).unwrap();
        assert_eq!(upload.file_type, FileCategory::Result);
    }

    #[test]
    fn test_invalid_base64_is_a_file_error() {
        let upload = FileUpload {
            file_name: "TRAX_202409_NME10.txt".to_string(),
            base64_contents: "not base64!".to_string(),
            file_type: FileCategory::Result,
            content_type: None,
        };
        let issue = upload.decode().unwrap_err();
        assert_eq!(issue.code, IssueCode::InvalidFileContents);
        assert_eq!(issue.message, "File TRAX_202409_NME10.txt could not be decoded.");
    }

    #[test]
    fn test_new_encodes_contents() {
        let upload = FileUpload::new("a.csv", FileCategory::Registration, b"PEN\n");
        assert_eq!(upload.decode().unwrap().contents, b"PEN\n");
    }
}
