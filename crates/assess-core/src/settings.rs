//! Pipeline settings, loaded from TOML.
//!
//! Every section is optional; a missing section or key takes its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use assess_ingest::{DelimitedLayout, Layout, load_layout, result_file_layout};
use assess_model::FileCategory;
use assess_validate::RuleSettings;

use crate::error::{PipelineError, Result};

/// All pipeline settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub files: FileSettings,
    pub decoder: DecoderSettings,
    pub identity: IdentitySettings,
    pub rules: RuleSettings,
    pub events: EventSettings,
}

/// Expected file extension per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub key: String,
    pub result: String,
    pub registration: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            key: "txt".to_string(),
            result: "txt".to_string(),
            registration: "csv".to_string(),
        }
    }
}

impl FileSettings {
    pub fn extension_for(&self, category: FileCategory) -> &str {
        match category {
            FileCategory::Key => &self.key,
            FileCategory::Result => &self.result,
            FileCategory::Registration => &self.registration,
        }
    }
}

/// Layout parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderSettings {
    pub key_delimiter: char,
    pub registration_delimiter: char,
    pub quote: char,
    /// Fixed-width template replacing the built-in result layout.
    pub result_layout: Option<PathBuf>,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            key_delimiter: '\t',
            registration_delimiter: ',',
            quote: '"',
            result_layout: None,
        }
    }
}

impl DecoderSettings {
    /// Layout for a file category.
    ///
    /// # Errors
    ///
    /// Fails when the result layout template cannot be read or parsed, or a
    /// configured delimiter is unusable.
    pub fn layout_for(&self, category: FileCategory) -> Result<Layout> {
        let layout = match category {
            FileCategory::Key => {
                Layout::Delimited(DelimitedLayout::new(self.key_delimiter, self.quote))
            }
            FileCategory::Registration => {
                Layout::Delimited(DelimitedLayout::new(self.registration_delimiter, self.quote))
            }
            FileCategory::Result => match &self.result_layout {
                Some(path) => load_layout(path)?,
                None => result_file_layout(),
            },
        };
        layout.validate()?;
        Ok(layout)
    }
}

/// Merge-chain walk bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    pub max_merge_hops: usize,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self { max_merge_hops: 10 }
    }
}

/// Event bus sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    pub capacity: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// Load settings from a TOML file; `None` yields defaults.
///
/// # Errors
///
/// Fails when an explicitly named file cannot be read or parsed.
pub fn load_settings(path: Option<&Path>) -> Result<PipelineSettings> {
    let Some(path) = path else {
        tracing::info!("No settings file given, using defaults");
        return Ok(PipelineSettings::default());
    };

    let content = fs::read_to_string(path).map_err(|source| PipelineError::SettingsRead {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = toml::from_str(&content).map_err(|e| PipelineError::SettingsParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    tracing::info!("Loaded settings from {:?}", path);
    Ok(settings)
}
