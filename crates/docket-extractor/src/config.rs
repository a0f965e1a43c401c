//! Configuration for the extraction pipeline

use serde::{Deserialize, Serialize};

/// Configuration for the pipeline driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// File extensions treated as documents (without the dot, case-insensitive)
    pub extensions: Vec<String>,

    /// Name of the per-folder directory receiving committed sources
    pub processed_dir_name: String,

    /// Suffix appended to the source stem for the result file
    pub result_suffix: String,

    /// Skip documents with no words instead of submitting them
    pub skip_empty_documents: bool,

    /// Accept top-level JSON arrays as results
    pub allow_array_responses: bool,
}

impl PipelineConfig {
    /// Whether `extension` names a document file
    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.extensions.is_empty() {
            return Err("extensions must list at least one extension".to_string());
        }
        if self.extensions.iter().any(|ext| ext.trim_start_matches('.').is_empty()) {
            return Err("extensions must not contain empty entries".to_string());
        }
        if self.processed_dir_name.trim().is_empty() {
            return Err("processed_dir_name must not be empty".to_string());
        }
        if self.processed_dir_name.contains(['/', '\\']) {
            return Err("processed_dir_name must be a single path segment".to_string());
        }
        if self.result_suffix.is_empty() {
            return Err("result_suffix must not be empty".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["txt".to_string()],
            processed_dir_name: "Processed".to_string(),
            result_suffix: "_result.json".to_string(),
            skip_empty_documents: false,
            allow_array_responses: true,
        }
    }
}
