//! Configuration management for the CLI.

use crate::cli::Cli;
use crate::error::{CliError, Result};
use docket_extractor::PipelineConfig;
use docket_llm::BackendConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default name of the per-run log file written into the root folder.
pub const DEFAULT_LOG_FILE_NAME: &str = "process_log.txt";

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Prompt file (`.json`, `.csv` or `.xlsx`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PathBuf>,

    /// LLM backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Write a log file into the root folder
    #[serde(default = "default_true")]
    pub log_file: bool,

    /// Log file name
    #[serde(default = "default_log_file_name")]
    pub log_file_name: String,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".docket").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one the default path is used
    /// when present, otherwise defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(CliError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::load_from(path)
            }
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Apply command-line and environment overrides.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(prompts) = &cli.prompts {
            self.prompts = Some(prompts.clone());
        }
        if let Some(mode) = cli.mode {
            self.backend.mode = mode.into();
        }
        if let Some(endpoint) = &cli.endpoint {
            self.backend.endpoint = endpoint.clone();
        }
        if let Some(model) = &cli.model {
            self.backend.model = model.clone();
        }
        if let Some(api_key) = &cli.api_key {
            self.backend.api_key = Some(api_key.clone());
        }
        if let Some(format) = cli.format {
            self.settings.format = format.into();
        }
        if cli.no_color {
            self.settings.color = false;
        }
    }

    /// Prompt file path, or an error naming how to set it.
    pub fn prompts_path(&self) -> Result<&Path> {
        self.prompts.as_deref().ok_or_else(|| {
            CliError::Config("No prompt file configured; pass --prompts or set `prompts` in the config file".into())
        })
    }

    /// Validate backend and pipeline settings.
    pub fn validate(&self) -> Result<()> {
        self.backend
            .validate()
            .map_err(|e| CliError::Config(format!("backend: {}", e)))?;
        self.pipeline
            .validate()
            .map_err(|e| CliError::Config(format!("pipeline: {}", e)))?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompts: None,
            backend: BackendConfig::default(),
            pipeline: PipelineConfig::default(),
            settings: Settings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            log_file: true,
            log_file_name: DEFAULT_LOG_FILE_NAME.to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_log_file_name() -> String {
    DEFAULT_LOG_FILE_NAME.to_string()
}
