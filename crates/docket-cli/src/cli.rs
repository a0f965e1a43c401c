//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Docket - Extract structured JSON from folders of text documents with an LLM.
#[derive(Debug, Parser)]
#[command(name = "docket")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Root folder to process (asked for interactively when omitted)
    pub root: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, env = "DOCKET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Prompt file (.json, .csv or .xlsx)
    #[arg(short, long, env = "DOCKET_PROMPTS")]
    pub prompts: Option<PathBuf>,

    /// Backend mode
    #[arg(short, long, value_enum, env = "DOCKET_MODE")]
    pub mode: Option<ModeArg>,

    /// Backend base URL
    #[arg(long, env = "DOCKET_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Model identifier
    #[arg(long, env = "DOCKET_MODEL")]
    pub model: Option<String>,

    /// API key for the backend
    #[arg(long, env = "DOCKET_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// List what would be processed without calling the backend
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Log filter (e.g. "info", "docket_extractor=debug")
    #[arg(long, env = "DOCKET_LOG")]
    pub log_level: Option<String>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (unresolved paths only)
    Quiet,
}

/// Backend mode options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ModeArg {
    /// Chat-completions endpoint
    Chat,
    /// Submit/poll/retrieve job service
    Job,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<ModeArg> for docket_llm::BackendMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Chat => docket_llm::BackendMode::Chat,
            ModeArg::Job => docket_llm::BackendMode::Job,
        }
    }
}
