//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Prompt file could not be loaded
    #[error(transparent)]
    Catalog(#[from] docket_extractor::CatalogError),

    /// Pipeline could not start
    #[error(transparent)]
    Extractor(#[from] docket_extractor::ExtractorError),

    /// Backend could not be constructed
    #[error("Backend error: {0}")]
    Backend(#[from] docket_llm::BackendError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Logging could not be initialized
    #[error("Logging error: {0}")]
    Logging(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Interactive input was cancelled
    #[error("Cancelled")]
    Cancelled,
}
