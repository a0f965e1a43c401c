//! Error types for the Extractor

use crate::validator::ResponseShape;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a run before any document is processed
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Root folder is missing
    #[error("Root folder does not exist: {0}")]
    RootNotFound(PathBuf),

    /// Root path exists but is not a directory
    #[error("Root path is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    /// Prompt catalog could not be loaded
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error outside any single document
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors loading the prompt catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Prompt source file is missing
    #[error("Prompt file not found: {0}")]
    NotFound(PathBuf),

    /// Prompt source extension is not `.json`, `.csv` or `.xlsx`
    #[error("Unsupported prompt file format: {0} (expected .json, .csv or .xlsx)")]
    UnsupportedFormat(PathBuf),

    /// Prompt source could not be read
    #[error("Failed to read prompt file: {0}")]
    Io(#[from] std::io::Error),

    /// JSON prompt source is malformed
    #[error("Invalid JSON prompt file: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV prompt source is malformed
    #[error("Invalid CSV prompt file: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook prompt source could not be opened or read
    #[error("Invalid workbook prompt file: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    /// Workbook has no prompt sheet
    #[error("Workbook has no '{0}' sheet")]
    MissingSheet(String),

    /// Prompt table lacks a required column
    #[error("Prompt file is missing the '{0}' column")]
    MissingColumn(String),
}

/// Errors validating a backend response
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Response is empty or only whitespace
    #[error("Response is empty")]
    Empty,

    /// Response is not well-formed JSON
    #[error("Malformed JSON: {0}")]
    Malformed(String),

    /// Response decoded, but to a shape the result writer does not accept
    #[error("Unsupported response shape: {0:?}")]
    UnsupportedShape(ResponseShape),
}

/// Errors committing a processed document
#[derive(Error, Debug)]
pub enum TransitionError {
    /// Result JSON could not be serialized
    #[error("Failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Result file could not be written
    #[error("Failed to write result {path}: {source}")]
    WriteResult {
        /// Destination result path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Source could not be moved; the result file was rolled back
    #[error("Failed to move {from} to {to}: {source}")]
    MoveSource {
        /// Source path
        from: PathBuf,
        /// Intended destination
        to: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Result written but source not moved, and the rollback failed too
    #[error("Inconsistent state: result {result_path} written but {source_path} not moved ({detail})")]
    Inconsistent {
        /// Result file left behind
        result_path: PathBuf,
        /// Source file still in place
        source_path: PathBuf,
        /// Move and rollback failures
        detail: String,
    },
}
