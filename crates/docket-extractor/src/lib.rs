//! Docket Extractor
//!
//! Walks a folder tree of text documents, sends each one to an LLM backend
//! with the prompt configured for its folder, and commits the structured
//! JSON answer next to the source.
//!
//! # Architecture
//!
//! ```text
//! root/ → discover → PromptCatalog → ChunkPlanner → Backend → ResponseValidator → FileStateTransitioner
//! ```
//!
//! # Key Features
//!
//! - **Folder-keyed prompts**: a document's parent folder name selects its prompt
//! - **Word-budget chunking**: long documents are split to fit the backend context
//! - **Failure isolation**: every failure is attributed to one document; the batch continues
//! - **Resumable runs**: a document only leaves its folder once its result is written
//!
//! # Example Usage
//!
//! ```no_run
//! use docket_extractor::{PipelineConfig, PipelineDriver, PromptCatalog};
//! use docket_llm::MockBackend;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = PromptCatalog::load(Path::new("prompts.csv"))?;
//! let backend = MockBackend::new(r#"{"total": 100}"#);
//!
//! let driver = PipelineDriver::new(backend, catalog, PipelineConfig::default())?;
//! let report = driver.run(Path::new("/docs")).await?;
//!
//! println!("Committed: {}", report.committed());
//! println!("Failed: {}", report.failed());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod catalog;
mod chunking;
mod config;
mod error;
mod pipeline;
mod report;
mod transition;
mod validator;

#[cfg(test)]
mod tests;

pub use catalog::{PromptCatalog, PROMPT_SHEET_NAME};
pub use chunking::{ChunkPlanner, DEFAULT_CONTEXT_TOKENS};
pub use config::PipelineConfig;
pub use error::{CatalogError, ExtractorError, TransitionError, ValidationError};
pub use pipeline::PipelineDriver;
pub use report::{FileReport, PlannedFile, RunReport};
pub use transition::{CommitReceipt, FileStateTransitioner};
pub use validator::{ResponseShape, ResponseValidator};
