//! Docket Domain Layer
//!
//! Core value types shared by every Docket crate. Apart from `serde_json`
//! (backend payloads are schemaless JSON) this crate has no external
//! dependencies and performs no I/O.
//!
//! ## Key Concepts
//!
//! - **Prompt entry**: extraction instructions keyed by folder name
//! - **Document**: a text file plus the folder key derived from its parent
//! - **Chunk**: a word-bounded slice of a document sized to a backend budget
//! - **Invocation result**: what a backend produced for one chunk
//! - **Processing outcome**: the terminal state of one document in a run
//!
//! ## Architecture
//!
//! - Pure data and pure functions only
//! - Infrastructure (HTTP backends, filesystem) lives in other crates
//! - The [`traits::Backend`] trait is the seam between the pipeline and LLMs

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod document;
pub mod invocation;
pub mod outcome;
pub mod prompt;
pub mod traits;

// Re-exports for convenience
pub use chunk::Chunk;
pub use document::{folder_key_for, word_count, Document};
pub use invocation::{InvocationResult, InvocationStatus};
pub use outcome::{FailureKind, ProcessingOutcome};
pub use prompt::PromptEntry;
