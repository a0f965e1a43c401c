//! Commit a processed document: write its result, then move the source
//!
//! The result file is written first and the source moved second. A document
//! whose source is still in place has not been committed and is picked up
//! again by the next run.

use crate::error::TransitionError;
use docket_domain::Document;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Where a committed document's files ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// The written `<stem>_result.json`
    pub result_path: PathBuf,
    /// The source file's new location
    pub processed_path: PathBuf,
}

/// Writes result files and moves sources into the processed area
#[derive(Debug, Clone)]
pub struct FileStateTransitioner {
    processed_dir_name: String,
    result_suffix: String,
}

impl FileStateTransitioner {
    /// Create a transitioner
    pub fn new(processed_dir_name: impl Into<String>, result_suffix: impl Into<String>) -> Self {
        Self {
            processed_dir_name: processed_dir_name.into(),
            result_suffix: result_suffix.into(),
        }
    }

    /// Result file path for a source: `<parent>/<stem><suffix>`
    pub fn result_path_for(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        parent_of(source).join(format!("{}{}", stem, self.result_suffix))
    }

    /// Processed location for a source: `<parent>/<processed>/<file name>`
    pub fn processed_path_for(&self, source: &Path) -> PathBuf {
        let dir = parent_of(source).join(&self.processed_dir_name);
        match source.file_name() {
            Some(name) => dir.join(name),
            None => dir,
        }
    }

    /// Write the result for `document` and move its source
    ///
    /// An existing result file or processed copy is replaced. If the move
    /// fails the result file is removed again so the document stays
    /// uncommitted.
    pub fn commit(&self, document: &Document, value: &Value) -> Result<CommitReceipt, TransitionError> {
        let result_path = self.result_path_for(&document.path);
        write_result(&result_path, value)?;
        debug!("Wrote {}", result_path.display());

        let processed_path = self.processed_path_for(&document.path);
        if let Err(move_error) = move_source(&document.path, &processed_path) {
            return Err(match fs::remove_file(&result_path) {
                Ok(()) => TransitionError::MoveSource {
                    from: document.path.clone(),
                    to: processed_path,
                    source: move_error,
                },
                Err(rollback_error) => {
                    error!(
                        "Rollback of {} failed after move error: {}",
                        result_path.display(),
                        rollback_error
                    );
                    TransitionError::Inconsistent {
                        result_path,
                        source_path: document.path.clone(),
                        detail: format!("move: {}; rollback: {}", move_error, rollback_error),
                    }
                }
            });
        }
        debug!("Moved {} to {}", document.path.display(), processed_path.display());

        Ok(CommitReceipt {
            result_path,
            processed_path,
        })
    }
}

impl Default for FileStateTransitioner {
    fn default() -> Self {
        Self::new("Processed", "_result.json")
    }
}

fn parent_of(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

/// Serialize `{"response": value}` with 4-space indentation and replace
/// `path` atomically through a sibling temp file
fn write_result(path: &Path, value: &Value) -> Result<(), TransitionError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    json!({ "response": value }).serialize(&mut serializer)?;

    let write_error = |source: std::io::Error| TransitionError::WriteResult {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent_of(path)).map_err(write_error)?;
    temp.write_all(&buf).map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

fn move_source(source: &Path, destination: &Path) -> std::io::Result<()> {
    if let Some(dir) = destination.parent() {
        fs::create_dir_all(dir)?;
    }
    if destination.exists() {
        fs::remove_file(destination)?;
    }
    fs::rename(source, destination)
}
