//! Run reports

use docket_domain::{FailureKind, ProcessingOutcome};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// What happened to one discovered document
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    /// Source path as discovered
    pub path: PathBuf,
    /// Parent folder name
    pub folder_key: String,
    /// Resolved prompt, if any
    pub prompt_name: Option<String>,
    /// Terminal outcome
    pub outcome: ProcessingOutcome,
    /// Chunks sent to the backend
    pub chunks: usize,
    /// Time spent on this document
    pub elapsed: Duration,
}

/// A discovered document and the prompt it would use (dry run)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    /// Source path
    pub path: PathBuf,
    /// Parent folder name
    pub folder_key: String,
    /// Resolved prompt, if any
    pub prompt_name: Option<String>,
}

/// Summary of one pipeline run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Run identifier (UUIDv7, time-ordered)
    pub run_id: Uuid,
    /// Root folder that was walked
    pub root: PathBuf,
    /// Per-document reports in processing order
    pub files: Vec<FileReport>,
    /// Total wall-clock time
    pub elapsed: Duration,
}

impl RunReport {
    /// Documents committed
    pub fn committed(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_committed()).count()
    }

    /// Documents skipped before reaching the backend
    pub fn skipped(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, ProcessingOutcome::Skipped { .. }))
            .count()
    }

    /// Documents that failed
    pub fn failed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, ProcessingOutcome::Failed { .. }))
            .count()
    }

    /// Failures that may need an operator to reconcile files on disk
    pub fn persistence_failures(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.outcome.failure_kind().is_some_and(|k| k.needs_operator()))
            .count()
    }

    /// Discovered document count per folder key
    pub fn folder_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for file in &self.files {
            *counts.entry(file.folder_key.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Failure count per kind
    pub fn failure_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for kind in self.files.iter().filter_map(|f| f.outcome.failure_kind()) {
            *counts.entry(kind.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Mean time per document, `None` for an empty run
    pub fn average_elapsed(&self) -> Option<Duration> {
        let count = u32::try_from(self.files.len()).ok().filter(|n| *n > 0)?;
        let total: Duration = self.files.iter().map(|f| f.elapsed).sum();
        Some(total / count)
    }

    /// Whether every discovered document was committed
    pub fn is_clean(&self) -> bool {
        self.committed() == self.files.len()
    }

    /// Reports of documents that were not committed
    pub fn unresolved(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.outcome.is_committed())
    }

    /// Log the end-of-run summary
    pub fn log_summary(&self) {
        for (folder, count) in self.folder_counts() {
            info!("Folder '{}': {} files", folder, count);
        }
        info!(
            "Run {} finished: {} committed, {} skipped, {} failed in {:.2}s",
            self.run_id,
            self.committed(),
            self.skipped(),
            self.failed(),
            self.elapsed.as_secs_f64()
        );
        if let Some(average) = self.average_elapsed() {
            info!("Average time per file: {:.2}s", average.as_secs_f64());
        }
        let persistence = self.persistence_failures();
        if persistence > 0 {
            warn!(
                "{} documents hit {} failures and may need manual attention",
                persistence,
                FailureKind::Persistence
            );
        }
    }

    /// JSON rendering for machine consumers
    pub fn to_json(&self) -> Value {
        let files: Vec<Value> = self
            .files
            .iter()
            .map(|f| {
                let mut entry = json!({
                    "path": f.path.display().to_string(),
                    "folder": f.folder_key,
                    "prompt": f.prompt_name,
                    "outcome": f.outcome.label(),
                    "chunks": f.chunks,
                    "elapsed_ms": f.elapsed.as_millis() as u64,
                });
                match &f.outcome {
                    ProcessingOutcome::Committed {
                        result_path,
                        processed_path,
                    } => {
                        entry["result_path"] = json!(result_path.display().to_string());
                        entry["processed_path"] = json!(processed_path.display().to_string());
                    }
                    ProcessingOutcome::Skipped { kind, reason }
                    | ProcessingOutcome::Failed { kind, reason } => {
                        entry["kind"] = json!(kind.as_str());
                        entry["reason"] = json!(reason);
                    }
                }
                entry
            })
            .collect();

        json!({
            "run_id": self.run_id.to_string(),
            "root": self.root.display().to_string(),
            "committed": self.committed(),
            "skipped": self.skipped(),
            "failed": self.failed(),
            "persistence_failures": self.persistence_failures(),
            "elapsed_ms": self.elapsed.as_millis() as u64,
            "files": files,
        })
    }
}
