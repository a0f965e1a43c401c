//! Pipeline driver: discover, resolve, chunk, invoke, validate, commit

use crate::catalog::PromptCatalog;
use crate::chunking::ChunkPlanner;
use crate::config::PipelineConfig;
use crate::error::{ExtractorError, ValidationError};
use crate::report::{FileReport, PlannedFile, RunReport};
use crate::transition::FileStateTransitioner;
use crate::validator::ResponseValidator;
use docket_domain::traits::Backend;
use docket_domain::{folder_key_for, Document, FailureKind, InvocationStatus, ProcessingOutcome};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;
use walkdir::WalkDir;

/// Processes every document under a root folder, one at a time
pub struct PipelineDriver<B: Backend> {
    backend: B,
    catalog: PromptCatalog,
    config: PipelineConfig,
    planner: ChunkPlanner,
    validator: ResponseValidator,
    transitioner: FileStateTransitioner,
}

impl<B: Backend> PipelineDriver<B> {
    /// Create a driver
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::Config` if the pipeline configuration is invalid.
    pub fn new(backend: B, catalog: PromptCatalog, config: PipelineConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        Ok(Self {
            validator: ResponseValidator::new(config.allow_array_responses),
            transitioner: FileStateTransitioner::new(
                config.processed_dir_name.clone(),
                config.result_suffix.clone(),
            ),
            planner: ChunkPlanner::default(),
            backend,
            catalog,
            config,
        })
    }

    /// Size chunks for a backend with this context window
    pub fn with_context_tokens(mut self, context_tokens: usize) -> Self {
        self.planner = ChunkPlanner::new(context_tokens);
        self
    }

    /// The backend in use
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The prompt catalog in use
    pub fn catalog(&self) -> &PromptCatalog {
        &self.catalog
    }

    /// List documents under `root` in processing order
    ///
    /// Files directly in `root` are ignored, as is every directory named
    /// like the processed folder and everything beneath it.
    ///
    /// Only segments below `root` are checked, so a root that itself lies
    /// inside a processed folder is still walked.
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, ExtractorError> {
        check_root(root)?;

        let processed = self.config.processed_dir_name.as_str();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !(entry.file_type().is_dir() && entry.file_name() == processed)
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable path: {}", e);
                    continue;
                }
            };
            if entry.depth() < 2 || !entry.file_type().is_file() {
                continue;
            }
            let accepted = entry
                .path()
                .extension()
                .is_some_and(|ext| self.config.accepts_extension(&ext.to_string_lossy()));
            if accepted {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Discovered documents with the prompt each would use, without invoking the backend
    pub fn preview(&self, root: &Path) -> Result<Vec<PlannedFile>, ExtractorError> {
        Ok(self
            .discover(root)?
            .into_iter()
            .map(|path| {
                let folder_key = folder_key_for(&path);
                let prompt_name = self
                    .catalog
                    .resolve(&folder_key)
                    .map(|entry| entry.prompt_name.clone());
                PlannedFile {
                    path,
                    folder_key,
                    prompt_name,
                }
            })
            .collect())
    }

    /// Process every document under `root`
    ///
    /// Per-document failures are recorded in the report and never abort the
    /// run.
    ///
    /// # Errors
    ///
    /// Returns error only if `root` is missing or not a directory.
    pub async fn run(&self, root: &Path) -> Result<RunReport, ExtractorError> {
        let run_id = Uuid::now_v7();
        self.run_inner(root, run_id)
            .instrument(info_span!("run", %run_id))
            .await
    }

    async fn run_inner(&self, root: &Path, run_id: Uuid) -> Result<RunReport, ExtractorError> {
        let started = Instant::now();
        let paths = self.discover(root)?;

        if paths.is_empty() {
            info!("No documents found under {}", root.display());
        } else {
            info!(
                "Found {} documents under {} (backend: {})",
                paths.len(),
                root.display(),
                self.backend.name()
            );
        }

        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            files.push(self.process_file(path).await);
        }

        let report = RunReport {
            run_id,
            root: root.to_path_buf(),
            files,
            elapsed: started.elapsed(),
        };
        report.log_summary();
        Ok(report)
    }

    /// Take one document to its terminal outcome
    pub async fn process_file(&self, path: &Path) -> FileReport {
        let started = Instant::now();
        let mut report = FileReport {
            path: path.to_path_buf(),
            folder_key: folder_key_for(path),
            prompt_name: None,
            outcome: ProcessingOutcome::Skipped {
                kind: FailureKind::PromptNotFound,
                reason: String::new(),
            },
            chunks: 0,
            elapsed: Default::default(),
        };

        report.outcome = self.process_into(path, &mut report).await;
        report.elapsed = started.elapsed();

        match &report.outcome {
            ProcessingOutcome::Committed { .. } => info!(
                "Processed {} in {:.2}s",
                path.display(),
                report.elapsed.as_secs_f64()
            ),
            ProcessingOutcome::Skipped { kind, reason } => warn!(
                "Skipped {} (folder '{}'): {}: {}",
                path.display(),
                report.folder_key,
                kind,
                reason
            ),
            ProcessingOutcome::Failed { kind, reason } if kind.needs_operator() => error!(
                "Failed {} (folder '{}', prompt '{}'): {}: {}",
                path.display(),
                report.folder_key,
                report.prompt_name.as_deref().unwrap_or("-"),
                kind,
                reason
            ),
            ProcessingOutcome::Failed { kind, reason } => warn!(
                "Failed {} (folder '{}', prompt '{}'): {}: {}",
                path.display(),
                report.folder_key,
                report.prompt_name.as_deref().unwrap_or("-"),
                kind,
                reason
            ),
        }
        report
    }

    async fn process_into(&self, path: &Path, report: &mut FileReport) -> ProcessingOutcome {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) => return failed(FailureKind::DocumentRead, format!("cannot read file: {}", e)),
        };
        let document = Document::new(path, &contents);
        drop(contents);

        let Some(entry) = self.catalog.resolve(&document.folder_key) else {
            return skipped(
                FailureKind::PromptNotFound,
                format!("no prompt for folder '{}'", document.folder_key),
            );
        };
        report.prompt_name = Some(entry.prompt_name.clone());

        if self.config.skip_empty_documents && document.is_empty() {
            return skipped(FailureKind::DocumentRead, "document is empty".to_string());
        }

        let chunks = self.planner.plan(&entry.prompt_text, &document.raw_text);
        report.chunks = chunks.len();
        debug!(
            "{}: {} chunks of at most {} words",
            path.display(),
            chunks.len(),
            chunks.first().map(|c| c.token_budget).unwrap_or_default()
        );

        let mut raw_texts = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let result = self.backend.invoke(&entry.prompt_text, &chunk.text).await;
            match result.status {
                // Decoding is left to the validator, which also strips code fences
                InvocationStatus::Success | InvocationStatus::ParseError => {
                    raw_texts.push(result.raw_text);
                }
                status => {
                    let kind = FailureKind::from_result(&result).unwrap_or(FailureKind::BackendTransport);
                    let detail = result.detail.unwrap_or_else(|| status.to_string());
                    return failed(kind, format!("chunk {}: {}", chunk.sequence_index, detail));
                }
            }
        }

        let value = match self.validate_responses(path, &raw_texts) {
            Ok(value) => value,
            Err(e) => return failed(FailureKind::ResponseParse, e.to_string()),
        };

        match self.transitioner.commit(&document, &value) {
            Ok(receipt) => ProcessingOutcome::Committed {
                result_path: receipt.result_path,
                processed_path: receipt.processed_path,
            },
            Err(e) => failed(FailureKind::Persistence, e.to_string()),
        }
    }

    /// Validate the joined chunk responses
    ///
    /// When the joined text is not one JSON value, the first chunk response
    /// that validates on its own is kept and the rest are dropped.
    fn validate_responses(&self, path: &Path, raw_texts: &[String]) -> Result<Value, ValidationError> {
        let joined = self.validator.validate(&raw_texts.join("\n"));
        if joined.is_ok() || raw_texts.len() < 2 {
            return joined;
        }

        for (index, raw_text) in raw_texts.iter().enumerate() {
            if let Ok(value) = self.validator.validate(raw_text) {
                warn!(
                    "{}: chunk responses do not join into one JSON value, keeping chunk {} and dropping {} other(s)",
                    path.display(),
                    index,
                    raw_texts.len() - 1
                );
                return Ok(value);
            }
        }
        joined
    }
}

fn check_root(root: &Path) -> Result<(), ExtractorError> {
    if !root.exists() {
        return Err(ExtractorError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ExtractorError::RootNotDirectory(root.to_path_buf()));
    }
    Ok(())
}

fn skipped(kind: FailureKind, reason: String) -> ProcessingOutcome {
    ProcessingOutcome::Skipped { kind, reason }
}

fn failed(kind: FailureKind, reason: String) -> ProcessingOutcome {
    ProcessingOutcome::Failed { kind, reason }
}
