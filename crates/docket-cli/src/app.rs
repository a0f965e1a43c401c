//! Run orchestration: catalog, backend and pipeline wiring.

use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use docket_extractor::{ExtractorError, PipelineDriver, PromptCatalog};
use docket_llm::BackendClient;
use std::path::Path;
use tracing::info;

/// Check that the root folder exists before anything is written into it.
pub fn check_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(ExtractorError::RootNotFound(root.to_path_buf()).into());
    }
    if !root.is_dir() {
        return Err(ExtractorError::RootNotDirectory(root.to_path_buf()).into());
    }
    Ok(())
}

/// Process `root` (or preview it when `dry_run` is set) and render the outcome.
pub async fn execute(config: &Config, root: &Path, dry_run: bool, formatter: &Formatter) -> Result<String> {
    config.validate()?;
    check_root(root)?;

    let prompts = config.prompts_path()?;
    let catalog = PromptCatalog::load(prompts)?;
    info!("Loaded {} prompts from {}", catalog.len(), prompts.display());

    let backend = BackendClient::from_config(&config.backend)?;
    let driver = PipelineDriver::new(backend, catalog, config.pipeline.clone())?
        .with_context_tokens(config.backend.context_tokens);

    if dry_run {
        let planned = driver.preview(root)?;
        return formatter.format_preview(root, &planned);
    }

    let report = driver.run(root).await?;
    formatter.format_report(&report)
}
