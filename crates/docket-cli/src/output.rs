//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use docket_domain::ProcessingOutcome;
use docket_extractor::{PlannedFile, RunReport};
use std::path::Path;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a finished run.
    pub fn format_report(&self, report: &RunReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&report.to_json())?),
            OutputFormat::Table => Ok(self.format_report_table(report)),
            OutputFormat::Quiet => Ok(report
                .unresolved()
                .map(|f| f.path.display().to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format a dry-run preview.
    pub fn format_preview(&self, root: &Path, planned: &[PlannedFile]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let files: Vec<serde_json::Value> = planned
                    .iter()
                    .map(|p| {
                        serde_json::json!({
                            "path": p.path.display().to_string(),
                            "folder": p.folder_key,
                            "prompt": p.prompt_name,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&serde_json::json!({
                    "root": root.display().to_string(),
                    "files": files,
                }))?)
            }
            OutputFormat::Table => Ok(self.format_preview_table(root, planned)),
            OutputFormat::Quiet => Ok(planned
                .iter()
                .map(|p| p.path.display().to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_report_table(&self, report: &RunReport) -> String {
        if report.files.is_empty() {
            return self.colorize(&format!("No documents found under {}.", report.root.display()), "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["File", "Folder", "Prompt", "Chunks", "Outcome", "Time"]);

        for file in &report.files {
            let detail = match &file.outcome {
                ProcessingOutcome::Committed { .. } => self.colorize("committed", "green"),
                ProcessingOutcome::Skipped { kind, .. } => self.colorize(&format!("skipped ({})", kind), "yellow"),
                ProcessingOutcome::Failed { kind, .. } => self.colorize(&format!("failed ({})", kind), "red"),
            };
            builder.push_record([
                relative(&report.root, &file.path),
                file.folder_key.clone(),
                file.prompt_name.clone().unwrap_or_else(|| "-".to_string()),
                file.chunks.to_string(),
                detail,
                format!("{:.2}s", file.elapsed.as_secs_f64()),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let mut lines = vec![table.to_string(), String::new()];
        lines.push(self.summary(report));
        if let Some(average) = report.average_elapsed() {
            lines.push(self.info(&format!("Average time per file: {:.2}s", average.as_secs_f64())));
        }
        if report.persistence_failures() > 0 {
            lines.push(self.warning(&format!(
                "{} document(s) could not be committed cleanly; check the log before re-running",
                report.persistence_failures()
            )));
        }
        lines.join("\n")
    }

    fn format_preview_table(&self, root: &Path, planned: &[PlannedFile]) -> String {
        if planned.is_empty() {
            return self.colorize(&format!("No documents found under {}.", root.display()), "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["File", "Folder", "Prompt"]);
        for file in planned {
            let prompt = match &file.prompt_name {
                Some(name) => name.clone(),
                None => self.colorize("(no prompt, would skip)", "yellow"),
            };
            builder.push_record([relative(root, &file.path), file.folder_key.clone(), prompt]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let matched = planned.iter().filter(|p| p.prompt_name.is_some()).count();
        format!(
            "{}\n\n{}",
            table,
            self.info(&format!("{} of {} document(s) have a prompt", matched, planned.len()))
        )
    }

    fn summary(&self, report: &RunReport) -> String {
        let message = format!(
            "{} committed, {} skipped, {} failed in {:.2}s",
            report.committed(),
            report.skipped(),
            report.failed(),
            report.elapsed.as_secs_f64()
        );
        if report.is_clean() {
            self.success(&message)
        } else {
            self.warning(&message)
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
