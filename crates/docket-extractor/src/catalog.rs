//! Prompt catalog - folder name to extraction prompt lookup
//!
//! Loaded once at startup from a JSON array, the `Prompt` sheet of an
//! `.xlsx` workbook, or a CSV export of that sheet. Lookups never touch the
//! filesystem.

use crate::error::CatalogError;
use calamine::{open_workbook, Reader, Xlsx};
use docket_domain::PromptEntry;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Read-only mapping from folder key to prompt entry
#[derive(Debug, Clone, Default)]
pub struct PromptCatalog {
    entries: Vec<PromptEntry>,
}

#[derive(Deserialize)]
struct JsonPromptRecord {
    prompt_name: String,
    prompt: String,
    #[serde(default)]
    folder: Option<String>,
    #[serde(default)]
    alternate_folder: Option<String>,
}

/// Sheet read from `.xlsx` prompt workbooks
pub const PROMPT_SHEET_NAME: &str = "Prompt";

const SHEET_COLUMNS: [&str; 4] = ["Classified Folder", "UnClassified Folder", "Prompt Name", "Prompt"];

#[derive(Deserialize)]
struct CsvPromptRecord {
    #[serde(rename = "Classified Folder")]
    classified: Option<String>,
    #[serde(rename = "UnClassified Folder")]
    unclassified: Option<String>,
    #[serde(rename = "Prompt Name")]
    prompt_name: Option<String>,
    #[serde(rename = "Prompt")]
    prompt: Option<String>,
}

impl PromptCatalog {
    /// Build a catalog from entries
    ///
    /// Entries with empty prompt text are dropped. When two entries share a
    /// primary key the first one wins.
    pub fn new(entries: Vec<PromptEntry>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(entries.len());

        for entry in entries {
            if entry.prompt_text.trim().is_empty() {
                warn!("Dropping prompt '{}': prompt text is empty", entry.prompt_name);
                continue;
            }
            if !entry.folder_key.is_empty() && !seen.insert(entry.folder_key.clone()) {
                warn!(
                    "Duplicate prompt for folder '{}', keeping the first entry",
                    entry.folder_key
                );
                continue;
            }
            kept.push(entry);
        }

        Self { entries: kept }
    }

    /// Load a catalog from a `.json`, `.csv` or `.xlsx` prompt file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.is_file() {
            return Err(CatalogError::NotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        let catalog = match extension.as_str() {
            "json" => Self::from_json_str(&std::fs::read_to_string(path)?)?,
            "csv" => Self::from_csv_reader(std::fs::File::open(path)?)?,
            "xlsx" => Self::from_xlsx(path)?,
            _ => return Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
        };

        debug!("Loaded {} prompts from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Parse a JSON array of `{prompt_name, prompt, folder?, alternate_folder?}`
    ///
    /// `folder` defaults to `prompt_name`.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<JsonPromptRecord> = serde_json::from_str(json)?;

        let entries = records
            .into_iter()
            .map(|record| {
                let folder = record.folder.unwrap_or_else(|| record.prompt_name.clone());
                let entry = PromptEntry::new(folder, record.prompt_name, record.prompt);
                match record.alternate_folder {
                    Some(alternate) if !alternate.is_empty() => entry.with_alternate_key(alternate),
                    _ => entry,
                }
            })
            .collect();

        Ok(Self::new(entries))
    }

    /// Parse CSV with `Classified Folder`, `UnClassified Folder`,
    /// `Prompt Name` and `Prompt` columns
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        for column in SHEET_COLUMNS {
            if !headers.iter().any(|header| header == column) {
                return Err(CatalogError::MissingColumn(column.to_string()));
            }
        }

        let mut entries = Vec::new();
        for (row, record) in csv_reader.deserialize::<CsvPromptRecord>().enumerate() {
            let record = record?;
            entries.extend(sheet_entry(
                row + 1,
                record.classified,
                record.unclassified,
                record.prompt_name,
                record.prompt,
            ));
        }

        Ok(Self::new(entries))
    }

    /// Read the `Prompt` sheet of an `.xlsx` workbook
    ///
    /// The first row holds the same column names as the CSV export.
    pub fn from_xlsx(path: &Path) -> Result<Self, CatalogError> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        if !workbook.sheet_names().iter().any(|name| name == PROMPT_SHEET_NAME) {
            return Err(CatalogError::MissingSheet(PROMPT_SHEET_NAME.to_string()));
        }
        let range = workbook.worksheet_range(PROMPT_SHEET_NAME)?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|header| header.iter().map(|cell| cell.to_string()).collect())
            .unwrap_or_default();
        let mut columns = [0usize; 4];
        for (slot, column) in columns.iter_mut().zip(SHEET_COLUMNS) {
            *slot = headers
                .iter()
                .position(|header| header == column)
                .ok_or_else(|| CatalogError::MissingColumn(column.to_string()))?;
        }

        let mut entries = Vec::new();
        for (row, cells) in rows.enumerate() {
            let cell = |index: usize| {
                cells
                    .get(columns[index])
                    .map(|value| value.to_string())
                    .filter(|value| !value.is_empty())
            };
            entries.extend(sheet_entry(row + 1, cell(0), cell(1), cell(2), cell(3)));
        }

        Ok(Self::new(entries))
    }

    /// Find the prompt for a folder
    ///
    /// Every primary key is checked before any alternate key.
    pub fn resolve(&self, folder_key: &str) -> Option<&PromptEntry> {
        self.entries
            .iter()
            .find(|entry| entry.matches_primary(folder_key))
            .or_else(|| self.entries.iter().find(|entry| entry.matches_alternate(folder_key)))
    }

    /// All entries in load order
    pub fn entries(&self) -> &[PromptEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build an entry from one prompt-sheet row
///
/// Rows without any folder name are dropped. The prompt name defaults to the
/// classified folder name.
fn sheet_entry(
    row: usize,
    classified: Option<String>,
    unclassified: Option<String>,
    prompt_name: Option<String>,
    prompt: Option<String>,
) -> Option<PromptEntry> {
    let classified = classified.unwrap_or_default();
    let unclassified = unclassified.filter(|key| !key.is_empty());

    if classified.is_empty() && unclassified.is_none() {
        warn!("Skipping prompt row {}: no folder names", row);
        return None;
    }

    let prompt_name = prompt_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| classified.clone());
    let entry = PromptEntry::new(classified, prompt_name, prompt.unwrap_or_default());

    Some(match unclassified {
        Some(alternate) => entry.with_alternate_key(alternate),
        None => entry,
    })
}
