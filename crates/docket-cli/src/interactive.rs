//! Interactive input.

use crate::error::{CliError, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

/// Prompt shown when no root folder is given on the command line.
pub const FOLDER_PROMPT: &str = "Enter the path to the folder: ";

/// Ask the user for the root folder.
pub fn ask_for_root() -> Result<PathBuf> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| CliError::InvalidInput(format!("Failed to initialize editor: {}", e)))?;

    match editor.readline(FOLDER_PROMPT) {
        Ok(line) => parse_folder_input(&line),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Err(CliError::Cancelled),
        Err(err) => Err(CliError::InvalidInput(format!("Failed to read folder: {}", err))),
    }
}

/// Turn a typed or pasted folder path into a path.
///
/// Surrounding whitespace and one pair of matching quotes (as added by
/// drag-and-drop in most terminals) are removed.
pub fn parse_folder_input(line: &str) -> Result<PathBuf> {
    let trimmed = line.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| trimmed.strip_prefix(*q).and_then(|rest| rest.strip_suffix(*q)))
        .unwrap_or(trimmed)
        .trim();

    if unquoted.is_empty() {
        return Err(CliError::InvalidInput("No folder given".into()));
    }
    Ok(PathBuf::from(unquoted))
}
