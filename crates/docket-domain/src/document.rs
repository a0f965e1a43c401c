//! Document module - a discovered text file awaiting extraction

use std::path::{Path, PathBuf};

/// A text document discovered under the input tree
///
/// The folder key is the name of the document's immediate parent directory
/// and selects the prompt used for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Location of the source file
    pub path: PathBuf,

    /// File contents with blank lines removed
    pub raw_text: String,

    /// Name of the immediate parent directory
    pub folder_key: String,
}

impl Document {
    /// Build a document from its path and the file contents as read from disk
    ///
    /// Lines that are empty or contain only whitespace are dropped; the
    /// remaining lines are kept verbatim and joined with `\n`.
    ///
    /// # Examples
    ///
    /// ```
    /// use docket_domain::Document;
    ///
    /// let doc = Document::new("/docs/Invoices/a.txt", "Total: 100\n\n");
    /// assert_eq!(doc.folder_key, "Invoices");
    /// assert_eq!(doc.raw_text, "Total: 100");
    /// ```
    pub fn new(path: impl Into<PathBuf>, contents: &str) -> Self {
        let path = path.into();
        let folder_key = folder_key_for(&path);
        Self {
            raw_text: strip_blank_lines(contents),
            folder_key,
            path,
        }
    }

    /// File stem used to name the result file
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Whether the document carries no words at all
    pub fn is_empty(&self) -> bool {
        word_count(&self.raw_text) == 0
    }
}

/// Derive the folder key (parent directory name) for a path
pub fn folder_key_for(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Count whitespace-delimited words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn strip_blank_lines(contents: &str) -> String {
    contents
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_key_is_parent_name() {
        let doc = Document::new("/root/a/Deeds/file.txt", "x");
        assert_eq!(doc.folder_key, "Deeds");
    }

    #[test]
    fn test_blank_lines_removed() {
        let doc = Document::new("/r/F/a.txt", "line one\n\n   \nline two\n\t\n");
        assert_eq!(doc.raw_text, "line one\nline two");
    }

    #[test]
    fn test_stem() {
        let doc = Document::new("/r/F/report.final.txt", "");
        assert_eq!(doc.stem(), "report.final");
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::new("/r/F/a.txt", "\n \n\n");
        assert!(doc.is_empty());
        assert_eq!(doc.raw_text, "");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("  a  b\nc\t d "), 4);
    }
}
