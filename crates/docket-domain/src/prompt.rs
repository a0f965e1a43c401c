//! Prompt entries - extraction instructions keyed by folder name

/// Extraction instructions for every document stored under a given folder
///
/// `folder_key` is the first-priority match column and `alternate_key` the
/// synonym column (the "classified" / "unclassified" folder names of the
/// prompt spreadsheet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptEntry {
    /// Primary folder name this prompt applies to
    pub folder_key: String,

    /// Synonym folder name, consulted only after every primary key
    pub alternate_key: Option<String>,

    /// Human-readable prompt name (used in logs and reports)
    pub prompt_name: String,

    /// Instructions sent to the backend ahead of the document text
    pub prompt_text: String,
}

impl PromptEntry {
    /// Create an entry with no synonym key
    ///
    /// # Examples
    ///
    /// ```
    /// use docket_domain::PromptEntry;
    ///
    /// let entry = PromptEntry::new("Invoices", "Invoice totals", "Extract total as JSON");
    /// assert_eq!(entry.folder_key, "Invoices");
    /// assert!(entry.alternate_key.is_none());
    /// ```
    pub fn new(
        folder_key: impl Into<String>,
        prompt_name: impl Into<String>,
        prompt_text: impl Into<String>,
    ) -> Self {
        Self {
            folder_key: folder_key.into(),
            alternate_key: None,
            prompt_name: prompt_name.into(),
            prompt_text: prompt_text.into(),
        }
    }

    /// Attach a synonym folder key
    pub fn with_alternate_key(mut self, key: impl Into<String>) -> Self {
        self.alternate_key = Some(key.into());
        self
    }

    /// Whether the primary key matches exactly
    pub fn matches_primary(&self, folder_key: &str) -> bool {
        self.folder_key == folder_key
    }

    /// Whether the synonym key matches exactly
    pub fn matches_alternate(&self, folder_key: &str) -> bool {
        self.alternate_key.as_deref() == Some(folder_key)
    }
}
