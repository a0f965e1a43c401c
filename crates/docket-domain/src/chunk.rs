//! Chunk module - word-bounded slices of a document

/// A contiguous slice of a document's words sized to a backend budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk within the document (0-based)
    pub sequence_index: usize,

    /// Words of this chunk joined by single spaces
    pub text: String,

    /// Maximum number of words any chunk of this document may hold
    pub token_budget: usize,
}

impl Chunk {
    /// Number of words in this chunk
    pub fn word_count(&self) -> usize {
        crate::document::word_count(&self.text)
    }

    /// Whether the chunk stays within its budget
    pub fn fits_budget(&self) -> bool {
        self.word_count() <= self.token_budget
    }
}
