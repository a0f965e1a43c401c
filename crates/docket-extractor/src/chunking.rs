//! Word-based chunk planning

use docket_domain::{word_count, Chunk};

/// Default context window, in words, of the backend
pub const DEFAULT_CONTEXT_TOKENS: usize = 4096;

/// Splits document text into word-bounded chunks that fit beside a prompt
#[derive(Debug, Clone, Copy)]
pub struct ChunkPlanner {
    context_tokens: usize,
}

impl ChunkPlanner {
    /// Create a planner for a backend with the given context window
    pub fn new(context_tokens: usize) -> Self {
        Self { context_tokens }
    }

    /// Context window this planner sizes chunks for
    pub fn context_tokens(&self) -> usize {
        self.context_tokens
    }

    /// Words left for document text once the prompt is accounted for
    ///
    /// Never less than 1, even when the prompt alone fills the window.
    pub fn budget_for(&self, prompt_text: &str) -> usize {
        self.context_tokens
            .saturating_sub(word_count(prompt_text))
            .max(1)
    }

    /// Split `document_text` into chunks of at most `budget_for(prompt_text)` words
    ///
    /// Chunks hold words in document order, joined by single spaces. An
    /// empty document yields one empty chunk so it still reaches the backend.
    pub fn plan(&self, prompt_text: &str, document_text: &str) -> Vec<Chunk> {
        let budget = self.budget_for(prompt_text);
        let words: Vec<&str> = document_text.split_whitespace().collect();

        if words.is_empty() {
            return vec![Chunk {
                sequence_index: 0,
                text: String::new(),
                token_budget: budget,
            }];
        }

        words
            .chunks(budget)
            .enumerate()
            .map(|(sequence_index, slice)| Chunk {
                sequence_index,
                text: slice.join(" "),
                token_budget: budget,
            })
            .collect()
    }
}

impl Default for ChunkPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_TOKENS)
    }
}
