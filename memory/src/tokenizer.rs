use std::fmt;
use std::sync::Arc;

use tiktoken_rs::{cl100k_base, CoreBPE};

use crate::errors::TokenizerError;

/// Deterministic text -> token count function used for size estimates.
///
/// Changing the tokenizer changes the effective summarization threshold.
pub trait Tokenizer: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

/// BPE tokenizer shared by most hosted models
#[derive(Clone)]
pub struct Cl100kTokenizer {
    bpe: Arc<CoreBPE>,
}

impl Cl100kTokenizer {
    pub fn new() -> Result<Self, TokenizerError> {
        let bpe = cl100k_base().map_err(|e| TokenizerError::Load {
            name: "cl100k_base".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { bpe: Arc::new(bpe) })
    }
}

impl fmt::Debug for Cl100kTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cl100kTokenizer")
    }
}

impl Tokenizer for Cl100kTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Counts whitespace separated words
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}
