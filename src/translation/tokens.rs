/*!
 * Token counting for budget arithmetic.
 *
 * Counts only drive batch sizing and usage reports; they never change the
 * text that is sent or stored.
 */

use anyhow::{anyhow, Result};
use tiktoken_rs::CoreBPE;

/// Converts text into a token count
pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`
    fn count(&self, text: &str) -> usize;
}

/// cl100k_base tokenizer shared by the gpt-3.5 and gpt-4 families
pub struct Cl100kCounter {
    bpe: CoreBPE,
}

impl Cl100kCounter {
    /// Load the cl100k_base encoding
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| anyhow!("Failed to load cl100k_base tokenizer: {}", e))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for Cl100kCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// Heuristic counter (one token per four characters, rounded up)
///
/// Used when no tokenizer is wanted, e.g. for quick estimates and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharRatioCounter;

impl TokenCounter for CharRatioCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}
