/*!
 * Token-budgeted batching of paragraphs.
 *
 * Pages are flattened into batches in reading order. A batch never splits a
 * paragraph and never exceeds the budget; concatenating all batches yields
 * the input paragraphs in their original order.
 */

use log::{error, info, warn};

use super::prompts::PromptBuilder;
use super::tokens::TokenCounter;
use crate::errors::TranslationError;

/// Paragraph rendered into the representative prompt used for budgeting
const SAMPLE_PARAGRAPH: &str = "This is a user message";

/// Splits pages of paragraphs into request-sized batches
pub struct Batcher<'a> {
    counter: &'a dyn TokenCounter,
    prompts: &'a PromptBuilder,
    /// Context pairs replayed with every request
    context_pairs: usize,
    /// Share of the context window usable for prompt and answer
    limit_fraction: f64,
    /// Explicit budget from the configuration (0 = computed)
    custom_budget: usize,
}

impl<'a> Batcher<'a> {
    /// Create a batcher
    pub fn new(
        counter: &'a dyn TokenCounter,
        prompts: &'a PromptBuilder,
        context_pairs: usize,
        limit_fraction: f64,
        custom_budget: usize,
    ) -> Self {
        Self {
            counter,
            prompts,
            context_pairs,
            limit_fraction,
            custom_budget,
        }
    }

    /// Tokens taken by a prompt with no glossary and a one-line batch
    pub fn reserved_prompt_tokens(&self) -> usize {
        let system = self.prompts.system_prompt("");
        let user = self.prompts.user_message(&[SAMPLE_PARAGRAPH.to_string()]);
        self.counter.count(&system) + self.counter.count(&user)
    }

    /// Budget per batch for a model with `token_limit` context tokens
    ///
    /// Half of what remains after the prompt is left for the answer, and the
    /// rest is shared with the replayed context pairs.
    pub fn budget(&self, token_limit: usize) -> Result<usize, TranslationError> {
        let reserved = self.reserved_prompt_tokens();
        let usable = token_limit as f64 * self.limit_fraction - reserved as f64;
        let computed = (usable / (2 * (self.context_pairs + 1)) as f64).floor();
        let computed = if computed >= 1.0 { computed as usize } else { 0 };

        match self.custom_budget {
            0 if computed == 0 => Err(TranslationError::BudgetExhausted {
                limit: token_limit,
                reserved,
            }),
            0 => {
                info!("The value of limit_tokens has been set to default: {}", computed);
                Ok(computed)
            }
            custom if custom <= computed => Ok(custom),
            custom => {
                warn!(
                    "The custom token limit {} exceeds the computed budget {}, responses may be truncated",
                    custom, computed
                );
                Ok(custom)
            }
        }
    }

    /// Partition pages into batches of at most `budget(token_limit)` tokens
    pub fn split_task(
        &self,
        pages: &[Vec<String>],
        token_limit: usize,
    ) -> Result<Vec<Vec<String>>, TranslationError> {
        let budget = self.budget(token_limit)?;
        let batches = self.split_with_budget(pages, budget)?;

        info!(
            "{} pages were entered, which were split into {} translation requests.",
            pages.len(),
            batches.len()
        );
        Ok(batches)
    }

    /// Greedy partition with an already computed budget
    pub fn split_with_budget(
        &self,
        pages: &[Vec<String>],
        budget: usize,
    ) -> Result<Vec<Vec<String>>, TranslationError> {
        let mut batches: Vec<Vec<String>> = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for page in pages {
            for paragraph in page {
                let tokens = self.counter.count(paragraph);
                if tokens > budget {
                    error!(
                        "One paragraph is too long ({} tokens), set a token limit greater than {} or use a model with a longer context window.",
                        tokens, tokens
                    );
                    return Err(TranslationError::ParagraphTooLong { tokens, budget });
                }

                if pending.is_empty() {
                    pending.push(paragraph.clone());
                    continue;
                }

                let joined = format!("{}\n{}", pending.join("\n"), paragraph);
                if self.counter.count(&joined) <= budget {
                    pending.push(paragraph.clone());
                } else {
                    batches.push(std::mem::take(&mut pending));
                    pending.push(paragraph.clone());
                }
            }

            // Close a batch that has grown past a third of the budget at a
            // page boundary
            if !pending.is_empty() && self.encoded_tokens(&pending) * 3 > budget {
                batches.push(std::mem::take(&mut pending));
            }
        }

        if !pending.is_empty() {
            batches.push(pending);
        }

        Ok(batches)
    }

    fn encoded_tokens(&self, batch: &[String]) -> usize {
        let encoded = serde_json::to_string(batch).unwrap_or_else(|_| batch.join("\n"));
        self.counter.count(&encoded)
    }
}
