/*!
 * Task orchestration over whole documents.
 *
 * The orchestrator ties the pieces together for a list of pages: page cache
 * lookups, batching of the remaining pages, per-batch translation and the
 * reassembly of translated batches into pages.
 */

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use super::batch::Batcher;
use super::core::{RunState, TranslationClient};
use super::glossary::Glossary;
use super::restore::{Restoration, reassemble};
use crate::errors::TranslationError;

/// Dry-run cost projection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumptionEstimate {
    /// Requests that would be sent
    pub batches: usize,
    /// Prompt tokens over all requests, context pairs excluded
    pub prompt_tokens: usize,
}

/// Budget settings for batching
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchSettings {
    /// Context window of the model
    pub token_limit: usize,
    /// Share of the window usable per request
    pub limit_fraction: f64,
    /// Explicit budget (0 = computed)
    pub custom_budget: usize,
}

/// Runs translation tasks over pages
pub struct TaskOrchestrator {
    client: TranslationClient,
    glossary: Glossary,
    settings: BatchSettings,
    use_page_cache: bool,
    show_progress: bool,
}

impl TaskOrchestrator {
    /// Create an orchestrator
    pub fn new(
        client: TranslationClient,
        glossary: Glossary,
        settings: BatchSettings,
        use_page_cache: bool,
    ) -> Self {
        Self {
            client,
            glossary,
            settings,
            use_page_cache,
            show_progress: true,
        }
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn client(&self) -> &TranslationClient {
        &self.client
    }

    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }

    /// Batcher configured for the client's prompts and counter
    pub fn batcher(&self) -> Batcher<'_> {
        Batcher::new(
            self.client.counter(),
            self.client.prompts(),
            self.client.options().context_pairs,
            self.settings.limit_fraction,
            self.settings.custom_budget,
        )
    }

    /// Translate pages, returning one translated page per input page
    pub async fn start_task(
        &self,
        pages: &[Vec<String>],
        state: &mut RunState,
    ) -> Result<Vec<Vec<String>>, TranslationError> {
        let mut results: Vec<Option<Vec<String>>> = vec![None; pages.len()];
        let mut miss_indices = Vec::new();
        let mut miss_pages = Vec::new();

        for (index, page) in pages.iter().enumerate() {
            if self.use_page_cache {
                if let Some(hit) = self.client.cache().lookup_page(page).await {
                    if hit.len() == page.len() {
                        results[index] = Some(hit);
                        continue;
                    }
                }
            }
            miss_indices.push(index);
            miss_pages.push(page.clone());
        }

        if self.use_page_cache {
            info!(
                "{} of {} pages were found in the page cache",
                pages.len() - miss_pages.len(),
                pages.len()
            );
        }

        if !miss_pages.is_empty() {
            let batches = self.batcher().split_task(&miss_pages, self.settings.token_limit)?;
            let translated = self.translate_batches(&batches, state).await?;
            let restored = self.restore_task(&miss_pages, &translated).await;

            for (index, page) in miss_indices.into_iter().zip(restored) {
                results[index] = Some(page);
            }
        }

        info!("Failed tasks num: {}", state.failed);
        Ok(results.into_iter().map(Option::unwrap_or_default).collect())
    }

    async fn translate_batches(
        &self,
        batches: &[Vec<String>],
        state: &mut RunState,
    ) -> Result<Vec<Vec<String>>, TranslationError> {
        let progress_bar = if self.show_progress {
            ProgressBar::new(batches.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} requests ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");

        let mut translated = Vec::with_capacity(batches.len());
        for batch in batches {
            match self.client.translate(batch, &self.glossary, state).await {
                Ok(result) => translated.push(result),
                Err(e) => {
                    progress_bar.abandon_with_message("Stopped");
                    return Err(e);
                }
            }
            progress_bar.inc(1);
        }

        progress_bar.finish_and_clear();
        Ok(translated)
    }

    /// Map translated batches back onto `original_pages` and fill the page cache
    pub async fn restore_task(
        &self,
        original_pages: &[Vec<String>],
        translated_batches: &[Vec<String>],
    ) -> Vec<Vec<String>> {
        let Restoration {
            pages,
            lost,
            leftover,
            cacheable,
        } = reassemble(original_pages, translated_batches);

        for index in cacheable {
            self.client
                .cache()
                .write_page(&original_pages[index], &pages[index])
                .await;
        }

        if lost > 0 {
            warn!("Lost {} paragraphs after restore.", lost);
        }
        if leftover > 0 {
            warn!(
                "{} translated paragraphs were left over after restoring all pages",
                leftover
            );
        }
        pages
    }

    /// Project the requests and prompt tokens a run would need
    pub fn estimate_consumption(&self, pages: &[Vec<String>]) -> Result<ConsumptionEstimate, TranslationError> {
        let batches = self.batcher().split_task(pages, self.settings.token_limit)?;
        let prompt_tokens = batches
            .iter()
            .map(|batch| self.client.estimate_prompt_tokens(batch, &self.glossary))
            .sum();

        let estimate = ConsumptionEstimate {
            batches: batches.len(),
            prompt_tokens,
        };
        info!(
            "Estimated {} requests with {} prompt tokens",
            estimate.batches, estimate.prompt_tokens
        );
        Ok(estimate)
    }

    /// Add translated titles to the glossary
    ///
    /// Returns the number of new entries; nothing is added when the title
    /// counts of the two sides differ.
    pub fn add_title_glossary(&mut self, original: &[Vec<String>], translated: &[Vec<String>]) -> usize {
        self.glossary.add_titles(original, translated)
    }
}
