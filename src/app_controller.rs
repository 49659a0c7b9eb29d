use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::database::{CacheScope, DatabaseConnection, Repository};
use crate::document::{BookFormat, Document, EpubDocument, TextDocument};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::Provider;
use crate::providers::openai::OpenAI;
use crate::translation::{
    BatchSettings, Cl100kCounter, ClientOptions, ConsumptionEstimate, Glossary, PromptBuilder,
    RetryPolicy, RunState, TaskOrchestrator, TokenUsageStats, TranslationCache, TranslationClient,
    resolve_limits,
};

// @module: Application controller for book translation

/// Result of one controller run
#[derive(Debug)]
pub enum RunOutcome {
    /// Dry run: projected cost of the title and content passes
    Estimated {
        titles: ConsumptionEstimate,
        content: ConsumptionEstimate,
    },
    /// Translated book written to `output`
    Translated {
        output: PathBuf,
        failed: usize,
        usage: TokenUsageStats,
    },
}

/// Main application controller for book translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Provider override, the OpenAI client is built from config when absent
    provider: Option<Arc<dyn Provider>>,
    // @field: Sleep schedule between attempts
    retry: RetryPolicy,
    // @field: Whether to draw progress bars
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            provider: None,
            retry: RetryPolicy::default(),
            show_progress: true,
        })
    }

    // @method: Use a specific provider instead of the configured endpoint
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    // @method: Replace the retry schedule
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // @method: Enable or disable progress bars
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate a book, or only estimate the cost when `estimate_only` is set
    pub async fn run(&self, book: &Path, output_dir: &Path, estimate_only: bool) -> Result<RunOutcome> {
        if !FileManager::file_exists(book) {
            return Err(anyhow::anyhow!("Input file does not exist: {:?}", book));
        }

        match BookFormat::from_path(book)? {
            BookFormat::Epub => {
                self.process(EpubDocument::new(book), book, output_dir, estimate_only)
                    .await
            }
            BookFormat::Text => {
                self.process(TextDocument::new(book), book, output_dir, estimate_only)
                    .await
            }
        }
    }

    async fn process<D: Document>(
        &self,
        document: D,
        book: &Path,
        output_dir: &Path,
        estimate_only: bool,
    ) -> Result<RunOutcome> {
        let start_time = std::time::Instant::now();

        let (ids, pages) = document.read()?;
        let paragraphs = document.extract_paragraphs(&pages)?;
        let titles = if self.config.translation.translate_titles {
            document.extract_titles(&pages)?
        } else {
            Vec::new()
        };
        info!(
            "Loaded {} pages with {} paragraphs and {} titles",
            pages.len(),
            paragraphs.iter().map(Vec::len).sum::<usize>(),
            titles.iter().map(Vec::len).sum::<usize>()
        );

        let mut orchestrator = self.build_orchestrator(book, estimate_only)?;

        if estimate_only {
            let titles = orchestrator.estimate_consumption(&titles)?;
            let content = orchestrator.estimate_consumption(&paragraphs)?;
            info!(
                "Estimated prompt tokens: {} for titles, {} for content, {} in total",
                titles.prompt_tokens,
                content.prompt_tokens,
                titles.prompt_tokens + content.prompt_tokens
            );
            return Ok(RunOutcome::Estimated { titles, content });
        }

        info!(
            "🚀 bookwai: {} - {}",
            orchestrator.client().provider_name(),
            self.config.openai.model
        );
        let mut state = RunState::new(orchestrator.client().provider_name(), &self.config.openai.model);

        if !titles.is_empty() {
            info!("Translating titles…");
            let translated_titles = orchestrator.start_task(&titles, &mut state).await?;
            orchestrator.add_title_glossary(&titles, &translated_titles);
        }

        info!("Translating, please wait…");
        let translated = orchestrator.start_task(&paragraphs, &mut state).await?;

        let new_pages = document.apply_translations(&pages, &paragraphs, &translated)?;
        FileManager::ensure_dir(output_dir)?;
        let output = FileManager::generate_output_path(book, output_dir, Local::now());
        document
            .write(&output, &ids, &new_pages)
            .with_context(|| format!("Failed to write translated book: {:?}", output))?;

        info!("{}", state.usage.summary());
        if state.failed > 0 {
            warn!("{} batches were kept untranslated", state.failed);
        }
        info!(
            "Translation completed in {:.1}s, saved to {:?}",
            start_time.elapsed().as_secs_f64(),
            output
        );

        Ok(RunOutcome::Translated {
            output,
            failed: state.failed,
            usage: state.usage,
        })
    }

    fn build_orchestrator(&self, book: &Path, estimate_only: bool) -> Result<TaskOrchestrator> {
        let config = &self.config;
        let limits = resolve_limits(&config.openai);
        debug!(
            "Model limits: {} tokens, {}s timeout",
            limits.token_limit,
            limits.timeout.as_secs()
        );

        let target = language_utils::display_target_language(&config.target_language);
        let prompts = PromptBuilder::new(
            target.clone(),
            config.translation.stream,
            config.translation.dict_format,
            &config.translation.system_prompt,
            &config.translation.user_prompt,
        )?;

        let scope = CacheScope::new(target, config.openai.model.clone());
        let cache = if estimate_only {
            TranslationCache::in_memory(scope)?
        } else {
            let path = match &config.translation.cache_file {
                Some(path) => path.clone(),
                None => FileManager::default_cache_path(book)?,
            };
            TranslationCache::new(Repository::new(DatabaseConnection::new(&path)?), scope)
        };

        let glossary = match &config.translation.glossary_file {
            Some(path) => Glossary::load(path)?,
            None => Glossary::new(),
        };

        let provider: Arc<dyn Provider> = match &self.provider {
            Some(provider) => provider.clone(),
            None => Arc::new(OpenAI::new(config.api_key(), config.chat_url())),
        };

        let client = TranslationClient::new(
            provider,
            prompts,
            Arc::new(Cl100kCounter::new()?),
            cache,
            ClientOptions::from_config(config, &limits),
        )
        .with_retry_policy(self.retry);

        let settings = BatchSettings {
            token_limit: limits.token_limit,
            limit_fraction: config.translation.limit_fraction,
            custom_budget: config.openai.token_limit,
        };

        Ok(TaskOrchestrator::new(
            client,
            glossary,
            settings,
            config.translation.cache_method.use_page_cache(),
        )
        .with_progress(self.show_progress))
    }
}
