/*!
 * Core translation client implementation.
 *
 * This module contains the `TranslationClient`, which translates one batch
 * of paragraphs: it consults the batch cache, renders the prompt, sends the
 * request and validates the answer, retrying according to the kind of
 * failure. A batch that cannot be translated is returned unchanged so the
 * document keeps its structure.
 */

use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::cache::TranslationCache;
use super::glossary::Glossary;
use super::limits::ModelLimits;
use super::prompts::PromptBuilder;
use super::tokens::TokenCounter;
use crate::app_config::Config;
use crate::errors::{ProviderError, TranslationError};
use crate::providers::{ChatCompletion, ChatMessage, ChatRequest, Provider};
use crate::validation::{check_translation, parse_response};

/// Token usage statistics for tracking API consumption
#[derive(Clone, Debug)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Total number of tokens
    pub total_tokens: u64,

    /// Start time of token tracking
    pub start_time: Instant,

    /// Total time spent on API requests
    pub api_duration: Duration,

    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,
}

impl Default for TokenUsageStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenUsageStats {
    /// Create a new empty token usage stats instance
    pub fn new() -> Self {
        Self::with_provider_info(String::new(), String::new())
    }

    /// Create new token usage stats with provider info
    pub fn with_provider_info(provider: String, model: String) -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            start_time: Instant::now(),
            api_duration: Duration::from_secs(0),
            provider,
            model,
        }
    }

    /// Add token usage numbers
    pub fn add_token_usage(&mut self, prompt_tokens: u64, completion_tokens: u64) {
        self.prompt_tokens += prompt_tokens;
        self.completion_tokens += completion_tokens;
        self.total_tokens += prompt_tokens + completion_tokens;
    }

    /// Calculate tokens per minute rate
    pub fn tokens_per_minute(&self) -> f64 {
        // Use the API duration for rate calculation, with fallback to elapsed time
        let duration_minutes = if self.api_duration.as_secs_f64() > 0.0 {
            self.api_duration.as_secs_f64() / 60.0
        } else {
            self.start_time.elapsed().as_secs_f64() / 60.0
        };

        if duration_minutes > 0.0 {
            self.total_tokens as f64 / duration_minutes
        } else {
            0.0
        }
    }

    /// Generate a summary of token usage
    pub fn summary(&self) -> String {
        let elapsed_minutes = self.start_time.elapsed().as_secs_f64() / 60.0;
        let api_minutes = self.api_duration.as_secs_f64() / 60.0;

        format!(
            "Token Usage Summary:\n\
             Provider: {}\n\
             Model: {}\n\
             Prompt tokens: {}\n\
             Completion tokens: {}\n\
             Total tokens: {}\n\
             Elapsed time: {:.2} minutes\n\
             API request time: {:.2} minutes\n\
             Tokens per minute: {:.2}",
            self.provider,
            self.model,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            elapsed_minutes,
            api_minutes,
            self.tokens_per_minute()
        )
    }
}

/// Mutable state shared by every batch of a run
#[derive(Debug, Default)]
pub struct RunState {
    /// Most recent (original, translated) pairs, oldest first
    pub context: VecDeque<(Vec<String>, Vec<String>)>,

    /// Accumulated token usage
    pub usage: TokenUsageStats,

    /// Batches returned untranslated after exhausting their attempts
    pub failed: usize,
}

impl RunState {
    /// Create state for a run against `provider` and `model`
    pub fn new(provider: &str, model: &str) -> Self {
        Self {
            context: VecDeque::new(),
            usage: TokenUsageStats::with_provider_info(provider.to_string(), model.to_string()),
            failed: 0,
        }
    }

    /// Remember a translated pair, keeping at most `capacity` pairs
    pub fn push_context(&mut self, original: &[String], translated: &[String], capacity: usize) {
        if capacity == 0 {
            return;
        }
        self.context.push_back((original.to_vec(), translated.to_vec()));
        while self.context.len() > capacity {
            self.context.pop_front();
        }
    }

    /// Newest `count` pairs, oldest first
    pub fn context_window(&self, count: usize) -> Vec<(Vec<String>, Vec<String>)> {
        let skip = self.context.len().saturating_sub(count);
        self.context.iter().skip(skip).cloned().collect()
    }
}

/// Failure classes that lead to another attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RecoverableKind {
    Timeout,
    RateLimited,
    ServerError(u16),
    Validation(String),
    Other(String),
}

/// Result of a single request attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Validated translation
    Success(Vec<String>),
    /// The answer was cut off; the original batch is returned as is
    Degraded(Vec<String>),
    /// Worth another attempt
    Recoverable(RecoverableKind),
    /// Stop the run
    Fatal(TranslationError),
}

impl AttemptOutcome {
    /// Classify a provider failure
    pub fn from_provider_error(error: ProviderError) -> Self {
        match error {
            ProviderError::Timeout(_) => Self::Recoverable(RecoverableKind::Timeout),
            ProviderError::RateLimitExceeded(_) => Self::Recoverable(RecoverableKind::RateLimited),
            ProviderError::ServerError { status_code, .. } => {
                Self::Recoverable(RecoverableKind::ServerError(status_code))
            }
            ProviderError::AuthenticationError(message) => {
                Self::Fatal(TranslationError::AuthFailure(message))
            }
            ProviderError::Forbidden(message) => Self::Fatal(TranslationError::Forbidden(message)),
            other => Self::Recoverable(RecoverableKind::Other(other.to_string())),
        }
    }
}

/// Sleep schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Base delay after a rate limit; attempt n waits (n+1)^2 times this
    pub rate_limit_base: Duration,

    /// Delay after a server-side failure
    pub server_error_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rate_limit_base: Duration::from_secs(60),
            server_error_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy without any waiting
    pub fn immediate() -> Self {
        Self {
            rate_limit_base: Duration::ZERO,
            server_error_delay: Duration::ZERO,
        }
    }

    /// Delay before the attempt following `attempt` (0-based)
    pub fn delay_for(&self, kind: &RecoverableKind, attempt: u32) -> Duration {
        match kind {
            RecoverableKind::RateLimited => self.rate_limit_base * (attempt + 1).pow(2),
            RecoverableKind::ServerError(_) => self.server_error_delay,
            _ => Duration::ZERO,
        }
    }
}

/// Settings that shape every request
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub model: String,
    pub timeout: Duration,
    pub max_try: u32,
    pub stream: bool,
    pub repeat_check: bool,
    pub temperature: f32,
    pub use_split_cache: bool,
    pub context_pairs: usize,
}

impl ClientOptions {
    /// Derive options from the configuration and the resolved model limits
    pub fn from_config(config: &Config, limits: &ModelLimits) -> Self {
        Self {
            model: config.openai.model.clone(),
            timeout: limits.timeout,
            max_try: config.translation.max_try.max(1),
            stream: config.translation.stream,
            repeat_check: config.translation.repeat_check,
            temperature: config.translation.temperature,
            use_split_cache: config.translation.cache_method.use_split_cache(),
            context_pairs: config.translation.context_pairs,
        }
    }
}

/// Translates batches through a chat-completion provider
pub struct TranslationClient {
    provider: Arc<dyn Provider>,
    prompts: PromptBuilder,
    counter: Arc<dyn TokenCounter>,
    cache: TranslationCache,
    options: ClientOptions,
    retry: RetryPolicy,
}

impl TranslationClient {
    /// Create a new client
    pub fn new(
        provider: Arc<dyn Provider>,
        prompts: PromptBuilder,
        counter: Arc<dyn TokenCounter>,
        cache: TranslationCache,
        options: ClientOptions,
    ) -> Self {
        Self {
            provider,
            prompts,
            counter,
            cache,
            options,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry schedule
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    pub fn counter(&self) -> &dyn TokenCounter {
        self.counter.as_ref()
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Build the request for a batch with the current context
    pub fn build_request(&self, batch: &[String], glossary: &Glossary, state: &RunState) -> ChatRequest {
        let glossary_section = self.prompts.glossary_section(glossary, batch);
        let system_prompt = self.prompts.system_prompt(&glossary_section);
        let context = state.context_window(self.options.context_pairs);
        let messages = self.prompts.build_messages(&system_prompt, &context, batch);

        let (presence, frequency) = if self.options.stream && !self.prompts.dict_format() {
            (0.2, 0.4)
        } else {
            (0.1, 0.2)
        };

        ChatRequest::new(self.options.model.clone())
            .messages(messages)
            .temperature(self.options.temperature)
            .penalties(presence, frequency)
            .stream(self.options.stream)
    }

    /// Prompt tokens a request for `batch` would carry, without context
    pub fn estimate_prompt_tokens(&self, batch: &[String], glossary: &Glossary) -> usize {
        let glossary_section = self.prompts.glossary_section(glossary, batch);
        let system_prompt = self.prompts.system_prompt(&glossary_section);
        self.counter.count(&system_prompt) + self.counter.count(&self.prompts.user_message(batch))
    }

    /// Translate one batch
    ///
    /// Returns the validated translation, or the original paragraphs when
    /// every attempt failed or the answer was truncated. Only rejected
    /// credentials end the run with an error.
    pub async fn translate(
        &self,
        batch: &[String],
        glossary: &Glossary,
        state: &mut RunState,
    ) -> Result<Vec<String>, TranslationError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        if self.options.use_split_cache {
            if let Some(hit) = self.cache.lookup_split(batch).await {
                if hit.len() == batch.len() {
                    debug!("Batch of {} paragraphs found in cache", batch.len());
                    state.push_context(batch, &hit, self.options.context_pairs);
                    return Ok(hit);
                }
                warn!(
                    "Cached batch has {} paragraphs instead of {}, translating again",
                    hit.len(),
                    batch.len()
                );
            }
        }

        let request = self.build_request(batch, glossary, state);

        for attempt in 0..self.options.max_try {
            match self.attempt(batch, &request, state).await {
                AttemptOutcome::Success(translated) => {
                    if attempt > 0 {
                        info!("Batch translated after {} retries", attempt);
                    }
                    self.cache.write_split(batch, &translated).await;
                    state.push_context(batch, &translated, self.options.context_pairs);
                    return Ok(translated);
                }
                AttemptOutcome::Degraded(original) => return Ok(original),
                AttemptOutcome::Fatal(e) => {
                    error!("Translation stopped: {}", e);
                    return Err(e);
                }
                AttemptOutcome::Recoverable(kind) => {
                    let delay = self.retry.delay_for(&kind, attempt);
                    warn!(
                        "Attempt {}/{} failed: {:?}",
                        attempt + 1,
                        self.options.max_try,
                        kind
                    );
                    if attempt + 1 < self.options.max_try && !delay.is_zero() {
                        info!("Waiting {} seconds before retrying", delay.as_secs());
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        state.failed += 1;
        error!(
            "Giving up on a batch of {} paragraphs after {} attempts, keeping the original text",
            batch.len(),
            self.options.max_try
        );
        Ok(batch.to_vec())
    }

    async fn attempt(&self, batch: &[String], request: &ChatRequest, state: &mut RunState) -> AttemptOutcome {
        let started = Instant::now();
        let result = self.provider.complete(request, self.options.timeout).await;
        state.usage.api_duration += started.elapsed();

        let completion = match result {
            Ok(completion) => completion,
            Err(e) => return AttemptOutcome::from_provider_error(e),
        };
        self.record_usage(request, &completion, state);

        if completion.is_truncated() {
            warn!("The answer was cut off by the token limit, keeping the original text of this batch");
            return AttemptOutcome::Degraded(batch.to_vec());
        }

        let parsed = match parse_response(&completion.content, self.prompts.dict_format()) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.cache
                    .write_failed(batch, std::slice::from_ref(&completion.content))
                    .await;
                return AttemptOutcome::Recoverable(RecoverableKind::Validation(e.to_string()));
            }
        };

        let received: Vec<String> = parsed.iter().map(|(_, text)| text.clone()).collect();
        match check_translation(batch, parsed, self.options.repeat_check) {
            Ok(report) => AttemptOutcome::Success(report.lines),
            Err(e) => {
                self.cache.write_failed(batch, &received).await;
                AttemptOutcome::Recoverable(RecoverableKind::Validation(e.to_string()))
            }
        }
    }

    /// Add server-reported usage, or count locally for streamed answers
    fn record_usage(&self, request: &ChatRequest, completion: &ChatCompletion, state: &mut RunState) {
        let (prompt, answer) = match completion.usage {
            Some(usage) => (usage.prompt_tokens, usage.completion_tokens),
            None => {
                let prompt: usize = request
                    .messages
                    .iter()
                    .map(|m: &ChatMessage| self.counter.count(&m.content))
                    .sum();
                (prompt as u64, self.counter.count(&completion.content) as u64)
            }
        };
        debug!("Request used {} prompt and {} completion tokens", prompt, answer);
        state.usage.add_token_usage(prompt, answer);
    }
}
