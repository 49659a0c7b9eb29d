use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Target language, either an ISO code or a free-form description
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Chat-completion endpoint settings
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Translation behaviour
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// OpenAI-compatible endpoint configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIConfig {
    /// API key; falls back to the OPENAI_API_KEY environment variable
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Base URL of the API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Path of the chat completion route
    #[serde(default = "default_api_path")]
    pub api_path: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Model is not in the known limits table
    #[serde(default)]
    pub unofficial_model: bool,

    /// Context window of an unofficial model in tokens
    #[serde(default)]
    pub context_limit: usize,

    /// Explicit batch budget (0 = computed)
    #[serde(default)]
    pub token_limit: usize,

    /// Request timeout override in seconds (0 = model default)
    #[serde(default)]
    pub timeout_secs: u64,
}

/// Which cache level is consulted before calling the API
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheMethod {
    // @cache: per batch
    #[default]
    Split,
    // @cache: per page
    Page,
    // @cache: disabled
    #[serde(alias = "None")]
    None,
}

impl CacheMethod {
    /// Whether batch-level lookups are enabled
    pub fn use_split_cache(&self) -> bool {
        matches!(self, CacheMethod::Split)
    }

    /// Whether page-level lookups are enabled
    pub fn use_page_cache(&self) -> bool {
        matches!(self, CacheMethod::Page)
    }
}

impl std::fmt::Display for CacheMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheMethod::Split => write!(f, "split"),
            CacheMethod::Page => write!(f, "page"),
            CacheMethod::None => write!(f, "none"),
        }
    }
}

/// Translation behaviour settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Cache lookup level
    #[serde(default)]
    pub cache_method: CacheMethod,

    /// Cache database file (must end with .db)
    #[serde(default)]
    pub cache_file: Option<PathBuf>,

    /// Glossary JSON file
    #[serde(default)]
    pub glossary_file: Option<PathBuf>,

    /// Use server-sent events for responses
    #[serde(default = "default_true")]
    pub stream: bool,

    /// Send batches as numbered JSON objects
    #[serde(default = "default_true")]
    pub dict_format: bool,

    /// Reject translations whose duplicate count differs from the source
    #[serde(default = "default_true")]
    pub repeat_check: bool,

    /// Attempts per batch
    #[serde(default = "default_max_try")]
    pub max_try: u32,

    /// Previous batches replayed as examples
    #[serde(default)]
    pub context_pairs: usize,

    /// Share of the context window usable for prompt and answer
    #[serde(default = "default_limit_fraction")]
    pub limit_fraction: f64,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Custom system prompt template
    #[serde(default = "String::new")]
    pub system_prompt: String,

    /// Custom user prompt template
    #[serde(default = "String::new")]
    pub user_prompt: String,

    /// Translate chapter titles first and add them to the glossary
    #[serde(default = "default_true")]
    pub translate_titles: bool,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
            api_path: default_api_path(),
            model: default_model(),
            unofficial_model: false,
            context_limit: 0,
            token_limit: 0,
            timeout_secs: 0,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            cache_method: CacheMethod::default(),
            cache_file: None,
            glossary_file: None,
            stream: true,
            dict_format: true,
            repeat_check: true,
            max_try: default_max_try(),
            context_pairs: 0,
            limit_fraction: default_limit_fraction(),
            temperature: default_temperature(),
            system_prompt: String::new(),
            user_prompt: String::new(),
            translate_titles: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the filter used by the log facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_target_language() -> String {
    "Simplified Chinese".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com".to_string()
}

fn default_api_path() -> String {
    "/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_try() -> u32 {
    3
}

fn default_limit_fraction() -> f64 {
    0.75
}

fn default_temperature() -> f32 {
    0.6
}

fn default_true() -> bool {
    true
}

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

impl Config {
    /// Load a configuration file, creating it with defaults when missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        log::warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }
        }
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    ///
    /// The API key is only required when requests will actually be sent.
    pub fn validate(&self, require_api_key: bool) -> Result<()> {
        if self.target_language.trim().is_empty() {
            return Err(anyhow!("Target language must not be empty"));
        }

        Url::parse(&self.openai.api_base)
            .with_context(|| format!("Invalid api_base: {}", self.openai.api_base))?;

        if self.openai.model.trim().is_empty() {
            return Err(anyhow!("Model must not be empty"));
        }

        if self.openai.unofficial_model && self.openai.context_limit == 0 {
            return Err(anyhow!("An unofficial model requires an explicit context_limit"));
        }

        if self.translation.max_try == 0 {
            return Err(anyhow!("max_try must be at least 1"));
        }

        let fraction = self.translation.limit_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(anyhow!("limit_fraction must be within (0, 1], got {}", fraction));
        }

        if let Some(cache_file) = &self.translation.cache_file {
            if cache_file.extension().and_then(|e| e.to_str()) != Some("db") {
                return Err(anyhow!("Cache file must have a .db extension: {:?}", cache_file));
            }
        }

        if require_api_key && self.api_key().is_empty() {
            return Err(anyhow!(
                "An API key is required: set openai.api_key or the {} environment variable",
                API_KEY_ENV
            ));
        }

        Ok(())
    }

    /// Resolve the API key from the config or the environment
    pub fn api_key(&self) -> String {
        if !self.openai.api_key.is_empty() {
            return self.openai.api_key.clone();
        }
        std::env::var(API_KEY_ENV).unwrap_or_default()
    }

    /// Full URL of the chat completion route
    pub fn chat_url(&self) -> String {
        format!(
            "{}/{}",
            self.openai.api_base.trim_end_matches('/'),
            self.openai.api_path.trim_start_matches('/')
        )
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: default_target_language(),
            openai: OpenAIConfig::default(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
