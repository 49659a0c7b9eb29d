/*!
 * Translation engine for long-form documents.
 *
 * This module contains the core functionality for translating pages of
 * paragraphs through a chat-completion model. It is split into several
 * submodules:
 *
 * - `tokens`: Token counting for budgets and usage accounting
 * - `limits`: Context window and timeout per model
 * - `glossary`: Fixed term translations rendered into prompts
 * - `prompts`: Prompt templates and builders for translation
 * - `cache`: Caching of translated batches and pages
 * - `batch`: Token-budgeted batching of paragraphs
 * - `core`: Per-batch translation with retries
 * - `restore`: Reassembly of translated batches into pages
 * - `orchestrator`: Whole-document task runs and cost estimates
 */

// Re-export main types for easier usage
pub use self::batch::Batcher;
pub use self::cache::TranslationCache;
pub use self::core::{ClientOptions, RetryPolicy, RunState, TokenUsageStats, TranslationClient};
pub use self::glossary::{Glossary, GlossaryEntry, TermClass};
pub use self::limits::{ModelLimits, resolve_limits};
pub use self::orchestrator::{BatchSettings, ConsumptionEstimate, TaskOrchestrator};
pub use self::tokens::{Cl100kCounter, TokenCounter};

// Re-export prompt types
pub use self::prompts::{PromptBuilder, PromptTemplate};

// Submodules
pub mod batch;
pub mod cache;
pub mod core;
pub mod glossary;
pub mod limits;
pub mod orchestrator;
pub mod prompts;
pub mod restore;
pub mod tokens;
