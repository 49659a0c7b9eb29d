/*!
 * # bookwai - book translation with chat-completion models
 *
 * A Rust library for translating long documents with OpenAI-compatible
 * chat-completion endpoints.
 *
 * ## Features
 *
 * - Read EPUB archives and plain-text books, write translated copies
 * - Token-budgeted batching of paragraphs
 * - Retries with rate-limit aware back-off
 * - Structural validation of model answers
 * - SQLite cache of translated batches and pages
 * - Glossaries, including translated chapter titles
 * - Token consumption estimates without sending requests
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: Book formats (`document::epub`, `document::text`)
 * - `translation`: Translation engine:
 *   - `translation::batch`: Token-budgeted batching
 *   - `translation::core`: Per-batch translation with retries
 *   - `translation::cache`: Caching of translated batches and pages
 *   - `translation::orchestrator`: Whole-document task runs
 * - `validation`: Parsing and checking of model answers
 * - `database`: SQLite persistence for the caches
 * - `providers`: Chat-completion clients (`providers::openai`, `providers::mock`)
 * - `file_utils`: File system operations
 * - `text_utils`: Paragraph helpers
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod text_utils;
pub mod translation;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunOutcome};
pub use document::{BookFormat, Document, EpubDocument, TextDocument};
pub use errors::{DocumentError, ProviderError, TranslationError};
pub use language_utils::{display_target_language, get_language_name};
pub use translation::{TaskOrchestrator, TranslationClient};
