/*!
 * Prompt engineering for book translation.
 *
 * This module provides:
 * - System and user prompt templates with validated placeholders
 * - Batch-scoped glossary selection
 * - Message construction including replayed context pairs
 */

pub mod builder;
pub mod templates;

// Re-export main types
pub use builder::{PromptBuilder, DICT_SCHEMA};
pub use templates::{PromptTemplate, TemplateKind};
