/*!
 * Database entity models.
 *
 * These structures map directly to the cache tables and provide
 * type-safe access to persisted translations.
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine identifier stored alongside every cache row
pub const ENGINE_NAME: &str = "openai";

/// The three cache tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheTable {
    /// One row per translated batch
    SplitCache,
    /// One row per restored page
    PageCache,
    /// Append-only log of rejected translations
    FailedCache,
}

impl CacheTable {
    /// SQL table name
    pub fn table_name(&self) -> &'static str {
        match self {
            CacheTable::SplitCache => "split_cache",
            CacheTable::PageCache => "page_cache",
            CacheTable::FailedCache => "failed_cache",
        }
    }
}

impl fmt::Display for CacheTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

/// Identity of a cached translation, minus the content itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheScope {
    /// Target language as rendered into prompts
    pub target: String,
    /// Engine name
    pub engine: String,
    /// Model identifier
    pub model: String,
}

impl CacheScope {
    /// Create a scope for the default engine
    pub fn new(target: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            engine: ENGINE_NAME.to_string(),
            model: model.into(),
        }
    }
}

/// A cached translation row
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord {
    pub target: String,
    pub engine: String,
    pub model: String,
    pub original: Vec<String>,
    pub trans: Vec<String>,
}

/// A row of the failure log
#[derive(Debug, Clone, PartialEq)]
pub struct FailedRecord {
    pub target: String,
    pub engine: String,
    pub model: String,
    pub original: Vec<String>,
    pub trans: Vec<String>,
    /// Local wall-clock time, `%Y-%m-%d %H:%M:%S`
    pub time: String,
}

/// Result of a cache write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Updated,
    /// A row existed and overwriting was not allowed, or the content was empty
    Skipped,
}

/// Serialize a paragraph list into the stored column format
///
/// Items are separated by `", "` and non-ASCII text is kept verbatim, which
/// matches cache files written by earlier releases.
pub fn serialize_paragraphs(paragraphs: &[String]) -> Result<String> {
    let items = paragraphs
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to serialize paragraphs")?;
    Ok(format!("[{}]", items.join(", ")))
}

/// Parse a stored column back into a paragraph list
pub fn deserialize_paragraphs(column: &str) -> Result<Vec<String>> {
    serde_json::from_str(column).with_context(|| {
        format!(
            "Cached content is not a JSON string array: {}",
            column.chars().take(80).collect::<String>()
        )
    })
}
