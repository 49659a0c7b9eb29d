/*!
 * Translation cache bound to one target language and model.
 *
 * Wraps the repository with the scope of the current run. Cache problems
 * never abort a translation: failed lookups count as misses and failed
 * writes are logged.
 */

use anyhow::Result;
use log::{debug, warn};
use std::path::Path;

use crate::database::models::{CacheScope, CacheTable, FailedRecord, WriteOutcome};
use crate::database::Repository;

/// Cache access for one run
#[derive(Clone)]
pub struct TranslationCache {
    repo: Repository,
    scope: CacheScope,
}

impl TranslationCache {
    /// Create a cache over a repository
    pub fn new(repo: Repository, scope: CacheScope) -> Self {
        Self { repo, scope }
    }

    /// Create a cache backed by an in-memory database
    pub fn in_memory(scope: CacheScope) -> Result<Self> {
        Ok(Self::new(Repository::new_in_memory()?, scope))
    }

    /// Scope used for every key
    pub fn scope(&self) -> &CacheScope {
        &self.scope
    }

    /// Underlying repository
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Switch to another cache file
    pub fn reconnect<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.repo.connection().reconnect(path)
    }

    /// Batch-level lookup
    pub async fn lookup_split(&self, original: &[String]) -> Option<Vec<String>> {
        self.lookup(CacheTable::SplitCache, original).await
    }

    /// Page-level lookup
    pub async fn lookup_page(&self, original: &[String]) -> Option<Vec<String>> {
        self.lookup(CacheTable::PageCache, original).await
    }

    /// Store a translated batch
    pub async fn write_split(&self, original: &[String], trans: &[String]) {
        self.write(CacheTable::SplitCache, original, trans).await;
    }

    /// Store a restored page
    pub async fn write_page(&self, original: &[String], trans: &[String]) {
        self.write(CacheTable::PageCache, original, trans).await;
    }

    /// Log a rejected translation with the current time
    pub async fn write_failed(&self, original: &[String], trans: &[String]) {
        let record = FailedRecord {
            target: self.scope.target.clone(),
            engine: self.scope.engine.clone(),
            model: self.scope.model.clone(),
            original: original.to_vec(),
            trans: trans.to_vec(),
            time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        if let Err(e) = self.repo.append_failed(&record).await {
            warn!("Failed to record rejected translation: {}", e);
        }
    }

    async fn lookup(&self, table: CacheTable, original: &[String]) -> Option<Vec<String>> {
        if original.is_empty() {
            return None;
        }
        match self.repo.lookup(table, &self.scope, original).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Cache lookup in {} failed, treating as miss: {}", table, e);
                None
            }
        }
    }

    async fn write(&self, table: CacheTable, original: &[String], trans: &[String]) {
        match self.repo.write(table, &self.scope, original, trans, false).await {
            Ok(WriteOutcome::Inserted) => debug!("Stored {} paragraphs in {}", original.len(), table),
            Ok(_) => {}
            Err(e) => warn!("Failed to write {}: {}", table, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_lookup_split_afterWrite_shouldReturnWrittenValue() {
        let cache = TranslationCache::in_memory(CacheScope::new("French", "gpt-4")).unwrap();
        let original = paragraphs(&["one", "two"]);
        let trans = paragraphs(&["un", "deux"]);

        cache.write_split(&original, &trans).await;

        assert_eq!(cache.lookup_split(&original).await, Some(trans));
        assert_eq!(cache.lookup_page(&original).await, None);
    }

    #[tokio::test]
    async fn test_lookup_withReorderedContent_shouldMiss() {
        let cache = TranslationCache::in_memory(CacheScope::new("French", "gpt-4")).unwrap();
        cache
            .write_split(&paragraphs(&["one", "two"]), &paragraphs(&["un", "deux"]))
            .await;

        assert_eq!(cache.lookup_split(&paragraphs(&["two", "one"])).await, None);
    }

    #[tokio::test]
    async fn test_write_failed_shouldAppendRow() {
        let cache = TranslationCache::in_memory(CacheScope::new("French", "gpt-4")).unwrap();
        cache.write_failed(&paragraphs(&["a"]), &[]).await;
        cache.write_failed(&paragraphs(&["a"]), &[]).await;

        let count = cache.repository().count(CacheTable::FailedCache).await.unwrap();
        assert_eq!(count, 2);
    }
}
