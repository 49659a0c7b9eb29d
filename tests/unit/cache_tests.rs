/*!
 * Tests for the persistent translation cache
 */

use anyhow::Result;

use bookwai::database::models::{serialize_paragraphs, CacheTable};
use bookwai::database::{CacheScope, DatabaseConnection, Repository};
use bookwai::translation::TranslationCache;
use crate::common;

fn paragraphs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn open_cache(path: &std::path::Path, model: &str) -> Result<TranslationCache> {
    let repo = Repository::new(DatabaseConnection::new(path)?);
    Ok(TranslationCache::new(repo, CacheScope::new("French", model)))
}

#[tokio::test]
async fn test_cache_file_withNewConnection_shouldKeepTranslations() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("book.db");

    {
        let cache = open_cache(&path, "gpt-4")?;
        cache
            .write_split(&paragraphs(&["Hello"]), &paragraphs(&["Bonjour"]))
            .await;
        cache
            .write_page(&paragraphs(&["Hello", "World"]), &paragraphs(&["Bonjour", "Monde"]))
            .await;
    }

    let reopened = open_cache(&path, "gpt-4")?;
    assert_eq!(
        reopened.lookup_split(&paragraphs(&["Hello"])).await,
        Some(paragraphs(&["Bonjour"]))
    );
    assert_eq!(
        reopened.lookup_page(&paragraphs(&["Hello", "World"])).await,
        Some(paragraphs(&["Bonjour", "Monde"]))
    );
    Ok(())
}

#[tokio::test]
async fn test_cache_lookup_withOtherModel_shouldMiss() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("book.db");

    open_cache(&path, "gpt-4")?
        .write_split(&paragraphs(&["Hello"]), &paragraphs(&["Bonjour"]))
        .await;

    let other = open_cache(&path, "gpt-3.5-turbo")?;
    assert_eq!(other.lookup_split(&paragraphs(&["Hello"])).await, None);
    Ok(())
}

#[tokio::test]
async fn test_write_failed_shouldAppendEveryRejection() -> Result<()> {
    let cache = TranslationCache::in_memory(CacheScope::new("French", "gpt-4"))?;

    cache
        .write_failed(&paragraphs(&["Hello"]), &paragraphs(&["Bonjour", "extra"]))
        .await;
    cache
        .write_failed(&paragraphs(&["Hello"]), &paragraphs(&["Bonjour", "extra"]))
        .await;

    assert_eq!(cache.repository().count(CacheTable::FailedCache).await?, 2);
    assert_eq!(cache.repository().count(CacheTable::SplitCache).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_reconnect_shouldSwitchCacheFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let first = temp_dir.path().join("first.db");
    let second = temp_dir.path().join("second.db");

    let cache = open_cache(&first, "gpt-4")?;
    cache
        .write_split(&paragraphs(&["Hello"]), &paragraphs(&["Bonjour"]))
        .await;
    cache.reconnect(&second)?;

    assert_eq!(cache.lookup_split(&paragraphs(&["Hello"])).await, None);
    assert!(second.exists());
    Ok(())
}

#[test]
fn test_serialize_paragraphs_shouldKeepNonAsciiVerbatim() -> Result<()> {
    assert_eq!(
        serialize_paragraphs(&paragraphs(&["a", "日本"]))?,
        r#"["a", "日本"]"#
    );
    Ok(())
}
