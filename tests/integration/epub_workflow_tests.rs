/*!
 * End-to-end tests for EPUB translation
 */

use anyhow::Result;
use std::fs::File;
use std::io::Read;
use std::sync::Arc;
use zip::ZipArchive;

use bookwai::app_controller::{Controller, RunOutcome};
use bookwai::document::{Document, EpubDocument};
use bookwai::providers::mock::MockProvider;
use bookwai::translation::RetryPolicy;
use crate::common;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_run_withEpub_shouldTranslateEveryChapter() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let book = common::create_test_epub(temp_dir.path(), "book.epub")?;
    let out_dir = temp_dir.path().join("translated");
    let mock = Arc::new(MockProvider::echo("T:"));

    let outcome = Controller::with_config(common::test_config(temp_dir.path()))?
        .with_provider(mock.clone())
        .with_retry_policy(RetryPolicy::immediate())
        .with_progress(false)
        .run(&book, &out_dir, false)
        .await?;

    let RunOutcome::Translated { output, failed, .. } = outcome else {
        panic!("expected a translation run");
    };
    assert_eq!(failed, 0);

    let translated = EpubDocument::new(&output);
    let (ids, pages) = translated.read()?;
    assert_eq!(ids, strings(&["OEBPS/ch1.xhtml", "OEBPS/ch2.xhtml"]));
    assert_eq!(
        translated.extract_paragraphs(&pages)?,
        vec![
            strings(&["T:One", "T:The road went ever on."]),
            strings(&["T:Two", "T:They walked far away."]),
        ]
    );

    let mut archive = ZipArchive::new(File::open(&output)?)?;
    assert_eq!(archive.by_index(0)?.name(), "mimetype");
    let mut chapter = String::new();
    archive.by_name("OEBPS/ch1.xhtml")?.read_to_string(&mut chapter)?;
    assert!(chapter.contains("<title>One</title>"));
    assert!(chapter.contains("<p>12</p>"));
    Ok(())
}

#[tokio::test]
async fn test_run_withEpubAndPageCache_shouldReuseTranslatedPages() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let book = common::create_test_epub(temp_dir.path(), "book.epub")?;
    let out_dir = temp_dir.path().join("translated");
    let mut config = common::test_config(temp_dir.path());
    config.translation.cache_method = bookwai::app_config::CacheMethod::Page;
    config.translation.translate_titles = false;

    let first = Arc::new(MockProvider::echo("T:"));
    Controller::with_config(config.clone())?
        .with_provider(first.clone())
        .with_progress(false)
        .run(&book, &out_dir, false)
        .await?;
    assert_eq!(first.request_count(), 1);

    let second = Arc::new(MockProvider::echo("X:"));
    Controller::with_config(config)?
        .with_provider(second.clone())
        .with_progress(false)
        .run(&book, &out_dir, false)
        .await?;
    assert_eq!(second.request_count(), 0);
    Ok(())
}
