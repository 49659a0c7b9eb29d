/*!
 * Tests for dry-run consumption estimates
 */

use anyhow::Result;

use bookwai::app_controller::{Controller, RunOutcome};
use crate::common;

/// Estimates need neither a key nor a provider and leave no files behind
#[tokio::test]
async fn test_run_withEstimateOnly_shouldNotWriteAnything() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let book = common::create_test_book(temp_dir.path(), "novel.txt")?;
    let out_dir = temp_dir.path().join("translated");
    let mut config = common::test_config(temp_dir.path());
    config.openai.api_key = String::new();

    let outcome = Controller::with_config(config)?
        .with_progress(false)
        .run(&book, &out_dir, true)
        .await?;

    let RunOutcome::Estimated { titles, content } = outcome else {
        panic!("expected an estimate");
    };
    assert_eq!(titles.batches, 1);
    assert_eq!(content.batches, 1);
    assert!(content.prompt_tokens > titles.prompt_tokens);
    assert!(!out_dir.exists());
    assert!(!temp_dir.path().join("cache.db").exists());
    Ok(())
}

/// A smaller custom budget yields more requests
#[tokio::test]
async fn test_run_withSmallCustomBudget_shouldEstimateMoreBatches() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let book = common::create_test_book(temp_dir.path(), "novel.txt")?;
    let mut config = common::test_config(temp_dir.path());
    config.translation.translate_titles = false;
    config.openai.token_limit = 10;

    let outcome = Controller::with_config(config)?
        .with_progress(false)
        .run(&book, temp_dir.path(), true)
        .await?;

    let RunOutcome::Estimated { titles, content } = outcome else {
        panic!("expected an estimate");
    };
    assert_eq!(titles.batches, 0);
    assert!(content.batches > 1);
    Ok(())
}

/// Paragraphs larger than the budget are reported before anything is sent
#[tokio::test]
async fn test_run_withParagraphOverBudget_shouldFail() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let long_line = "word ".repeat(400);
    let book = common::create_test_file(temp_dir.path(), "long.txt", &long_line)?;
    let mut config = common::test_config(temp_dir.path());
    config.openai.token_limit = 50;

    let result = Controller::with_config(config)?
        .with_progress(false)
        .run(&book, temp_dir.path(), true)
        .await;

    assert!(result.is_err());
    Ok(())
}
