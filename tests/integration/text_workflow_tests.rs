/*!
 * End-to-end tests for plain-text book translation
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;

use bookwai::app_controller::{Controller, RunOutcome};
use bookwai::providers::mock::{MockProvider, MockReply};
use bookwai::translation::RetryPolicy;
use crate::common;

fn controller(config: bookwai::Config, provider: Arc<MockProvider>) -> Result<Controller> {
    Ok(Controller::with_config(config)?
        .with_provider(provider)
        .with_retry_policy(RetryPolicy::immediate())
        .with_progress(false))
}

/// Test a full run with an echoing model
#[tokio::test]
async fn test_run_withEchoProvider_shouldWriteTranslatedBook() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let book = common::create_test_book(temp_dir.path(), "novel.txt")?;
    let out_dir = temp_dir.path().join("translated");
    let mock = Arc::new(MockProvider::echo("T:"));

    let outcome = controller(common::test_config(temp_dir.path()), mock.clone())?
        .run(&book, &out_dir, false)
        .await?;

    let RunOutcome::Translated { output, failed, .. } = outcome else {
        panic!("expected a translation run");
    };
    assert_eq!(failed, 0);
    assert!(output.starts_with(&out_dir));
    assert!(output.file_name().unwrap().to_string_lossy().ends_with("]novel.txt"));

    let written = fs::read_to_string(&output)?;
    assert_eq!(
        written,
        "T:Chapter 1: The Start\n\nT:It was a dark night.\n  T:  The wind howled.\n7\n====\nT:Chapter 2: The End\nT:Morning came.\n"
    );
    // One request for the titles, one for the content
    assert_eq!(mock.request_count(), 2);
    Ok(())
}

/// Test that a second run is served from the cache file
#[tokio::test]
async fn test_run_twice_shouldReuseCachedBatches() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let book = common::create_test_book(temp_dir.path(), "novel.txt")?;
    let out_dir = temp_dir.path().join("translated");

    let first = Arc::new(MockProvider::echo("T:"));
    controller(common::test_config(temp_dir.path()), first.clone())?
        .run(&book, &out_dir, false)
        .await?;

    let second = Arc::new(MockProvider::echo("X:"));
    let outcome = controller(common::test_config(temp_dir.path()), second.clone())?
        .run(&book, &out_dir, false)
        .await?;

    let RunOutcome::Translated { output, .. } = outcome else {
        panic!("expected a translation run");
    };
    assert_eq!(second.request_count(), 0);
    assert!(fs::read_to_string(output)?.contains("T:Morning came."));
    Ok(())
}

/// Test that exhausted retries keep the original text
#[tokio::test]
async fn test_run_withPersistentServerErrors_shouldKeepOriginalText() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let book = common::create_test_book(temp_dir.path(), "novel.txt")?;
    let out_dir = temp_dir.path().join("translated");
    let mut config = common::test_config(temp_dir.path());
    config.translation.translate_titles = false;
    let mock = Arc::new(MockProvider::scripted(vec![
        MockReply::Status(500),
        MockReply::Status(503),
        MockReply::Timeout,
    ]));

    let outcome = controller(config, mock.clone())?
        .run(&book, &out_dir, false)
        .await?;

    let RunOutcome::Translated { output, failed, .. } = outcome else {
        panic!("expected a translation run");
    };
    assert_eq!(failed, 1);
    assert_eq!(mock.request_count(), 3);
    assert_eq!(fs::read_to_string(output)?, common::TEXT_BOOK);
    Ok(())
}

/// Test that a recoverable failure is retried
#[tokio::test]
async fn test_run_withRateLimitThenSuccess_shouldTranslate() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let book = common::create_test_book(temp_dir.path(), "novel.txt")?;
    let out_dir = temp_dir.path().join("translated");
    let mut config = common::test_config(temp_dir.path());
    config.translation.translate_titles = false;
    let mock = Arc::new(MockProvider::scripted(vec![MockReply::Status(429)]));

    let outcome = controller(config, mock.clone())?
        .run(&book, &out_dir, false)
        .await?;

    let RunOutcome::Translated { output, failed, .. } = outcome else {
        panic!("expected a translation run");
    };
    assert_eq!(failed, 0);
    assert_eq!(mock.request_count(), 2);
    assert!(fs::read_to_string(output)?.contains("T:It was a dark night."));
    Ok(())
}

/// Test that a rejected credential aborts the run
#[tokio::test]
async fn test_run_withRejectedKey_shouldFail() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let book = common::create_test_book(temp_dir.path(), "novel.txt")?;
    let out_dir = temp_dir.path().join("translated");
    let mock = Arc::new(MockProvider::scripted(vec![MockReply::Status(401)]));

    let result = controller(common::test_config(temp_dir.path()), mock.clone())?
        .run(&book, &out_dir, false)
        .await;

    assert!(result.is_err());
    assert_eq!(mock.request_count(), 1);
    assert!(!out_dir.exists());
    Ok(())
}

/// Test that unsupported files are rejected before any request
#[tokio::test]
async fn test_run_withUnsupportedFormat_shouldFail() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let book = common::create_test_file(temp_dir.path(), "novel.pdf", "%PDF")?;
    let mock = Arc::new(MockProvider::echo("T:"));

    let result = controller(common::test_config(temp_dir.path()), mock.clone())?
        .run(&book, temp_dir.path(), false)
        .await;

    assert!(result.is_err());
    assert_eq!(mock.request_count(), 0);
    Ok(())
}
