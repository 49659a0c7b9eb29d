/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use std::path::PathBuf;

use bookwai::app_config::{CacheMethod, Config, LogLevel};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.target_language, "Simplified Chinese");
    assert_eq!(config.openai.model, "gpt-3.5-turbo");
    assert_eq!(config.openai.api_base, "https://api.openai.com");
    assert_eq!(config.translation.cache_method, CacheMethod::Split);
    assert_eq!(config.translation.max_try, 3);
    assert_eq!(config.translation.context_pairs, 0);
    assert!((config.translation.limit_fraction - 0.75).abs() < f64::EPSILON);
    assert!(config.translation.translate_titles);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test that a missing file is created with defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("config").join("default.json");

    let created = Config::load_or_create(&path)?;
    assert!(path.exists());

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.openai.model, created.openai.model);
    assert_eq!(reloaded.target_language, created.target_language);
    Ok(())
}

/// Test that partial files are completed with defaults
#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "config.json",
        r#"{"target_language": "German", "openai": {"model": "gpt-4"}, "translation": {"cache_method": "page"}}"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.target_language, "German");
    assert_eq!(config.openai.model, "gpt-4");
    assert!(config.translation.cache_method.use_page_cache());
    assert!(!config.translation.cache_method.use_split_cache());
    assert!(config.translation.dict_format);
    Ok(())
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    config.openai.api_key = "key".to_string();
    assert!(config.validate(true).is_ok());

    config.target_language = "  ".to_string();
    assert!(config.validate(false).is_err());
    config.target_language = "fr".to_string();

    config.openai.api_base = "not a url".to_string();
    assert!(config.validate(false).is_err());
    config.openai.api_base = "http://localhost:1234".to_string();

    config.translation.max_try = 0;
    assert!(config.validate(false).is_err());
    config.translation.max_try = 1;

    config.translation.limit_fraction = 1.5;
    assert!(config.validate(false).is_err());
    config.translation.limit_fraction = 0.5;

    config.translation.cache_file = Some(PathBuf::from("cache.db"));
    assert!(config.validate(false).is_ok());
}
