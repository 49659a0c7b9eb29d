/*!
 * Common test utilities for the bookwai test suite
 */

use anyhow::Result;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::FileOptions;

use bookwai::app_config::Config;

/// Routes log output through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Two-page plain-text book
pub const TEXT_BOOK: &str = "Chapter 1: The Start\n\nIt was a dark night.\n  The wind howled.\n7\n====\nChapter 2: The End\nMorning came.\n";

/// Creates a sample plain-text book for testing
pub fn create_test_book(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, TEXT_BOOK)
}

const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

const PACKAGE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <manifest>
    <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="ch2.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
</package>"#;

const CHAPTER_ONE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>One</title></head>
<body>
<h1>One</h1>
<p>The road went ever on.</p>
<p>12</p>
</body>
</html>"#;

const CHAPTER_TWO: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Two</title></head>
<body>
<h1>Two</h1>
<p>They walked <em>far</em> away.</p>
</body>
</html>"#;

/// Creates a two-chapter EPUB archive for testing
pub fn create_test_epub(dir: &Path, filename: &str) -> Result<PathBuf> {
    let path = dir.join(filename);
    let mut writer = ZipWriter::new(File::create(&path)?);
    let stored = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    writer.start_file("mimetype", stored)?;
    writer.write_all(b"application/epub+zip")?;
    for (name, content) in [
        ("META-INF/container.xml", CONTAINER),
        ("OEBPS/content.opf", PACKAGE),
        ("OEBPS/ch1.xhtml", CHAPTER_ONE),
        ("OEBPS/ch2.xhtml", CHAPTER_TWO),
    ] {
        writer.start_file(name, FileOptions::default())?;
        writer.write_all(content.as_bytes())?;
    }
    writer.finish()?;
    Ok(path)
}

/// Configuration writing its cache inside `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.target_language = "fr".to_string();
    config.openai.api_key = "test-key".to_string();
    config.translation.cache_file = Some(dir.join("cache.db"));
    config
}
