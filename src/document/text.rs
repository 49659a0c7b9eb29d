use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use super::Document;
use crate::errors::DocumentError;
use crate::text_utils::{fix_indent, is_translatable};

// @module: Plain-text books

/// Lines containing one of these start a new page
const PAGE_MARKS: [&str; 2] = ["====", "----"];

static TITLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:Chapter \d+: .+|Ch\. \d+: .+|Section \d+\.\d+: .+)")
        .expect("Invalid title regex")
});

fn is_page_mark(line: &str) -> bool {
    PAGE_MARKS.iter().any(|mark| line.contains(mark))
}

/// Plain-text book split into pages at mark lines
#[derive(Debug, Clone)]
pub struct TextDocument {
    path: PathBuf,
}

impl TextDocument {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    // @splits: Right-trimmed lines into pages; a mark line opens the next page
    pub fn split_pages(content: &str) -> (Vec<usize>, Vec<Vec<String>>) {
        let mut ids = vec![0];
        let mut pages = Vec::new();
        let mut current = Vec::new();

        for (line_number, line) in content.lines().enumerate() {
            let line = line.trim_end().to_string();
            if is_page_mark(&line) {
                pages.push(std::mem::take(&mut current));
                ids.push(line_number);
            }
            current.push(line);
        }
        pages.push(current);

        (ids, pages)
    }
}

impl Document for TextDocument {
    type PageId = usize;
    type Page = Vec<String>;

    fn read(&self) -> Result<(Vec<usize>, Vec<Vec<String>>), DocumentError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(Self::split_pages(&content))
    }

    fn extract_paragraphs(&self, pages: &[Vec<String>]) -> Result<Vec<Vec<String>>, DocumentError> {
        Ok(pages
            .iter()
            .map(|page| {
                page.iter()
                    .filter(|line| is_translatable(line) && !is_page_mark(line))
                    .cloned()
                    .collect()
            })
            .collect())
    }

    fn extract_titles(&self, pages: &[Vec<String>]) -> Result<Vec<Vec<String>>, DocumentError> {
        let mut titles = Vec::new();
        for page in pages {
            let mut page_titles: Vec<String> = Vec::new();
            for line in page {
                if TITLE_REGEX.is_match(line) && !page_titles.contains(line) {
                    page_titles.push(line.clone());
                }
            }
            if !page_titles.is_empty() {
                titles.push(page_titles);
            }
        }
        Ok(titles)
    }

    fn apply_translations(
        &self,
        pages: &[Vec<String>],
        original: &[Vec<String>],
        translated: &[Vec<String>],
    ) -> Result<Vec<Vec<String>>, DocumentError> {
        let empty = Vec::new();
        let mut result = Vec::with_capacity(pages.len());

        for (index, page) in pages.iter().enumerate() {
            let originals = original.get(index).unwrap_or(&empty);
            let translations = translated.get(index).unwrap_or(&empty);
            let mut pairs = originals.iter().zip(translations).peekable();

            let mut translated_page = Vec::with_capacity(page.len());
            for line in page {
                match pairs.peek() {
                    Some((orig, trans)) if *orig == line => {
                        translated_page.push(fix_indent(line, trans));
                        pairs.next();
                    }
                    _ => translated_page.push(line.clone()),
                }
            }
            result.push(translated_page);
        }

        Ok(result)
    }

    fn write(&self, target: &Path, _ids: &[usize], pages: &[Vec<String>]) -> Result<(), DocumentError> {
        let mut content = String::new();
        for page in pages {
            content.push_str(&page.join("\n"));
            content.push('\n');
        }
        fs::write(target, content)?;
        Ok(())
    }
}
