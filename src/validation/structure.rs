/*!
 * Structural validation of a translated batch against its source.
 *
 * Three checks run in order: repeated lines must repeat as often as in the
 * source, at most one line may be missing (it is backfilled with the
 * original), and the response may not contain more lines than the source.
 */

use log::{debug, warn};
use std::collections::{HashMap, HashSet};

use super::response::NumberedLines;
use crate::errors::TranslationError;

/// Outcome details of a successful check
#[derive(Debug, Clone, PartialEq)]
pub struct StructureReport {
    /// Translated lines ordered by source index
    pub lines: Vec<String>,
    /// 1-based indices that were filled with the original text
    pub backfilled: Vec<usize>,
}

/// Number of entries that duplicate an earlier entry
fn duplicate_count<'a>(items: impl Iterator<Item = &'a str>) -> usize {
    let mut seen = HashSet::new();
    items.filter(|item| !seen.insert(*item)).count()
}

/// Validate `translated` against `source` and order it by index 1..=n
pub fn check_translation(
    source: &[String],
    translated: NumberedLines,
    repeat_check: bool,
) -> Result<StructureReport, TranslationError> {
    if repeat_check {
        let source_dups = duplicate_count(source.iter().map(String::as_str));
        let translated_dups = duplicate_count(translated.iter().map(|(_, text)| text.as_str()));
        if source_dups != translated_dups {
            return Err(TranslationError::Validation(format!(
                "Repeated lines differ: source has {} duplicates, translation has {}",
                source_dups, translated_dups
            )));
        }
    }

    let received = translated.len();
    let mut by_key: HashMap<String, String> = translated.into_iter().collect();

    let mut lines = Vec::with_capacity(source.len());
    let mut backfilled = Vec::new();
    for (offset, original) in source.iter().enumerate() {
        let index = offset + 1;
        match by_key.remove(&index.to_string()) {
            Some(text) => lines.push(text),
            None => {
                backfilled.push(index);
                lines.push(original.clone());
            }
        }
    }

    if backfilled.len() > 1 {
        return Err(TranslationError::Validation(format!(
            "{} lines are missing from the translation: {:?}",
            backfilled.len(),
            backfilled
        )));
    }
    if let Some(index) = backfilled.first() {
        warn!("Line {} is missing from the translation, kept the original", index);
    }

    if received + backfilled.len() > source.len() {
        return Err(TranslationError::Validation(format!(
            "Translation has more lines than the source: {} > {}",
            received + backfilled.len(),
            source.len()
        )));
    }

    debug!("Validated {} translated lines", lines.len());
    Ok(StructureReport { lines, backfilled })
}
