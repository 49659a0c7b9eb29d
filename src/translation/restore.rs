/*!
 * Reassembly of translated batches into pages.
 *
 * Batches are consumed as one continuous stream of paragraphs, so a page may
 * draw from several batches and a batch may feed several pages.
 */

use crate::text_utils::is_numeral;

/// Pages rebuilt from a stream of translated batches
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Restoration {
    /// One translated page per original page
    pub pages: Vec<Vec<String>>,

    /// Paragraphs replaced with a shortfall placeholder
    pub lost: usize,

    /// Translated paragraphs left over after the last page
    pub leftover: usize,

    /// Indices of pages that are safe to store in the page cache
    pub cacheable: Vec<usize>,
}

/// Placeholder written for each paragraph the stream could not supply
pub fn shortfall_placeholder(page_index: usize) -> String {
    format!("Not enough translated content for page {}.", page_index)
}

/// Rebuild `original_pages` from `translated_batches`
///
/// A page becomes cacheable when no shortfall has happened so far and none
/// of its text paragraphs came back identical to the source. Bare numerals
/// may stay unchanged.
pub fn reassemble(original_pages: &[Vec<String>], translated_batches: &[Vec<String>]) -> Restoration {
    let mut stream = translated_batches.iter().flatten();
    let mut restoration = Restoration::default();

    for (page_index, page) in original_pages.iter().enumerate() {
        let mut restored = Vec::with_capacity(page.len());
        for _ in 0..page.len() {
            match stream.next() {
                Some(paragraph) => restored.push(paragraph.clone()),
                None => {
                    restored.push(shortfall_placeholder(page_index));
                    restoration.lost += 1;
                }
            }
        }

        let untranslated = page
            .iter()
            .zip(&restored)
            .any(|(original, translated)| original == translated && !is_numeral(original));
        if restoration.lost == 0 && !untranslated {
            restoration.cacheable.push(page_index);
        }

        restoration.pages.push(restored);
    }

    restoration.leftover = stream.count();
    restoration
}
