/*!
 * Book formats.
 *
 * A document is read as raw pages plus page identifiers. Paragraphs and
 * titles are extracted from the raw pages, translated elsewhere, and
 * injected back before the document is written to a new location.
 *
 * - `epub`: EPUB archives, one page per XHTML manifest item
 * - `text`: plain-text books split at page marks
 */

use std::path::Path;

use crate::errors::DocumentError;

pub mod epub;
pub mod text;

pub use epub::EpubDocument;
pub use text::TextDocument;

/// Contract shared by all book formats
pub trait Document {
    /// Identifier of a page inside the document
    type PageId: Clone;

    /// Raw content of one page
    type Page: Clone;

    /// Read page identifiers and raw pages
    fn read(&self) -> Result<(Vec<Self::PageId>, Vec<Self::Page>), DocumentError>;

    /// Translatable paragraphs, one list per page
    ///
    /// Empty and numeral-only text is left out.
    fn extract_paragraphs(&self, pages: &[Self::Page]) -> Result<Vec<Vec<String>>, DocumentError>;

    /// Chapter titles of the pages that have any, de-duplicated per page
    fn extract_titles(&self, pages: &[Self::Page]) -> Result<Vec<Vec<String>>, DocumentError>;

    /// Replace original paragraphs with their translations
    fn apply_translations(
        &self,
        pages: &[Self::Page],
        original: &[Vec<String>],
        translated: &[Vec<String>],
    ) -> Result<Vec<Self::Page>, DocumentError>;

    /// Write the document with translated pages to `target`
    fn write(
        &self,
        target: &Path,
        ids: &[Self::PageId],
        pages: &[Self::Page],
    ) -> Result<(), DocumentError>;
}

/// Supported book formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookFormat {
    Epub,
    Text,
}

impl BookFormat {
    /// Detect the format from the file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "epub" => Ok(Self::Epub),
            "txt" => Ok(Self::Text),
            _ => Err(DocumentError::Unsupported(format!(
                "{:?} is neither an .epub nor a .txt file",
                path
            ))),
        }
    }
}
