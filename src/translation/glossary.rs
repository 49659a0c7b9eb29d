/*!
 * Glossary of fixed translations.
 *
 * Entries come from a user JSON file of the form
 * `{"term": {"trans": "...", "class": "per", "gender": "female"}}` and are
 * extended with chapter titles after the title pass. Each entry renders
 * to one hint line for the system prompt.
 */

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Grammatical role of a glossary term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermClass {
    Noun,
    Person,
    Location,
    Title,
    Phrase,
    #[default]
    Other,
}

impl TermClass {
    /// Parse the class spelling used in glossary files
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "noun" => TermClass::Noun,
            "per" | "person" => TermClass::Person,
            "loc" | "location" => TermClass::Location,
            "title" => TermClass::Title,
            "phrase" => TermClass::Phrase,
            _ => TermClass::Other,
        }
    }

    /// Short spelling written back to glossary files
    pub fn as_str(&self) -> &'static str {
        match self {
            TermClass::Noun => "noun",
            TermClass::Person => "per",
            TermClass::Location => "loc",
            TermClass::Title => "title",
            TermClass::Phrase => "phrase",
            TermClass::Other => "other",
        }
    }
}

impl Serialize for TermClass {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TermClass {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(TermClass::parse(&value))
    }
}

/// Translation and class of one source term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    /// Fixed translation
    pub trans: String,

    /// Term class
    #[serde(default)]
    pub class: TermClass,

    /// Gender hint for personal names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl GlossaryEntry {
    /// Create an entry without a gender hint
    pub fn new(trans: impl Into<String>, class: TermClass) -> Self {
        Self {
            trans: trans.into(),
            class,
            gender: None,
        }
    }

    /// Descriptor used in the rendered hint line
    fn descriptor(&self) -> String {
        match self.class {
            TermClass::Noun => "noun".to_string(),
            TermClass::Person => match self.gender.as_deref().map(str::trim) {
                Some(gender) if !gender.is_empty() => {
                    format!("{} personal name or calling", gender)
                }
                _ => "personal name or calling".to_string(),
            },
            TermClass::Location => "location".to_string(),
            TermClass::Title => "chapter title".to_string(),
            TermClass::Phrase => "established phrase".to_string(),
            TermClass::Other => "term".to_string(),
        }
    }
}

/// Term → entry mapping with deterministic ordering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glossary {
    entries: BTreeMap<String, GlossaryEntry>,
}

impl Glossary {
    /// Create an empty glossary
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a glossary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read glossary file: {:?}", path))?;
        let glossary: Glossary = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse glossary file: {:?}", path))?;
        info!("Loaded {} glossary terms from {:?}", glossary.len(), path);
        Ok(glossary)
    }

    /// Add or replace a term
    pub fn insert(&mut self, term: impl Into<String>, entry: GlossaryEntry) {
        self.entries.insert(term.into(), entry);
    }

    /// Entry of a term
    pub fn get(&self, term: &str) -> Option<&GlossaryEntry> {
        self.entries.get(term)
    }

    /// Whether the term is present
    pub fn contains(&self, term: &str) -> bool {
        self.entries.contains_key(term)
    }

    /// Number of terms
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the glossary has no terms
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hint lines of the terms that occur in `text`
    ///
    /// Matching is plain substring containment.
    pub fn matching_lines(&self, text: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(term, _)| !term.is_empty() && text.contains(term.as_str()))
            .map(|(term, entry)| format_entry(term, entry))
            .collect()
    }

    /// Add translated chapter titles as `title` terms
    ///
    /// The flattened title lists must line up one to one; otherwise the pass
    /// is skipped. Existing terms are never replaced. Returns the number of
    /// terms added.
    pub fn add_titles(&mut self, original: &[Vec<String>], translated: &[Vec<String>]) -> usize {
        let original: Vec<&String> = original.iter().flatten().collect();
        let translated: Vec<&String> = translated.iter().flatten().collect();

        if original.len() != translated.len() {
            warn!(
                "Title counts differ ({} original, {} translated), titles were not added to the glossary",
                original.len(),
                translated.len()
            );
            return 0;
        }

        let mut added = 0;
        for (orig, trans) in original.into_iter().zip(translated) {
            let term = orig.trim();
            if term.is_empty() || self.contains(term) {
                continue;
            }
            self.insert(term, GlossaryEntry::new(trans.trim(), TermClass::Title));
            added += 1;
        }

        info!("Added {} chapter titles to the glossary", added);
        added
    }
}

/// Render one term as `- the {descriptor} "{term}" translates to "{trans}"`
pub fn format_entry(term: &str, entry: &GlossaryEntry) -> String {
    format!(
        "- the {} \"{}\" translates to \"{}\"",
        entry.descriptor(),
        term,
        entry.trans
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_entry_withPersonAndGender_shouldMentionGender() {
        let entry = GlossaryEntry {
            trans: "爱丽丝".to_string(),
            class: TermClass::Person,
            gender: Some("female".to_string()),
        };
        assert_eq!(
            format_entry("Alice", &entry),
            "- the female personal name or calling \"Alice\" translates to \"爱丽丝\""
        );
    }

    #[test]
    fn test_format_entry_withEachClass_shouldUseDescriptor() {
        let render = |class| format_entry("x", &GlossaryEntry::new("y", class));
        assert_eq!(render(TermClass::Noun), "- the noun \"x\" translates to \"y\"");
        assert_eq!(render(TermClass::Person), "- the personal name or calling \"x\" translates to \"y\"");
        assert_eq!(render(TermClass::Location), "- the location \"x\" translates to \"y\"");
        assert_eq!(render(TermClass::Title), "- the chapter title \"x\" translates to \"y\"");
        assert_eq!(render(TermClass::Phrase), "- the established phrase \"x\" translates to \"y\"");
        assert_eq!(render(TermClass::Other), "- the term \"x\" translates to \"y\"");
    }

    #[test]
    fn test_deserialize_withShortClassNames_shouldMapClasses() {
        let glossary: Glossary = serde_json::from_str(
            r#"{"Paris": {"trans": "巴黎", "class": "loc"}, "Bob": {"trans": "鲍勃", "class": "per"}, "x": {"trans": "y", "class": "weird"}}"#,
        )
        .unwrap();
        assert_eq!(glossary.get("Paris").unwrap().class, TermClass::Location);
        assert_eq!(glossary.get("Bob").unwrap().class, TermClass::Person);
        assert_eq!(glossary.get("x").unwrap().class, TermClass::Other);
    }

    #[test]
    fn test_matching_lines_withAbsentTerm_shouldSkipIt() {
        let mut glossary = Glossary::new();
        glossary.insert("Alice", GlossaryEntry::new("爱丽丝", TermClass::Person));
        glossary.insert("Narnia", GlossaryEntry::new("纳尼亚", TermClass::Location));

        let lines = glossary.matching_lines(r#"["Alice went home."]"#);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Alice"));
    }

    #[test]
    fn test_add_titles_withMatchingCounts_shouldAddMissingTerms() {
        let mut glossary = Glossary::new();
        glossary.insert("Prologue", GlossaryEntry::new("序幕", TermClass::Noun));
        let original = vec![vec!["Prologue".to_string()], vec!["The Storm".to_string()]];
        let translated = vec![vec!["开场".to_string()], vec!["风暴".to_string()]];

        let added = glossary.add_titles(&original, &translated);

        assert_eq!(added, 1);
        assert_eq!(glossary.get("Prologue").unwrap().trans, "序幕");
        assert_eq!(glossary.get("The Storm").unwrap().class, TermClass::Title);
    }

    #[test]
    fn test_add_titles_withMismatchedCounts_shouldSkip() {
        let mut glossary = Glossary::new();
        let original = vec![vec!["A".to_string(), "B".to_string()]];
        let translated = vec![vec!["甲".to_string()]];

        assert_eq!(glossary.add_titles(&original, &translated), 0);
        assert!(glossary.is_empty());
    }
}
