use once_cell::sync::Lazy;
use regex::Regex;

// @module: Small text helpers shared by the engine and the document readers

static ROMAN_NUMERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^M{0,3}(CM|CD|D?C{0,3})(XC|XL|L?X{0,3})(IX|IV|V?I{0,3})$")
        .expect("valid roman numeral pattern")
});

// @checks: Non-empty roman numeral in canonical upper-case form
pub fn is_roman_numeral(text: &str) -> bool {
    !text.is_empty() && ROMAN_NUMERAL.is_match(text)
}

// @checks: Text is a bare arabic or roman numeral (page numbers, chapter numbers)
pub fn is_numeral(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    text.chars().all(|c| c.is_ascii_digit()) || is_roman_numeral(text)
}

// @checks: Text carries something worth translating
pub fn is_translatable(text: &str) -> bool {
    !text.trim().is_empty() && !is_numeral(text)
}

// @returns: Leading spaces and tabs of a line
pub fn leading_indent(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}

// @transfers: Indentation of the original line onto its translation
pub fn fix_indent(original: &str, translated: &str) -> String {
    let indent = leading_indent(original);
    let body = translated.trim_start_matches([' ', '\t']);
    format!("{}{}", indent, body)
}
