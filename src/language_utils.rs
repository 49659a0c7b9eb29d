//! Language utilities for target language handling
//!
//! The target language is rendered into prompts verbatim, so users may
//! write "Simplified Chinese, literary style". Bare ISO 639-1 and
//! ISO 639-2 codes are expanded to their English names first.

use anyhow::{Result, anyhow};
use isolang::Language;

/// Map ISO 639-2/B codes to their ISO 639-2/T equivalent
fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    match code {
        "fre" => Some("fra"),
        "ger" => Some("deu"),
        "dut" => Some("nld"),
        "gre" => Some("ell"),
        "chi" => Some("zho"),
        "cze" => Some("ces"),
        "ice" => Some("isl"),
        "alb" => Some("sqi"),
        "arm" => Some("hye"),
        "baq" => Some("eus"),
        "bur" => Some("mya"),
        "per" => Some("fas"),
        "geo" => Some("kat"),
        "may" => Some("msa"),
        "mac" => Some("mkd"),
        "rum" => Some("ron"),
        "slo" => Some("slk"),
        "wel" => Some("cym"),
        _ => None,
    }
}

/// Look up a language by its ISO 639-1 or ISO 639-2 code
fn lookup_language(code: &str) -> Option<Language> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code),
        3 => {
            let part2t = bibliographic_to_terminology(&normalized_code).unwrap_or(&normalized_code);
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Get the English language name from an ISO code
pub fn get_language_name(code: &str) -> Result<String> {
    lookup_language(code)
        .map(|lang| lang.to_name().to_string())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Produce the language description used in prompts and cache keys
///
/// Codes become names ("fr" -> "French"); anything else is trimmed and kept.
pub fn display_target_language(target: &str) -> String {
    match get_language_name(target) {
        Ok(name) => name,
        Err(_) => target.trim().to_string(),
    }
}
