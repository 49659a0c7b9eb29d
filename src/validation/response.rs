/*!
 * Parsing of model responses into numbered lines.
 *
 * Models wrap their answers in output markers or code fences and sometimes
 * emit single-quoted JSON. This module strips the wrapping and produces an
 * ordered list of `(key, text)` pairs for structural validation.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::errors::TranslationError;

/// Numbered lines in the order they appeared in the response
pub type NumberedLines = Vec<(String, String)>;

const OUTPUT_START: &str = "<!--start-output-->";
const OUTPUT_END: &str = "<!--end-output-->";

/// Regex for a fenced code block around the whole answer
static CODE_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\s*\n(.*?)\n?```$").expect("Invalid code fence regex")
});

/// Parse the content of a completion
///
/// With `dict_format` the body must be a JSON object keyed by line number.
/// Otherwise every non-empty line becomes one entry numbered from 1.
pub fn parse_response(content: &str, dict_format: bool) -> Result<NumberedLines, TranslationError> {
    let body = strip_wrapping(content);

    if dict_format {
        parse_object(&body)
    } else {
        Ok(body
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(index, line)| ((index + 1).to_string(), line.to_string()))
            .collect())
    }
}

/// Remove output markers and a surrounding code fence
pub fn strip_wrapping(content: &str) -> String {
    let mut body = content.trim();
    if let Some(start) = body.find(OUTPUT_START) {
        body = &body[start + OUTPUT_START.len()..];
    }
    if let Some(end) = body.rfind(OUTPUT_END) {
        body = &body[..end];
    }
    let body = body.trim();

    match CODE_FENCE_REGEX.captures(body) {
        Some(caps) => caps
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        None => body.to_string(),
    }
}

fn parse_object(body: &str) -> Result<NumberedLines, TranslationError> {
    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        // Single-quoted keys are the most common near-miss
        Err(e) if e.to_string().contains("key must be a string") => {
            debug!("Retrying response parse with double quotes");
            serde_json::from_str::<Value>(&body.replace('\'', "\"")).map_err(|e| {
                TranslationError::Validation(format!("Response is not valid JSON: {}", e))
            })?
        }
        Err(e) => {
            return Err(TranslationError::Validation(format!(
                "Response is not valid JSON: {}",
                e
            )));
        }
    };

    let Value::Object(map) = value else {
        return Err(TranslationError::Validation(
            "Response is not a JSON object".to_string(),
        ));
    };

    Ok(map
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(text) => text,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}
