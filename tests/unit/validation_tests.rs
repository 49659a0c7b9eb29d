/*!
 * Tests for parsing and checking model answers
 */

use bookwai::errors::TranslationError;
use bookwai::validation::{check_translation, parse_response};

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_parse_and_check_withFencedMarkedAnswer_shouldOrderBySourceIndex() {
    let source = lines(&["Hello", "World", "Again"]);
    let content = "<!--start-output-->\n```json\n{\"3\": \"Encore\", \"1\": \"Bonjour\", \"2\": \"Monde\"}\n```\n<!--end-output-->";

    let parsed = parse_response(content, true).unwrap();
    let report = check_translation(&source, parsed, true).unwrap();

    assert_eq!(report.lines, lines(&["Bonjour", "Monde", "Encore"]));
    assert!(report.backfilled.is_empty());
}

#[test]
fn test_parse_and_check_withSingleQuotedKeys_shouldRepair() {
    let source = lines(&["Hello"]);

    let parsed = parse_response("{'1': 'Bonjour'}", true).unwrap();
    let report = check_translation(&source, parsed, true).unwrap();

    assert_eq!(report.lines, lines(&["Bonjour"]));
}

#[test]
fn test_parse_response_withPlainText_shouldNumberNonEmptyLines() {
    let parsed = parse_response("Bonjour\n\nMonde\n", false).unwrap();

    assert_eq!(
        parsed,
        vec![
            ("1".to_string(), "Bonjour".to_string()),
            ("2".to_string(), "Monde".to_string())
        ]
    );
}

#[test]
fn test_check_translation_withMergedRepeatedLines_shouldFailRepeatCheck() {
    let source = lines(&["Yes.", "Yes.", "No."]);
    let parsed = parse_response(r#"{"1": "Oui.", "2": "Oui, oui.", "3": "Non."}"#, true).unwrap();

    let strict = check_translation(&source, parsed.clone(), true);
    let lenient = check_translation(&source, parsed, false);

    assert!(matches!(strict, Err(TranslationError::Validation(_))));
    assert!(lenient.is_ok());
}

#[test]
fn test_check_translation_withExtraLines_shouldFail() {
    let source = lines(&["Hello"]);
    let parsed = parse_response("Bonjour\nle monde", false).unwrap();

    assert!(matches!(
        check_translation(&source, parsed, true),
        Err(TranslationError::Validation(_))
    ));
}

#[test]
fn test_parse_response_withJsonArray_shouldFail() {
    assert!(matches!(
        parse_response(r#"["Bonjour"]"#, true),
        Err(TranslationError::Validation(_))
    ));
}
