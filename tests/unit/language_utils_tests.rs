/*!
 * Tests for language utility functions
 */

use bookwai::language_utils::{display_target_language, get_language_name};

#[test]
fn test_get_language_name_withValidCodes_shouldReturnCorrectNames() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("FR").unwrap(), "French");
    assert_eq!(get_language_name("deu").unwrap(), "German");
    assert_eq!(get_language_name("chi").unwrap(), "Chinese");
}

#[test]
fn test_get_language_name_withInvalidCodes_shouldFail() {
    assert!(get_language_name("").is_err());
    assert!(get_language_name("english").is_err());
}

#[test]
fn test_display_target_language_withDescription_shouldKeepText() {
    assert_eq!(display_target_language("es"), "Spanish");
    assert_eq!(
        display_target_language("Traditional Chinese, Taiwan usage"),
        "Traditional Chinese, Taiwan usage"
    );
}
