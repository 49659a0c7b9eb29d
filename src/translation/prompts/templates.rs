/*!
 * Prompt templates for book translation.
 *
 * Templates use `{name}` placeholders. Each template kind accepts a fixed set
 * of names; unknown names and missing required names are rejected when the
 * template is created, so a bad custom prompt fails at startup instead of
 * mid-run.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::errors::PromptError;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder pattern"));

/// What a template renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// System message: `{target_lang}`, `{glossary}`, `{fmt}`
    System,
    /// User message: `{origin_text}`
    User,
}

impl TemplateKind {
    fn name(&self) -> &'static str {
        match self {
            TemplateKind::System => "system",
            TemplateKind::User => "user",
        }
    }

    fn allowed(&self) -> &'static [&'static str] {
        match self {
            TemplateKind::System => &["target_lang", "glossary", "fmt"],
            TemplateKind::User => &["origin_text"],
        }
    }

    fn required(&self) -> &'static [&'static str] {
        match self {
            TemplateKind::System => &[],
            TemplateKind::User => &["origin_text"],
        }
    }
}

/// A validated prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    kind: TemplateKind,
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// Structured translator prompt used for non-streamed requests
    pub const STRUCTURED_TRANSLATOR: &'static str = "You need to translate the text provided in JSON format to {target_lang}. The JSON text consists of multiple key-value pairs, where each key is a paragraph number and each value is the content of that paragraph in the original text. \n\
{fmt} \n\
Use your language skills and your understanding of the context so that the translation keeps the information and structure of the original text. The translation should read naturally in {target_lang}, take important cultural and linguistic nuances into account, and keep the typography as far as possible. \n\
Keep Roman numerals, Arabic numerals and special characters of the original text unchanged so that style and typography stay consistent. \n\
If the original text is incomplete, keep that incompleteness in the translation so that meaning and style stay accurate. \n\
For specific sentences, titles, personal names and place names, prefer the translations from the glossary below. If a term is not in the glossary, use an established translation that fits the person or place and the context; only if neither works, transliterate it. Unless the text is a dialogue or its style demands otherwise, use written language. \n\
{glossary} \n\
Your goal is an accurate, creative translation that is clear and easy to read and fits the spirit and flavor of the original. \n\
When the translation is complete, check it for readability and accuracy. Return the translated text in the same JSON structure as received, keeping every key-value pair of the original. Pay particular attention to escaping and to the completeness of symbols.\n\
Do not worry about the translation being interrupted, and output as much of the translation as possible. \n";

    /// Persona prompt used for streamed requests
    pub const STREAMING_TRANSLATOR: &'static str = "## Role: Translation Specialist\n\
\n\
## Profile:\n\
- language: {target_lang}\n\
- description: A meticulous literary translator who translates anything the user sends into {target_lang}.\n\
\n\
## Skills:\n\
- Fluent in {target_lang} and many other languages, familiar with their cultures and allusions, and attentive to their nuances.\n\
- Experienced with a wide range of genres, good at understanding the meaning of a text and following its plot.\n\
- Uses glossaries to keep translations consistent and complete.\n\
- Sensitive to how characters refer to themselves and to their emotions, and good at telling speakers apart in complex dialogue.\n\
\n\
## Goals:\n\
- Translate everything the user sends into {target_lang}.\n\
- Make the translation read naturally while keeping the spirit and flavor of the original.\n\
- Deliver an accurate and creative translation.\n\
\n\
## Constraints:\n\
- Do not add explanations or any content that is not in the original text.\n\
- Do not change typography or convert punctuation unless necessary.\n\
- Prefer the translations in the glossary; otherwise use an established translation, and only then transliterate.\n\
- Neither repeat what has already been translated nor omit anything, including notes and text in brackets.\n\
- Keep Arabic numerals, Roman numerals and untranslatable special characters unchanged.\n\
\n\
{glossary} \n\
\n\
{fmt}\
## Reminder:\n\
Before answering, remind yourself of your role, goals and constraints.\n\
\n\
## Initialization:\n\
Output the {target_lang} translation directly, with the same structure and format as received.";

    /// Default user message wrapping the batch in input markers
    pub const USER_MESSAGE: &'static str = "<!--start-input-->\n{origin_text}\n<!--end-input-->";

    /// Create a template, validating its placeholders
    pub fn new(kind: TemplateKind, template: &str) -> Result<Self, PromptError> {
        let allowed = kind.allowed();
        for caps in PLACEHOLDER.captures_iter(template) {
            let name = &caps[1];
            if !allowed.contains(&name) {
                return Err(PromptError::UnknownPlaceholder {
                    template: kind.name().to_string(),
                    name: name.to_string(),
                });
            }
        }

        for name in kind.required() {
            if !template.contains(&format!("{{{}}}", name)) {
                return Err(PromptError::MissingPlaceholder {
                    template: kind.name().to_string(),
                    name: name.to_string(),
                });
            }
        }

        Ok(Self {
            kind,
            template: template.to_string(),
        })
    }

    /// Kind of this template
    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Raw template text
    pub fn text(&self) -> &str {
        &self.template
    }

    /// Whether a placeholder appears in the template
    pub fn uses(&self, name: &str) -> bool {
        self.template.contains(&format!("{{{}}}", name))
    }

    /// Markdown-styled templates get markdown section headers
    pub fn is_markdown(&self) -> bool {
        self.template.contains("## ")
    }

    /// Substitute placeholders in a single pass
    ///
    /// Values are inserted verbatim and never scanned for placeholders
    /// themselves. Names without a value render as an empty string.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        PLACEHOLDER
            .replace_all(&self.template, |caps: &Captures| {
                let name = &caps[1];
                values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| value.to_string())
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_withDefaultTemplates_shouldValidate() {
        assert!(PromptTemplate::new(TemplateKind::System, PromptTemplate::STRUCTURED_TRANSLATOR).is_ok());
        assert!(PromptTemplate::new(TemplateKind::System, PromptTemplate::STREAMING_TRANSLATOR).is_ok());
        assert!(PromptTemplate::new(TemplateKind::User, PromptTemplate::USER_MESSAGE).is_ok());
    }

    #[test]
    fn test_new_withUnknownPlaceholder_shouldFail() {
        let result = PromptTemplate::new(TemplateKind::System, "Translate to {language}");
        assert_eq!(
            result.unwrap_err(),
            PromptError::UnknownPlaceholder {
                template: "system".to_string(),
                name: "language".to_string()
            }
        );
    }

    #[test]
    fn test_new_withUserTemplateWithoutText_shouldFail() {
        let result = PromptTemplate::new(TemplateKind::User, "Translate this please");
        assert!(matches!(result, Err(PromptError::MissingPlaceholder { .. })));
    }

    #[test]
    fn test_new_withJsonLiteral_shouldIgnoreBraces() {
        let template = "Answer like {\"1\": \"text\"} in {target_lang}";
        assert!(PromptTemplate::new(TemplateKind::System, template).is_ok());
    }

    #[test]
    fn test_render_withValueContainingPlaceholder_shouldNotRecurse() {
        let template = PromptTemplate::new(TemplateKind::System, "{glossary}|{fmt}").unwrap();
        let rendered = template.render(&[("glossary", "{fmt}"), ("fmt", "F")]);
        assert_eq!(rendered, "{fmt}|F");
    }

    #[test]
    fn test_is_markdown_shouldDistinguishDefaults() {
        let stream = PromptTemplate::new(TemplateKind::System, PromptTemplate::STREAMING_TRANSLATOR).unwrap();
        let structured = PromptTemplate::new(TemplateKind::System, PromptTemplate::STRUCTURED_TRANSLATOR).unwrap();
        assert!(stream.is_markdown());
        assert!(!structured.is_markdown());
    }
}
