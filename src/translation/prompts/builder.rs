/*!
 * Message construction for one translation request.
 */

use serde_json::{Map, Value};

use super::templates::{PromptTemplate, TemplateKind};
use crate::errors::PromptError;
use crate::providers::ChatMessage;
use crate::translation::glossary::Glossary;

/// Response schema announced when batches are sent as numbered objects
pub const DICT_SCHEMA: &str = r#"{"type": "object", "patternProperties": {"^[0-9]+$": {"type": "string", "title": "Text content of each line", "description": "The key represents line number, value represents text content of that line"}}, "additionalProperties": false}"#;

/// Renders system, user and context messages for a batch
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system: PromptTemplate,
    user: PromptTemplate,
    target_language: String,
    dict_format: bool,
}

impl PromptBuilder {
    /// Select and validate the templates
    ///
    /// A non-empty custom system prompt wins over the defaults; otherwise the
    /// persona template is used for streamed requests and the structured one
    /// for the rest.
    pub fn new(
        target_language: impl Into<String>,
        stream: bool,
        dict_format: bool,
        custom_system: &str,
        custom_user: &str,
    ) -> Result<Self, PromptError> {
        let system_text = if !custom_system.trim().is_empty() {
            custom_system
        } else if stream {
            PromptTemplate::STREAMING_TRANSLATOR
        } else {
            PromptTemplate::STRUCTURED_TRANSLATOR
        };
        let user_text = if custom_user.trim().is_empty() {
            PromptTemplate::USER_MESSAGE
        } else {
            custom_user
        };

        Ok(Self {
            system: PromptTemplate::new(TemplateKind::System, system_text)?,
            user: PromptTemplate::new(TemplateKind::User, user_text)?,
            target_language: target_language.into(),
            dict_format,
        })
    }

    /// Whether batches are sent as numbered JSON objects
    pub fn dict_format(&self) -> bool {
        self.dict_format
    }

    /// Glossary block for the terms that occur in `batch`
    ///
    /// Empty when nothing matches, so the prompt carries no glossary header.
    pub fn glossary_section(&self, glossary: &Glossary, batch: &[String]) -> String {
        let content = serde_json::to_string(batch).unwrap_or_else(|_| batch.join("\n"));
        let lines = glossary.matching_lines(&content);
        if lines.is_empty() {
            return String::new();
        }

        let header = if self.system.is_markdown() {
            "## Glossary:"
        } else {
            "The glossary includes:"
        };
        let mut section = vec![header.to_string()];
        section.extend(lines);
        section.join("\n")
    }

    /// Render the system prompt around a glossary block
    pub fn system_prompt(&self, glossary_section: &str) -> String {
        let fmt = if self.dict_format && self.system.uses("fmt") {
            if self.system.text().contains("##") {
                format!("## Format: \n{} \n\n", DICT_SCHEMA)
            } else {
                format!("The json schema is: {} \n\n", DICT_SCHEMA)
            }
        } else {
            String::new()
        };

        self.system.render(&[
            ("target_lang", &self.target_language),
            ("glossary", glossary_section),
            ("fmt", &fmt),
        ])
    }

    /// Encode paragraphs the way they are sent to the model
    pub fn encode_batch(&self, batch: &[String]) -> String {
        if self.dict_format {
            let mut numbered = Map::new();
            for (index, paragraph) in batch.iter().enumerate() {
                numbered.insert((index + 1).to_string(), Value::String(paragraph.clone()));
            }
            Value::Object(numbered).to_string()
        } else {
            batch.join("\n")
        }
    }

    /// Render the user message for a batch
    pub fn user_message(&self, batch: &[String]) -> String {
        let origin_text = self.encode_batch(batch);
        self.user.render(&[("origin_text", &origin_text)])
    }

    /// Full message list: system, replayed context pairs, then the batch
    pub fn build_messages(
        &self,
        system_prompt: &str,
        context: &[(Vec<String>, Vec<String>)],
        batch: &[String],
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2 + context.len() * 2);
        messages.push(ChatMessage::system(system_prompt));
        for (original, translated) in context {
            messages.push(ChatMessage::user(self.user_message(original)));
            messages.push(ChatMessage::assistant(self.encode_batch(translated)));
        }
        messages.push(ChatMessage::user(self.user_message(batch)));
        messages
    }
}
