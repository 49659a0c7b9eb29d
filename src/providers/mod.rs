/*!
 * Provider implementations for chat-completion services.
 *
 * This module contains:
 * - The request/response types shared by every provider
 * - OpenAI: OpenAI-compatible API integration (streamed and non-streamed)
 * - Mock: scripted provider used by tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

use crate::errors::ProviderError;

pub mod mock;
pub mod openai;

/// One chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a message with an arbitrary role
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// System message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    /// User message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Chat completion request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The model to use
    pub model: String,

    /// The messages for the conversation
    pub messages: Vec<ChatMessage>,

    /// Nucleus sampling mass
    pub top_p: f32,

    /// Sampling temperature
    pub temperature: f32,

    /// Penalty for tokens already present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,

    /// Penalty proportional to token frequency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,

    /// Request a server-sent event stream
    pub stream: bool,
}

impl ChatRequest {
    /// Create a new request with default sampling settings
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            top_p: 1.0,
            temperature: 0.6,
            presence_penalty: None,
            frequency_penalty: None,
            stream: false,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Replace all messages
    pub fn messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set presence and frequency penalties
    pub fn penalties(mut self, presence: f32, frequency: f32) -> Self {
        self.presence_penalty = Some(presence);
        self.frequency_penalty = Some(frequency);
        self
    }

    /// Enable or disable streaming
    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// Token usage reported by the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TokenUsage {
    /// Number of prompt tokens
    #[serde(default)]
    pub prompt_tokens: u64,

    /// Number of completion tokens
    #[serde(default)]
    pub completion_tokens: u64,
}

/// Collected completion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatCompletion {
    /// Concatenated message content
    pub content: String,

    /// Why generation stopped (`stop`, `length`, ...)
    pub finish_reason: Option<String>,

    /// Server usage block; absent for streamed responses
    pub usage: Option<TokenUsage>,
}

impl ChatCompletion {
    /// Whether the model stopped because it ran out of tokens
    pub fn is_truncated(&self) -> bool {
        self.finish_reason.as_deref() == Some("length")
    }
}

/// Common trait for chat-completion providers
///
/// Implementations map every transport or HTTP failure onto a
/// `ProviderError` variant so that callers can decide how to retry.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a request, giving up after `timeout`
    async fn complete(
        &self,
        request: &ChatRequest,
        timeout: Duration,
    ) -> Result<ChatCompletion, ProviderError>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}
