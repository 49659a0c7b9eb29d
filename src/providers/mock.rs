/*!
 * Mock provider implementations for testing.
 *
 * This module provides a provider that answers from a script:
 * - `MockProvider::echo(prefix)` - Translates every paragraph by prefixing it
 * - `MockProvider::scripted(replies)` - Plays back a fixed sequence of replies,
 *   then echoes
 *
 * Every request is recorded so tests can inspect the rendered prompts.
 */

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{ChatCompletion, ChatRequest, Provider, TokenUsage};
use crate::errors::ProviderError;

/// One scripted reply
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Answer with this exact content
    Content(String),
    /// Answer with this content and `finish_reason = "length"`
    Truncated(String),
    /// Fail with the error matching an HTTP status
    Status(u16),
    /// Fail with a timeout
    Timeout,
    /// Translate the batch by prefixing every paragraph
    Echo,
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Replies consumed in order
    script: Mutex<VecDeque<MockReply>>,
    /// Prefix used by echo replies
    echo_prefix: String,
    /// Request counter
    request_count: Arc<AtomicUsize>,
    /// Every request received
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    /// Create a mock that plays `replies` and then echoes
    pub fn scripted(replies: Vec<MockReply>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            echo_prefix: "T:".to_string(),
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always echoes with the given prefix
    pub fn echo(prefix: impl Into<String>) -> Self {
        let mut mock = Self::scripted(Vec::new());
        mock.echo_prefix = prefix.into();
        mock
    }

    /// Number of requests received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copy of every request received
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn next_reply(&self) -> MockReply {
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or(MockReply::Echo)
    }

    /// Build an echo answer in the same encoding as the last user message
    fn echo_answer(&self, request: &ChatRequest) -> String {
        let input = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let input = input
            .trim()
            .trim_start_matches("<!--start-input-->")
            .trim_end_matches("<!--end-input-->")
            .trim();

        match serde_json::from_str::<Map<String, Value>>(input) {
            Ok(numbered) => {
                let translated: Map<String, Value> = numbered
                    .into_iter()
                    .map(|(key, value)| {
                        let text = value.as_str().unwrap_or_default();
                        (key, Value::String(format!("{}{}", self.echo_prefix, text)))
                    })
                    .collect();
                Value::Object(translated).to_string()
            }
            Err(_) => input
                .lines()
                .map(|line| format!("{}{}", self.echo_prefix, line))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        request: &ChatRequest,
        _timeout: Duration,
    ) -> Result<ChatCompletion, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let (content, finish_reason) = match self.next_reply() {
            MockReply::Content(content) => (content, "stop"),
            MockReply::Truncated(content) => (content, "length"),
            MockReply::Echo => (self.echo_answer(request), "stop"),
            MockReply::Status(status) => {
                return Err(ProviderError::from_status(status, format!("mock status {}", status)));
            }
            MockReply::Timeout => {
                return Err(ProviderError::Timeout("mock timeout".to_string()));
            }
        };

        let usage = (!request.stream).then(|| TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
        });

        Ok(ChatCompletion {
            content,
            finish_reason: Some(finish_reason.to_string()),
            usage,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
