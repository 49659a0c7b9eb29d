use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use log::{debug, error};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

use super::{ChatCompletion, ChatRequest, Provider, TokenUsage};
use crate::errors::ProviderError;

/// Sentinel payload that ends an event stream
const STREAM_DONE: &str = "[DONE]";

/// OpenAI-compatible chat completion client
#[derive(Debug, Clone)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key sent as a bearer token
    api_key: String,
    /// Full chat completion URL
    endpoint: String,
}

impl OpenAI {
    /// Create a new client for the given chat completion URL
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::builder().build().unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn collect_stream(&self, response: Response) -> Result<ChatCompletion, ProviderError> {
        let mut decoder = SseDecoder::default();
        let mut collector = StreamCollector::default();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_transport_error)?;
            for data in decoder.feed(&chunk) {
                if collector.push(&data)? {
                    return Ok(collector.finish());
                }
            }
        }

        // Servers that close without the sentinel still produced usable text
        for data in decoder.flush() {
            if collector.push(&data)? {
                break;
            }
        }
        Ok(collector.finish())
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn complete(
        &self,
        request: &ChatRequest,
        timeout: Duration,
    ) -> Result<ChatCompletion, ProviderError> {
        let builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(request);

        // Streamed bodies may take longer than `timeout`; only the wait for
        // the response headers is bounded.
        let response = if request.stream {
            tokio::time::timeout(timeout, builder.send())
                .await
                .map_err(|_| {
                    ProviderError::Timeout(format!("No response headers within {:?}", timeout))
                })?
                .map_err(map_transport_error)?
        } else {
            builder
                .timeout(timeout)
                .send()
                .await
                .map_err(map_transport_error)?
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        if request.stream {
            self.collect_stream(response).await
        } else {
            let body = response.text().await.map_err(map_transport_error)?;
            parse_completion(&body)
        }
    }

    fn name(&self) -> &str {
        "openai"
    }
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else if e.is_connect() {
        ProviderError::ConnectionError(e.to_string())
    } else {
        ProviderError::RequestFailed(e.to_string())
    }
}

/// Parse a non-streamed completion body
pub fn parse_completion(body: &str) -> Result<ChatCompletion, ProviderError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::ParseError(format!("{}: {}", e, truncate(body))))?;

    if let Some(error) = value.get("error") {
        return Err(ProviderError::ApiError {
            status_code: 200,
            message: error.to_string(),
        });
    }

    let choice = value
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| ProviderError::ParseError(format!("No choices in response: {}", truncate(body))))?;

    // Some compatible servers return the content as an already-parsed object
    let content = match choice.get("message").and_then(|m| m.get("content")) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    let usage = value
        .get("usage")
        .and_then(|u| serde_json::from_value::<TokenUsage>(u.clone()).ok());

    Ok(ChatCompletion {
        content,
        finish_reason: choice
            .get("finish_reason")
            .and_then(Value::as_str)
            .map(str::to_string),
        usage,
    })
}

fn truncate(text: &str) -> String {
    text.chars().take(200).collect()
}

/// Splits a server-sent event byte stream into `data:` payloads
///
/// Lines may be split across network chunks, including inside a multi-byte
/// character, so bytes are buffered until a full line is available.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Consume a chunk and return the complete data payloads it finished
    pub fn feed(&mut self, chunk: &Bytes) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(data) = Self::data_of(&line) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Return a trailing payload that was not newline-terminated
    pub fn flush(&mut self) -> Vec<String> {
        let line = std::mem::take(&mut self.buffer);
        Self::data_of(&line).into_iter().collect()
    }

    fn data_of(line: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches(['\r', '\n']);
        line.strip_prefix("data:")
            .map(|data| data.trim_start().to_string())
    }
}

/// Accumulates streamed content deltas
#[derive(Debug, Default)]
pub struct StreamCollector {
    content: String,
    finish_reason: Option<String>,
}

impl StreamCollector {
    /// Add one `data:` payload; returns true once the stream is complete
    pub fn push(&mut self, data: &str) -> Result<bool, ProviderError> {
        if data == STREAM_DONE {
            return Ok(true);
        }
        if data.is_empty() {
            return Ok(false);
        }

        let value: Value = serde_json::from_str(data)
            .map_err(|e| ProviderError::ParseError(format!("Invalid stream event: {}: {}", e, truncate(data))))?;

        if let Some(error) = value.get("error") {
            return Err(ProviderError::ApiError {
                status_code: 200,
                message: error.to_string(),
            });
        }

        if let Some(choice) = value.get("choices").and_then(|c| c.get(0)) {
            if let Some(text) = choice
                .get("delta")
                .and_then(|d| d.get("content"))
                .and_then(Value::as_str)
            {
                self.content.push_str(text);
            }
            if let Some(reason) = choice.get("finish_reason").and_then(Value::as_str) {
                debug!("Stream finished with reason: {}", reason);
                self.finish_reason = Some(reason.to_string());
            }
        }

        Ok(false)
    }

    /// Completed response; streams carry no usage block
    pub fn finish(self) -> ChatCompletion {
        ChatCompletion {
            content: self.content,
            finish_reason: self.finish_reason,
            usage: None,
        }
    }
}
