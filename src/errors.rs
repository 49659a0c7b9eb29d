/*!
 * Error types for the bookwai application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a chat-completion endpoint
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting (HTTP 429)
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid or missing credential (HTTP 401)
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Client is blocked by the endpoint (HTTP 403)
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Endpoint-side failure (HTTP 5xx)
    #[error("Server error: {status_code} - {message}")]
    ServerError {
        /// HTTP status code
        status_code: u16,
        /// Body returned with the failure
        message: String,
    },
}

impl ProviderError {
    /// Classify a non-success HTTP status into the matching error variant
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            429 => Self::RateLimitExceeded(message),
            401 => Self::AuthenticationError(message),
            403 => Self::Forbidden(message),
            500..=599 => Self::ServerError { status_code, message },
            _ => Self::ApiError { status_code, message },
        }
    }
}

/// Errors raised while rendering prompt templates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PromptError {
    /// The template references a placeholder that is not recognized
    #[error("Unknown placeholder '{{{name}}}' in {template} template")]
    UnknownPlaceholder { template: String, name: String },

    /// The template lacks a placeholder it must contain
    #[error("Missing required placeholder '{{{name}}}' in {template} template")]
    MissingPlaceholder { template: String, name: String },
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// A single paragraph is larger than any batch may be
    #[error("Paragraph of {tokens} tokens exceeds the batch budget of {budget} tokens")]
    ParagraphTooLong { tokens: usize, budget: usize },

    /// The prompt alone consumes the usable part of the context window
    #[error("Prompt needs {reserved} tokens, leaving no room within the {limit} token limit")]
    BudgetExhausted { limit: usize, reserved: usize },

    /// Translated structure does not match the source batch
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The credential was rejected
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    /// The client is blocked by the endpoint
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Error from prompt rendering
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Errors that can occur while reading or writing a book
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file format is not handled
    #[error("Unsupported document: {0}")]
    Unsupported(String),

    /// The document structure is not what was expected
    #[error("Malformed document: {0}")]
    Malformed(String),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive failure
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Markup failure
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}
