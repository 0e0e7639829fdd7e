//! CompletionProvider trait and LLM integration.
//!
//! Decouples generation and analysis from the concrete text-completion
//! endpoint so they can be driven by a mock in tests.

pub mod gemini;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the completion provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The endpoint answered with a non-success status.
    #[error("LLM API error {status}: {body}")]
    Upstream { status: u16, body: String },

    /// A success response without the expected text field.
    #[error("malformed LLM response: {0}")]
    MalformedResponse(String),

    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// HTTP status of an upstream failure, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A black-box text-completion service.
///
/// One call per prompt; implementations must give up after `timeout`.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send a prompt and return the model's raw text answer.
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, ProviderError>;
}
