//! Gemini `generateContent` client.
//!
//! POSTs `{"contents":[{"parts":[{"text": prompt}]}]}` to the configured
//! endpoint with the API key as the `key` query parameter and reads
//! `candidates[0].content.parts[0].text` from the answer.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CompletionProvider, ProviderError};
use crate::config::LlmConfig;

/// Completion provider backed by the Gemini REST API.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl GeminiProvider {
    /// Build a provider from the `[llm]` config section.
    pub fn new(config: &LlmConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "no API key; set {} or llm.api_key",
                    crate::constants::ENV_LLM_API_KEY
                ))
            })?;

        let client = reqwest::Client::builder()
            .user_agent(crate::constants::USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: api_key.to_string(),
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// `candidates[0].content.parts[0].text`, naming the first missing step.
    fn into_text(self) -> Result<String, ProviderError> {
        let missing = |what: &str| ProviderError::MalformedResponse(format!("missing {what}"));

        let candidate = self
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or_else(|| missing("candidates[0]"))?;
        let part = candidate
            .content
            .ok_or_else(|| missing("candidates[0].content"))?
            .parts
            .and_then(|p| p.into_iter().next())
            .ok_or_else(|| missing("candidates[0].content.parts[0]"))?;
        part.text
            .ok_or_else(|| missing("candidates[0].content.parts[0].text"))
    }
}

/// Extract the completion text from a raw response body.
pub fn parse_response_body(body: &str) -> Result<String, ProviderError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("invalid JSON: {e}")))?;
    response.into_text()
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, ProviderError> {
        let payload = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };

        tracing::debug!(prompt_len = prompt.len(), ?timeout, "sending completion request");

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .timeout(timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());

        if status != reqwest::StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "completion request rejected");
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let text = parse_response_body(&body)?;
        tracing::debug!(response_len = text.len(), "completion received");
        Ok(text)
    }
}
