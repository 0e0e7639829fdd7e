//! AI code-quality analysis.
//!
//! [`QualityAnalyzer::analyze`] always returns a [`QualityReport`]:
//! transport failures, non-200 answers and unparseable text all become
//! report variants so the caller can render them like any other result.

use std::sync::Arc;
use std::time::Duration;

use crate::models::QualityReport;
use crate::prompt;
use crate::providers::{CompletionProvider, ProviderError};
use crate::response;

/// Error reported when no API key is configured.
pub const MISSING_KEY_ERROR: &str = "API key is required for AI-powered analysis";

/// Error reported when the call fails for any reason other than a status.
pub const ANALYSIS_FAILED_ERROR: &str = "Failed to analyze with AI";

/// Produces quality reports from a completion provider.
pub struct QualityAnalyzer {
    provider: Option<Arc<dyn CompletionProvider>>,
    timeout: Duration,
}

impl QualityAnalyzer {
    pub fn new(provider: Arc<dyn CompletionProvider>, timeout: Duration) -> Self {
        Self {
            provider: Some(provider),
            timeout,
        }
    }

    /// An analyzer with no credentials; every report is the missing-key error.
    pub fn unconfigured() -> Self {
        Self {
            provider: None,
            timeout: crate::constants::ANALYSIS_TIMEOUT,
        }
    }

    /// Analyze one file's code. Never fails.
    pub async fn analyze(&self, code: &str, filename: &str) -> QualityReport {
        let Some(provider) = &self.provider else {
            return QualityReport::failed(MISSING_KEY_ERROR, None);
        };

        let prompt = prompt::build_quality_prompt(code, filename);
        tracing::debug!(filename, prompt_len = prompt.len(), "analyzing code quality");

        match provider.complete(&prompt, self.timeout).await {
            Ok(raw) => response::extract_structured_or_fallback(&raw),
            Err(e) => failure_report(e),
        }
    }
}

fn failure_report(error: ProviderError) -> QualityReport {
    tracing::warn!(%error, "quality analysis failed");
    match error {
        ProviderError::Upstream { status, body } => {
            QualityReport::failed(format!("API error: {status}"), Some(body))
        }
        ProviderError::NotConfigured(_) => QualityReport::failed(MISSING_KEY_ERROR, None),
        other => QualityReport::failed(ANALYSIS_FAILED_ERROR, Some(other.to_string())),
    }
}
