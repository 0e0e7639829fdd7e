//! JSON output renderer.
//!
//! Emits reports in exactly the shape they serialize to: the structured
//! analysis, the raw-response fallback, or the error object.

use crate::models::{GenerationResult, PullRequestOutcome, QualityReport};
use crate::output::OutputRenderer;

/// JSON output renderer.
pub struct JsonRenderer;

impl OutputRenderer for JsonRenderer {
    fn render(&self, report: &QualityReport) -> String {
        to_pretty(report)
    }

    fn render_generation(&self, result: &GenerationResult) -> String {
        to_pretty(result)
    }

    fn render_pull_request(&self, outcome: &PullRequestOutcome) -> String {
        to_pretty(outcome)
    }
}

fn to_pretty<T: serde::Serialize>(value: &T) -> String {
    let mut out = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    out.push('\n');
    out
}
