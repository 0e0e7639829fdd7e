//! Output: report renderers (terminal, JSON) and generated-file writers.

pub mod files;
pub mod json;
pub mod terminal;

use crate::models::{GenerationResult, PullRequestOutcome, QualityReport};

/// Trait for rendering results to an output format.
pub trait OutputRenderer {
    /// Render a quality report to a string.
    fn render(&self, report: &QualityReport) -> String;

    /// Render generated documentation or commented files.
    fn render_generation(&self, result: &GenerationResult) -> String;

    /// Render the result of a publish attempt.
    fn render_pull_request(&self, outcome: &PullRequestOutcome) -> String;
}
