//! Terminal renderer: styled flowing text, issues ordered by line.

use colored::Colorize;

use crate::models::quality::IssueCounts;
use crate::models::{GenerationResult, Issue, PullRequestOutcome, QualityReport, Severity};
use crate::output::OutputRenderer;

/// Terminal output renderer with colored, flowing text.
pub struct TerminalRenderer {
    /// Label shown in the header, usually the analyzed file name.
    pub file: String,
}

impl TerminalRenderer {
    pub fn new(file: impl Into<String>) -> Self {
        Self { file: file.into() }
    }
}

fn severity_label(severity: Severity) -> (String, String) {
    match severity {
        Severity::Error => (
            "✖".red().bold().to_string(),
            "error".red().bold().to_string(),
        ),
        Severity::Warning => (
            "⚠".yellow().bold().to_string(),
            "warning".yellow().bold().to_string(),
        ),
        Severity::Info => (
            "ℹ".blue().bold().to_string(),
            "info".blue().bold().to_string(),
        ),
    }
}

impl TerminalRenderer {
    fn render_issues(&self, issues: &[Issue], output: &mut String) {
        if issues.is_empty() {
            output.push_str(&format!("{}", "  ✔ No issues found.\n".green()));
            return;
        }

        let mut sorted = issues.to_vec();
        sorted.sort_by(|a, b| a.line.cmp(&b.line).then(b.severity.cmp(&a.severity)));

        for issue in &sorted {
            let (icon, severity) = severity_label(issue.severity);
            let location = if issue.line > 0 {
                format!("{}:{}", self.file, issue.line)
            } else {
                self.file.clone()
            };
            let kind = if issue.kind.is_empty() {
                String::new()
            } else {
                format!(" [{}]", issue.kind).dimmed().to_string()
            };
            output.push_str(&format!(" {icon} {severity} in {}{kind}\n", location.bold()));
            output.push_str(&format!("   {}\n\n", issue.message));
        }
    }
}

impl OutputRenderer for TerminalRenderer {
    fn render(&self, report: &QualityReport) -> String {
        let mut output = String::new();

        if let QualityReport::Failed(failure) = report {
            output.push_str(&format!(" {} {}\n", "✖".red().bold(), failure.error.red().bold()));
            if let Some(ref message) = failure.message {
                output.push_str(&format!("   {message}\n"));
            }
            return output;
        }

        self.render_issues(report.issues(), &mut output);

        if !report.suggestions().is_empty() {
            output.push_str(&format!(" {}\n", "Suggestions".bold()));
            for suggestion in report.suggestions() {
                output.push_str(&format!("   {} {suggestion}\n", "→".cyan()));
            }
            output.push('\n');
        }

        if let QualityReport::Unstructured(fallback) = report {
            output.push_str(&format!(" {}\n", "Model response".bold()));
            for line in fallback.raw_response.lines() {
                output.push_str(&format!("   {line}\n"));
            }
            output.push('\n');
        }

        let counts = IssueCounts::from_issues(report.issues());
        output.push_str(&format!("{}\n", "───────────────────────────────────".dimmed()));
        output.push_str(&format!(
            " {} issues: {} {}, {} {}, {} {}\n",
            counts.total.to_string().bold(),
            counts.errors.to_string().red().bold(),
            if counts.errors == 1 { "error" } else { "errors" },
            counts.warnings.to_string().yellow().bold(),
            if counts.warnings == 1 { "warning" } else { "warnings" },
            counts.info.to_string().blue().bold(),
            if counts.info == 1 { "info" } else { "infos" },
        ));
        if let Some(summary) = report.summary().filter(|s| !s.is_empty()) {
            output.push_str(&format!(" {}\n", summary.dimmed()));
        }

        output
    }

    fn render_generation(&self, result: &GenerationResult) -> String {
        let mut output = String::new();
        match result {
            GenerationResult::Readme { content, .. } => {
                output.push_str(content);
                if !content.ends_with('\n') {
                    output.push('\n');
                }
            }
            GenerationResult::Comments { files, failures } => {
                for (path, content) in files {
                    output.push_str(&format!("{}\n", format!("── {path} ──").bold()));
                    output.push_str(content);
                    if !content.ends_with('\n') {
                        output.push('\n');
                    }
                    output.push('\n');
                }
                for failure in failures {
                    output.push_str(&format!(
                        " {} {}: {}\n",
                        "✖".red().bold(),
                        failure.path.bold(),
                        failure.error.red(),
                    ));
                }
            }
        }
        output
    }

    fn render_pull_request(&self, outcome: &PullRequestOutcome) -> String {
        match (&outcome.pull_request, &outcome.error) {
            (Some(pr), _) => format!(
                " {} Opened pull request #{} from {}\n   {}\n",
                "✔".green().bold(),
                pr.pr_number,
                pr.branch.bold(),
                pr.pr_url.cyan(),
            ),
            (None, Some(error)) => format!(" {} {}\n", "✖".red().bold(), error.red()),
            (None, None) => format!(" {} {}\n", "✖".red().bold(), "publish failed".red()),
        }
    }
}
