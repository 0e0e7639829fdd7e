//! Snapshot tests for output renderers.
//!
//! Each test renders a standard report through a renderer and compares
//! the output against expected fixture files.

use tekshila::models::quality::{QualityAnalysis, UnstructuredReport};
use tekshila::models::{Issue, PullRequestInfo, PullRequestOutcome, QualityReport, Severity};
use tekshila::output::OutputRenderer;
use tekshila::output::json::JsonRenderer;
use tekshila::output::terminal::TerminalRenderer;
use tekshila::response;

/// Standard report used across snapshot tests.
fn test_report() -> QualityReport {
    QualityReport::Structured(QualityAnalysis {
        issues: vec![
            Issue {
                line: 4,
                message: "Hard-coded credential".into(),
                severity: Severity::Error,
                kind: "security".into(),
            },
            Issue {
                line: 12,
                message: "Loop re-reads the file on every iteration".into(),
                severity: Severity::Warning,
                kind: "performance".into(),
            },
        ],
        suggestions: vec![
            "Load secrets from the environment".into(),
            "Read the file once before the loop".into(),
        ],
        summary: "Two issues; one is serious.".into(),
        metrics: None,
    })
}

fn assert_json_snapshot(output: &str, fixture: &str) {
    let actual: serde_json::Value = serde_json::from_str(output).unwrap();
    let expected_str = std::fs::read_to_string(fixture).unwrap();
    let expected: serde_json::Value = serde_json::from_str(&expected_str).unwrap();
    assert_eq!(
        actual, expected,
        "renderer output does not match {fixture}.\nActual:\n{output}"
    );
}

#[test]
fn snapshot_json_structured_report() {
    let output = JsonRenderer.render(&test_report());
    assert_json_snapshot(&output, "tests/fixtures/expected_quality_report.json");
}

#[test]
fn snapshot_json_fallback_report() {
    let report = QualityReport::Unstructured(UnstructuredReport::from_raw(
        "The code is fine overall, but consider adding tests.",
    ));
    let output = JsonRenderer.render(&report);
    assert_json_snapshot(&output, "tests/fixtures/expected_fallback_report.json");
}

#[test]
fn snapshot_json_pull_request() {
    let outcome = PullRequestOutcome::succeeded(PullRequestInfo {
        pr_number: 12,
        pr_url: "https://github.com/octocat/hello/pull/12".into(),
        branch: "auto-docs-0badc0de".into(),
    });
    let output = JsonRenderer.render_pull_request(&outcome);
    assert_json_snapshot(&output, "tests/fixtures/expected_pull_request.json");
}

#[test]
fn interpreted_report_matches_rendered_snapshot() {
    let raw = format!(
        "Here is my review:\n```json\n{}\n```\nLet me know if you need more.",
        std::fs::read_to_string("tests/fixtures/expected_quality_report.json").unwrap()
    );
    let report = response::extract_structured_or_fallback(&raw);
    assert_eq!(report, test_report());
}

#[test]
fn terminal_renderer_orders_and_counts() {
    colored::control::set_override(false);
    let output = TerminalRenderer::new("app.py").render(&test_report());

    let first = output.find("app.py:4").unwrap();
    let second = output.find("app.py:12").unwrap();
    assert!(first < second);
    assert!(output.contains("[security]"));
    assert!(output.contains("2 issues: 1 error, 1 warning, 0 infos"));
    assert!(output.contains("Two issues; one is serious."));
}

#[test]
fn terminal_min_severity_hides_lower_levels() {
    colored::control::set_override(false);
    let mut report = test_report();
    report.retain_min_severity(Severity::Error);
    let output = TerminalRenderer::new("app.py").render(&report);

    assert!(output.contains("Hard-coded credential"));
    assert!(!output.contains("re-reads the file"));
    assert!(output.contains("1 issues: 1 error, 0 warnings, 0 infos"));
}
