//! Code-quality report types.
//!
//! A report comes back in one of three shapes: the structured analysis
//! the model was asked for, a fallback carrying the raw response when it
//! could not be parsed, or an error when the call itself failed. All
//! three serialize to the flat JSON objects the UI layer renders.

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Suggestion recorded when the model's answer could not be structured.
pub const UNPARSED_SUGGESTION: &str = "Unable to parse AI response as JSON";

/// Summary recorded when the model's answer could not be structured.
pub const UNPARSED_SUMMARY: &str =
    "AI analysis completed but results could not be structured properly.";

/// Severity level of an issue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational note.
    #[default]
    Info,
    /// Potential problem that should be addressed.
    Warning,
    /// Problem that must be fixed.
    Error,
}

/// Models answer with labels like "Critical", "Major", "Minor" or
/// "Blocker" instead of info/warning/error. This normalizes them.
impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Severity::normalize(&lenient_text(deserializer)?))
    }
}

impl Severity {
    /// Map a free-form severity label onto the three known levels.
    ///
    /// Unrecognised labels become [`Severity::Warning`]; an empty label
    /// becomes [`Severity::Info`].
    pub fn normalize(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "" | "info" | "note" | "suggestion" | "low" | "minor" | "trivial" | "style" => {
                Severity::Info
            }
            "warning" | "warn" | "medium" | "moderate" | "major" => Severity::Warning,
            "error" | "critical" | "high" | "severe" | "blocker" | "fatal" => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// A single issue reported by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Line the issue refers to; 0 when the model gave none.
    #[serde(default, deserialize_with = "lenient_line")]
    pub line: u32,
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
    /// Free-form category such as `code_smell`, `security` or `performance`.
    #[serde(default, rename = "type", deserialize_with = "lenient_text")]
    pub kind: String,
}

/// Read any JSON value as text: null is empty, scalars are stringified.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(serde_json::Value::deserialize(deserializer)?).unwrap_or_default())
}

fn value_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Object(mut map) => match map.remove("text") {
            Some(serde_json::Value::String(s)) => Some(s),
            _ => Some(serde_json::Value::Object(map).to_string()),
        },
        other => Some(other.to_string()),
    }
}

/// Null means no issues; entries that are not issue objects are dropped.
fn lenient_issues<'de, D>(deserializer: D) -> Result<Vec<Issue>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter(serde_json::Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Suggestions may arrive as strings, `{"text": ..}` objects, a lone
/// string or null.
fn lenient_suggestions<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items.into_iter().filter_map(value_text).collect(),
        serde_json::Value::String(s) => vec![s],
        _ => Vec::new(),
    })
}

/// Metrics are kept only when they form an object.
fn lenient_metrics<'de, D>(
    deserializer: D,
) -> Result<Option<serde_json::Map<String, serde_json::Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    })
}

/// Accept line numbers as integers, floats, numeric strings or null.
fn lenient_line<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let line = match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    };
    Ok(u32::try_from(line).unwrap_or(u32::MAX))
}

/// The structured analysis the model was asked to return.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityAnalysis {
    #[serde(default, deserialize_with = "lenient_issues")]
    pub issues: Vec<Issue>,
    #[serde(default, deserialize_with = "lenient_suggestions")]
    pub suggestions: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub summary: String,
    /// Optional metrics some models add on their own.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_metrics"
    )]
    pub metrics: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Fallback shape when the model answered but not in parseable JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnstructuredReport {
    pub raw_response: String,
    pub issues: Vec<Issue>,
    pub suggestions: Vec<String>,
    pub summary: String,
}

impl UnstructuredReport {
    pub fn from_raw(raw_response: impl Into<String>) -> Self {
        Self {
            raw_response: raw_response.into(),
            issues: Vec::new(),
            suggestions: vec![UNPARSED_SUGGESTION.to_string()],
            summary: UNPARSED_SUMMARY.to_string(),
        }
    }
}

/// Error shape: the analysis could not be performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisFailure {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of a quality analysis. Never an `Err`: failures are a variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QualityReport {
    Structured(QualityAnalysis),
    Unstructured(UnstructuredReport),
    Failed(AnalysisFailure),
}

impl QualityReport {
    pub fn failed(error: impl Into<String>, message: Option<String>) -> Self {
        QualityReport::Failed(AnalysisFailure {
            error: error.into(),
            message,
        })
    }

    /// Issues found; empty for the fallback and error shapes.
    pub fn issues(&self) -> &[Issue] {
        match self {
            QualityReport::Structured(a) => &a.issues,
            QualityReport::Unstructured(u) => &u.issues,
            QualityReport::Failed(_) => &[],
        }
    }

    pub fn suggestions(&self) -> &[String] {
        match self {
            QualityReport::Structured(a) => &a.suggestions,
            QualityReport::Unstructured(u) => &u.suggestions,
            QualityReport::Failed(_) => &[],
        }
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            QualityReport::Structured(a) => Some(&a.summary),
            QualityReport::Unstructured(u) => Some(&u.summary),
            QualityReport::Failed(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, QualityReport::Failed(_))
    }

    /// Drop issues below `min`.
    pub fn retain_min_severity(&mut self, min: Severity) {
        let issues = match self {
            QualityReport::Structured(a) => &mut a.issues,
            QualityReport::Unstructured(u) => &mut u.issues,
            QualityReport::Failed(_) => return,
        };
        issues.retain(|i| i.severity >= min);
    }
}

/// Issue counts per severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl IssueCounts {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut c = IssueCounts::default();
        for issue in issues {
            c.total += 1;
            match issue.severity {
                Severity::Error => c.errors += 1,
                Severity::Warning => c.warnings += 1,
                Severity::Info => c.info += 1,
            }
        }
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn severity_from_str() {
        assert_eq!("info".parse::<Severity>(), Ok(Severity::Info));
        assert_eq!("WARNING".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("Error".parse::<Severity>(), Ok(Severity::Error));
        assert!("major".parse::<Severity>().is_err());
    }

    #[test]
    fn severity_deserializes_free_form_labels() {
        let parse = |s: &str| serde_json::from_str::<Severity>(s).unwrap();
        assert_eq!(parse(r#""Critical""#), Severity::Error);
        assert_eq!(parse(r#""Blocker""#), Severity::Error);
        assert_eq!(parse(r#""Major""#), Severity::Warning);
        assert_eq!(parse(r#""Minor""#), Severity::Info);
        assert_eq!(parse(r#""WARNING""#), Severity::Warning);
        assert_eq!(parse(r#""something-else""#), Severity::Warning);
        assert_eq!(parse("null"), Severity::Info);
    }

    #[test]
    fn issue_tolerates_loose_fields() {
        let issue: Issue = serde_json::from_str(
            r#"{"line": "12", "message": "m", "severity": "Major", "type": "style"}"#,
        )
        .unwrap();
        assert_eq!(issue.line, 12);
        assert_eq!(issue.severity, Severity::Warning);
        assert_eq!(issue.kind, "style");

        let bare: Issue = serde_json::from_str(r#"{"message": "only"}"#).unwrap();
        assert_eq!(bare.line, 0);
        assert_eq!(bare.severity, Severity::Info);
        assert!(bare.kind.is_empty());

        let negative: Issue = serde_json::from_str(r#"{"line": -4}"#).unwrap();
        assert_eq!(negative.line, 0);
    }

    #[test]
    fn unstructured_report_serializes_fixed_notes() {
        let report = QualityReport::Unstructured(UnstructuredReport::from_raw("prose"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["raw_response"], "prose");
        assert_eq!(json["issues"].as_array().unwrap().len(), 0);
        assert_eq!(json["suggestions"][0], UNPARSED_SUGGESTION);
        assert_eq!(json["summary"], UNPARSED_SUMMARY);
    }

    #[test]
    fn failure_omits_missing_message() {
        let report = QualityReport::failed("API key is required for AI-powered analysis", None);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["error"], "API key is required for AI-powered analysis");
        assert!(json.get("message").is_none());
        assert!(report.is_failure());
        assert!(report.issues().is_empty());
    }

    #[test]
    fn retain_min_severity_filters_issues() {
        let issue = |severity| Issue {
            line: 1,
            message: "m".into(),
            severity,
            kind: String::new(),
        };
        let mut report = QualityReport::Structured(QualityAnalysis {
            issues: vec![issue(Severity::Info), issue(Severity::Error), issue(Severity::Warning)],
            ..QualityAnalysis::default()
        });
        report.retain_min_severity(Severity::Warning);
        let kept: Vec<_> = report.issues().iter().map(|i| i.severity).collect();
        assert_eq!(kept, vec![Severity::Error, Severity::Warning]);
    }

    #[test]
    fn counts_from_issues() {
        let issue = |severity| Issue {
            line: 1,
            message: "m".into(),
            severity,
            kind: "bug".into(),
        };
        let counts = IssueCounts::from_issues(&[
            issue(Severity::Error),
            issue(Severity::Warning),
            issue(Severity::Warning),
            issue(Severity::Info),
        ]);
        assert_eq!(counts.total, 4);
        assert_eq!(counts.errors, 1);
        assert_eq!(counts.warnings, 2);
        assert_eq!(counts.info, 1);
    }
}
