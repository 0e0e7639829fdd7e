//! Post-processing of raw model output.
//!
//! Comment responses are unwrapped from their first fenced block, README
//! responses pass through untouched, and quality responses are searched
//! for a JSON report. None of these fail: when the expected structure is
//! missing the raw text (or the fallback report) is returned instead.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::models::quality::{QualityAnalysis, UnstructuredReport};
use crate::models::{Purpose, QualityReport};

/// First fenced block with any (or no) info string.
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[^\n`]*\n(.*?)```").expect("valid fence regex"));

/// Fenced blocks explicitly tagged `json`.
static JSON_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("valid json fence regex"));

/// Turn raw model text into the payload for a generation purpose.
pub fn interpret(raw: &str, purpose: Purpose) -> String {
    match purpose {
        Purpose::Readme => raw.to_string(),
        Purpose::Comment => extract_fenced(raw).unwrap_or(raw).to_string(),
    }
}

/// Inner content of the first fenced block, if there is one.
///
/// The line break that precedes the closing fence belongs to the fence,
/// so `"```py\nx\n```"` and `"```py\r\nx\r\n```"` both yield `"x"`.
pub fn extract_fenced(text: &str) -> Option<&str> {
    let inner = FENCE_RE.captures(text)?.get(1)?.as_str();
    Some(
        inner
            .strip_suffix("\r\n")
            .or_else(|| inner.strip_suffix('\n'))
            .unwrap_or(inner),
    )
}

/// Recover a structured quality report from model text, or fall back.
///
/// Looks first at fenced blocks tagged `json`, then at every `{` that is
/// followed somewhere by an `"issues"` key, parsing one JSON value from
/// that point and ignoring whatever prose follows it. The first candidate
/// that yields an object is used. Anything else produces the
/// unstructured fallback carrying the raw text.
pub fn extract_structured_or_fallback(raw: &str) -> QualityReport {
    match find_quality_json(raw) {
        Some(analysis) => QualityReport::Structured(analysis),
        None => {
            tracing::debug!(len = raw.len(), "no parseable quality JSON in response");
            QualityReport::Unstructured(UnstructuredReport::from_raw(raw))
        }
    }
}

fn find_quality_json(text: &str) -> Option<QualityAnalysis> {
    for cap in JSON_FENCE_RE.captures_iter(text) {
        if let Some(analysis) = cap.get(1).and_then(|m| parse_object(m.as_str(), false)) {
            return Some(analysis);
        }
    }

    let last_issues = text.rfind("\"issues\"")?;
    text.match_indices('{')
        .take_while(|(start, _)| *start < last_issues)
        .find_map(|(start, _)| parse_object(&text[start..], true))
}

/// Parse the leading JSON value of `text` as a quality analysis.
///
/// With `require_issues`, the object must carry an `issues` key; this
/// keeps a nested issue object from passing for the whole report.
fn parse_object(text: &str, require_issues: bool) -> Option<QualityAnalysis> {
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<Value>();
    let value = stream.next()?.ok()?;
    let Value::Object(map) = &value else {
        return None;
    };
    if require_issues && !map.contains_key("issues") {
        return None;
    }
    serde_json::from_value(value).ok()
}
