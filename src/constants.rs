//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! endpoints and limits so a rename only requires changing this file.

use std::time::Duration;

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "tekshila";

/// Crate version, embedded at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compilation target triple (set by `build.rs`).
pub const TARGET: &str = env!("TARGET");

/// User agent sent to the GitHub API, which rejects requests without one.
pub const USER_AGENT: &str = concat!("tekshila/", env!("CARGO_PKG_VERSION"));

/// Local config filename (e.g. `.tekshila.toml` in the working directory).
pub const CONFIG_FILENAME: &str = ".tekshila.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "tekshila";

/// Default Gemini `generateContent` endpoint.
pub const DEFAULT_LLM_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Default GitHub REST API base URL.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

// ── Limits and timeouts ─────────────────────────────────────────────

/// Files inside an uploaded archive larger than this are skipped.
pub const MAX_ARCHIVE_ENTRY_BYTES: u64 = 1024 * 1024;

/// Direct uploads larger than this are rejected outright.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Timeout for README / comment generation calls.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for quality analysis calls.
pub const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-request timeout for repository host calls.
pub const REPOSITORY_TIMEOUT: Duration = Duration::from_secs(30);

/// Prefix of the disposable branch a pull request is opened from.
pub const WORKING_BRANCH_PREFIX: &str = "auto-docs-";

/// File name used for generated READMEs.
pub const README_FILENAME: &str = "README.md";

// ── Pull request defaults ───────────────────────────────────────────

pub const DEFAULT_PR_BODY: &str = "This PR adds AI-generated documentation to the project.";

/// Default PR title / commit message, optionally naming the project.
pub fn default_pr_title(project_name: Option<&str>) -> String {
    match project_name {
        Some(name) if !name.trim().is_empty() => format!("Add documentation for {}", name.trim()),
        _ => "Add documentation".to_string(),
    }
}

// ── Environment variable names ──────────────────────────────────────

pub const ENV_LLM_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_LLM_API_URL: &str = "GEMINI_API_URL";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_GITHUB_API_URL: &str = "TEKSHILA_GITHUB_API_URL";
pub const ENV_MAX_CONCURRENT: &str = "TEKSHILA_MAX_CONCURRENT";
pub const ENV_LOG: &str = "TEKSHILA_LOG";
