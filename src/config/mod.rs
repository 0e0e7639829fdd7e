//! Configuration loading and layering.
//!
//! Handles `.tekshila.toml` loading, environment variable resolution,
//! and secret redaction with proper priority ordering.

pub mod loader;

pub use loader::{Config, ConfigError, GenerateConfig, GitHubConfig, LlmConfig};
