//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. Environment variables (including a `.env` file loaded by the binary)
//! 2. `.tekshila.toml` in the working directory
//! 3. `~/.config/tekshila/config.toml` (global defaults)
//! 4. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants;
use crate::env::Env;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub github: GitHubConfig,
    pub generate: GenerateConfig,
}

/// Text-generation endpoint configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub generation_timeout_secs: u64,
    pub analysis_timeout_secs: u64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_url", &self.api_url)
            .field("generation_timeout_secs", &self.generation_timeout_secs)
            .field("analysis_timeout_secs", &self.analysis_timeout_secs)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: constants::DEFAULT_LLM_API_URL.to_string(),
            generation_timeout_secs: constants::GENERATION_TIMEOUT.as_secs(),
            analysis_timeout_secs: constants::ANALYSIS_TIMEOUT.as_secs(),
        }
    }
}

impl LlmConfig {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }
}

/// Repository host configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub api_url: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: constants::DEFAULT_GITHUB_API_URL.to_string(),
            timeout_secs: constants::REPOSITORY_TIMEOUT.as_secs(),
        }
    }
}

impl GitHubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Generation pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Upper bound on concurrent per-file comment requests.
    pub max_concurrent: usize,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self { max_concurrent: 1 }
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads the global config, then the local one, then applies
    /// environment variable overrides.
    pub fn load(work_dir: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global config");
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        if let Some(dir) = work_dir {
            let local_path = dir.join(constants::CONFIG_FILENAME);
            if local_path.exists() {
                debug!(path = %local_path.display(), "loading local config");
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        config.apply_env_vars(env);

        Ok(config)
    }

    /// Load a config from a specific file.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the global config file path.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence for non-default values).
    fn merge(&mut self, other: Config) {
        let default_llm = LlmConfig::default();
        if other.llm.api_key.is_some() {
            self.llm.api_key = other.llm.api_key;
        }
        if other.llm.api_url != default_llm.api_url {
            self.llm.api_url = other.llm.api_url;
        }
        if other.llm.generation_timeout_secs != default_llm.generation_timeout_secs {
            self.llm.generation_timeout_secs = other.llm.generation_timeout_secs;
        }
        if other.llm.analysis_timeout_secs != default_llm.analysis_timeout_secs {
            self.llm.analysis_timeout_secs = other.llm.analysis_timeout_secs;
        }

        let default_github = GitHubConfig::default();
        if other.github.token.is_some() {
            self.github.token = other.github.token;
        }
        if other.github.api_url != default_github.api_url {
            self.github.api_url = other.github.api_url;
        }
        if other.github.timeout_secs != default_github.timeout_secs {
            self.github.timeout_secs = other.github.timeout_secs;
        }

        if other.generate.max_concurrent != GenerateConfig::default().max_concurrent {
            self.generate.max_concurrent = other.generate.max_concurrent;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Some(val) = env.non_empty(constants::ENV_LLM_API_KEY) {
            self.llm.api_key = Some(val);
        }
        if let Some(val) = env.non_empty(constants::ENV_LLM_API_URL) {
            self.llm.api_url = val;
        }
        if let Some(val) = env.non_empty(constants::ENV_GITHUB_TOKEN) {
            self.github.token = Some(val);
        }
        if let Some(val) = env.non_empty(constants::ENV_GITHUB_API_URL) {
            self.github.api_url = val;
        }
        if let Some(val) = env.non_empty(constants::ENV_MAX_CONCURRENT) {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => self.generate.max_concurrent = n,
                _ => warn!(
                    var = constants::ENV_MAX_CONCURRENT,
                    value = %val,
                    "ignoring invalid concurrency value"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_env() -> Env {
        Env::from_vars(Vec::<(&str, &str)>::new())
    }

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.llm.api_url, constants::DEFAULT_LLM_API_URL);
        assert_eq!(config.llm.generation_timeout(), Duration::from_secs(60));
        assert_eq!(config.llm.analysis_timeout(), Duration::from_secs(30));
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.timeout(), Duration::from_secs(30));
        assert_eq!(config.generate.max_concurrent, 1);
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[llm]
api_url = "https://llm.example/v1:generate"
generation_timeout_secs = 90

[github]
api_url = "https://ghe.example/api/v3"

[generate]
max_concurrent = 4
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.api_url, "https://llm.example/v1:generate");
        assert_eq!(config.llm.generation_timeout_secs, 90);
        assert_eq!(config.llm.analysis_timeout_secs, 30);
        assert_eq!(config.github.api_url, "https://ghe.example/api/v3");
        assert_eq!(config.generate.max_concurrent, 4);
    }

    #[test]
    fn merge_overrides_non_default_values() {
        let mut base = Config::default();
        let mut other = Config::default();
        other.llm.api_key = Some("llm-key".to_string());
        other.llm.analysis_timeout_secs = 10;
        other.github.token = Some("ghp_test".to_string());
        other.github.timeout_secs = 5;
        other.generate.max_concurrent = 3;

        base.merge(other);

        assert_eq!(base.llm.api_key.as_deref(), Some("llm-key"));
        assert_eq!(base.llm.analysis_timeout_secs, 10);
        assert_eq!(base.github.token.as_deref(), Some("ghp_test"));
        assert_eq!(base.github.timeout_secs, 5);
        assert_eq!(base.generate.max_concurrent, 3);
    }

    #[test]
    fn merge_keeps_base_when_other_is_default() {
        let mut base = Config::default();
        base.llm.api_url = "https://custom".to_string();
        base.generate.max_concurrent = 2;

        base.merge(Config::default());

        assert_eq!(base.llm.api_url, "https://custom");
        assert_eq!(base.generate.max_concurrent, 2);
    }

    #[test]
    fn load_file_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not valid {{ toml").unwrap();

        let result = Config::load_file(&path);
        assert!(result.unwrap_err().to_string().contains("parse"));
    }

    #[test]
    fn load_file_not_found() {
        let result = Config::load_file(Path::new("/tmp/tekshila_not_exist_config.toml"));
        assert!(result.unwrap_err().to_string().contains("read"));
    }

    #[test]
    fn load_from_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".tekshila.toml"),
            "[generate]\nmax_concurrent = 6\n",
        )
        .unwrap();

        let config = Config::load(Some(dir.path()), &empty_env()).unwrap();
        assert_eq!(config.generate.max_concurrent, 6);
    }

    #[test]
    fn apply_env_vars_credentials_and_urls() {
        let env = Env::from_vars([
            ("GEMINI_API_KEY", "llm-env-key"),
            ("GEMINI_API_URL", "https://env.llm/generate"),
            ("GITHUB_TOKEN", "ghp_env"),
            ("TEKSHILA_GITHUB_API_URL", "http://127.0.0.1:9999"),
        ]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert_eq!(config.llm.api_key.as_deref(), Some("llm-env-key"));
        assert_eq!(config.llm.api_url, "https://env.llm/generate");
        assert_eq!(config.github.token.as_deref(), Some("ghp_env"));
        assert_eq!(config.github.api_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn apply_env_vars_invalid_concurrency_is_ignored() {
        let env = Env::from_vars([("TEKSHILA_MAX_CONCURRENT", "zero")]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert_eq!(config.generate.max_concurrent, 1);

        let env = Env::from_vars([("TEKSHILA_MAX_CONCURRENT", "0")]);
        config.apply_env_vars(&env);
        assert_eq!(config.generate.max_concurrent, 1);
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = Config::default();
        config.llm.api_key = Some("super-secret".to_string());
        config.github.token = Some("ghp_secret".to_string());
        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret"));
        assert!(!printed.contains("ghp_secret"));
        assert!(printed.contains("[REDACTED]"));
    }
}
