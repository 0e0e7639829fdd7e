//! Where configuration overrides are read from.
//!
//! The binary reads the process environment. Config tests pass a fixed
//! table instead, so they never race on `std::env::set_var`.

use std::collections::HashMap;

/// Source of `GEMINI_*`, `GITHUB_TOKEN` and `TEKSHILA_*` overrides.
#[derive(Clone, Debug, Default)]
pub enum Env {
    #[default]
    Process,
    Fixed(HashMap<String, String>),
}

impl Env {
    pub fn real() -> Self {
        Env::Process
    }

    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Env::Fixed(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// The value of `name`, unless it is unset, blank or not unicode.
    pub fn non_empty(&self, name: &str) -> Option<String> {
        let value = match self {
            Env::Process => std::env::var(name).ok(),
            Env::Fixed(vars) => vars.get(name).cloned(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_env_sees_cargo_variables() {
        assert!(Env::real().non_empty("CARGO_PKG_NAME").is_some());
    }

    #[test]
    fn fixed_table_answers_only_its_keys() {
        let env = Env::from_vars([("GEMINI_API_KEY", "k-123"), ("GITHUB_TOKEN", "\t ")]);
        assert_eq!(env.non_empty("GEMINI_API_KEY").as_deref(), Some("k-123"));
        assert_eq!(env.non_empty("GITHUB_TOKEN"), None);
        assert_eq!(env.non_empty("PATH"), None);
    }
}
