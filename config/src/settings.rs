//! LLM endpoint settings resolved from the process environment.
//!
//! Call after [`crate::load_and_apply`] so `.env` and XDG values are visible.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// `openai` or `ollama`.
pub const ENV_BACKEND: &str = "SWITCHYARD_BACKEND";
/// Model name, e.g. `llama3`.
pub const ENV_MODEL: &str = "MODEL";
/// Endpoint base URL for either backend.
pub const ENV_BASE_URL: &str = "SWITCHYARD_BASE_URL";
pub const ENV_TEMPERATURE: &str = "SWITCHYARD_TEMPERATURE";
pub const ENV_RECURSION_LIMIT: &str = "SWITCHYARD_RECURSION_LIMIT";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

pub const DEFAULT_MODEL: &str = "llama3";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("unknown backend: {0} (use openai or ollama)")]
    UnknownBackend(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Which wire protocol the client speaks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// OpenAI-compatible `/chat/completions` (OpenAI, Ollama `/v1`, LM Studio, Groq).
    OpenAi,
    /// Ollama native `/api/chat`.
    #[default]
    Ollama,
}

impl FromStr for Backend {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "open-ai" | "openai-compatible" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(SettingsError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => f.write_str("openai"),
            Self::Ollama => f.write_str("ollama"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LlmSettings {
    pub backend: Backend,
    pub model: String,
    /// Explicit endpoint for whichever backend is chosen (`SWITCHYARD_BASE_URL` or `--base-url`).
    pub base_url: Option<String>,
    /// `OLLAMA_HOST`; used when the final backend is Ollama and `base_url` is unset.
    pub ollama_host: Option<String>,
    /// `OPENAI_BASE_URL` / `OPENAI_API_BASE`; used when the final backend is OpenAI and
    /// `base_url` is unset.
    pub openai_base_url: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub recursion_limit: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            ollama_host: None,
            openai_base_url: None,
            api_key: None,
            temperature: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl LlmSettings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; empty values count as unset.
    ///
    /// Backend-specific URLs are kept as read; [`resolved_base_url`](Self::resolved_base_url)
    /// picks one once the backend is final.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get(ENV_BACKEND) {
            Some(v) => v.parse()?,
            None => Backend::default(),
        };
        let temperature = get(ENV_TEMPERATURE)
            .map(|v| {
                v.trim()
                    .parse::<f32>()
                    .map_err(|_| SettingsError::InvalidValue {
                        key: ENV_TEMPERATURE,
                        value: v.clone(),
                    })
            })
            .transpose()?;
        let recursion_limit = match get(ENV_RECURSION_LIMIT) {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(SettingsError::InvalidValue {
                    key: ENV_RECURSION_LIMIT,
                    value: v,
                })?,
            None => DEFAULT_RECURSION_LIMIT,
        };

        Ok(Self {
            backend,
            model: get(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: get(ENV_BASE_URL),
            ollama_host: get("OLLAMA_HOST"),
            openai_base_url: get("OPENAI_BASE_URL").or_else(|| get("OPENAI_API_BASE")),
            api_key: get(ENV_API_KEY),
            temperature,
            recursion_limit,
        })
    }

    /// Endpoint for the current backend, without a trailing `/`.
    ///
    /// Order: `base_url`, then the backend's own env URL, then the backend default.
    pub fn resolved_base_url(&self) -> String {
        let (env_url, default) = match self.backend {
            Backend::Ollama => (self.ollama_host.as_deref(), DEFAULT_OLLAMA_URL),
            Backend::OpenAi => (self.openai_base_url.as_deref(), DEFAULT_OPENAI_URL),
        };
        let url = self.base_url.as_deref().or(env_url).unwrap_or(default);
        url.trim_end_matches('/').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let s = LlmSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s, LlmSettings::default());
        assert_eq!(s.resolved_base_url(), DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn openai_backend_uses_openai_base_url_fallback() {
        let s = LlmSettings::from_lookup(lookup(&[
            (ENV_BACKEND, "OpenAI"),
            ("OPENAI_BASE_URL", "http://localhost:11434/v1/"),
            ("OLLAMA_HOST", "http://ignored:1"),
            (ENV_API_KEY, "ollama"),
        ]))
        .unwrap();
        assert_eq!(s.backend, Backend::OpenAi);
        assert_eq!(s.resolved_base_url(), "http://localhost:11434/v1");
        assert_eq!(s.api_key.as_deref(), Some("ollama"));
    }

    #[test]
    fn backend_switched_after_loading_uses_its_own_url() {
        let mut s = LlmSettings::from_lookup(lookup(&[
            ("OLLAMA_HOST", "http://gpu-box:11434"),
            ("OPENAI_BASE_URL", "http://lm-studio:1234/v1"),
        ]))
        .unwrap();
        assert_eq!(s.resolved_base_url(), "http://gpu-box:11434");
        s.backend = Backend::OpenAi;
        assert_eq!(s.resolved_base_url(), "http://lm-studio:1234/v1");
    }

    #[test]
    fn ollama_host_never_leaks_into_openai_default() {
        let mut s = LlmSettings::from_lookup(lookup(&[("OLLAMA_HOST", "http://gpu-box:11434")])).unwrap();
        s.backend = Backend::OpenAi;
        assert_eq!(s.resolved_base_url(), DEFAULT_OPENAI_URL);
    }

    #[test]
    fn explicit_base_url_wins_over_fallbacks() {
        let s = LlmSettings::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://gpu-box:11434"),
            ("OLLAMA_HOST", "http://localhost:11434"),
        ]))
        .unwrap();
        assert_eq!(s.resolved_base_url(), "http://gpu-box:11434");
    }

    #[test]
    fn empty_values_count_as_unset() {
        let s = LlmSettings::from_lookup(lookup(&[(ENV_MODEL, "  "), (ENV_BACKEND, "")])).unwrap();
        assert_eq!(s.model, DEFAULT_MODEL);
        assert_eq!(s.backend, Backend::Ollama);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = LlmSettings::from_lookup(lookup(&[(ENV_BACKEND, "bedrock")])).unwrap_err();
        assert_eq!(err, SettingsError::UnknownBackend("bedrock".to_string()));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = LlmSettings::from_lookup(lookup(&[(ENV_TEMPERATURE, "warm")])).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { key, .. } if key == ENV_TEMPERATURE));
        let err = LlmSettings::from_lookup(lookup(&[(ENV_RECURSION_LIMIT, "0")])).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { key, .. } if key == ENV_RECURSION_LIMIT));
    }

    #[test]
    fn temperature_and_limit_parse() {
        let s = LlmSettings::from_lookup(lookup(&[
            (ENV_TEMPERATURE, "0.2"),
            (ENV_RECURSION_LIMIT, "40"),
        ]))
        .unwrap();
        assert_eq!(s.temperature, Some(0.2));
        assert_eq!(s.recursion_limit, 40);
    }
}
