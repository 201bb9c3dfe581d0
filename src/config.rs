use crate::error::{GenerationError, Result};
use crate::providers::{
    CompletionProvider, GeminiConfig, GeminiProvider, OllamaConfig, OllamaProvider, OpenAiConfig,
    OpenAiProvider,
};
use reqwest::Client;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Supported completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Ollama,
    Gemini,
}

impl FromStr for ProviderKind {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "chatgpt" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            other => Err(GenerationError::InvalidConfig(format!(
                "unknown provider '{}' (expected openai, ollama or gemini)",
                other
            ))),
        }
    }
}

/// Provider selection plus overrides, usually read from the environment.
///
/// | Variable | Meaning |
/// |---|---|
/// | `CAPTION_PROVIDER` | `openai` (default), `ollama` or `gemini` |
/// | `CAPTION_API_KEY` | credential; `OPENAI_API_KEY` / `GEMINI_API_KEY` also work |
/// | `CAPTION_MODEL` | model override |
/// | `CAPTION_ENDPOINT` | API base URL override |
/// | `CAPTION_TIMEOUT_SECS` | per-request timeout |
#[derive(Clone, Default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("kind", &self.kind)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderSettings {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let kind = match get("CAPTION_PROVIDER") {
            Some(value) => value.parse()?,
            None => ProviderKind::default(),
        };

        let vendor_key = match kind {
            ProviderKind::OpenAi => get("OPENAI_API_KEY"),
            ProviderKind::Gemini => get("GEMINI_API_KEY"),
            ProviderKind::Ollama => None,
        };

        let timeout = match get("CAPTION_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value.trim().parse().map_err(|_| {
                    GenerationError::InvalidConfig(format!(
                        "CAPTION_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                        value
                    ))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            kind,
            api_key: get("CAPTION_API_KEY").or(vendor_key),
            model: get("CAPTION_MODEL"),
            endpoint: get("CAPTION_ENDPOINT"),
            timeout,
        })
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Construct the configured provider around a shared HTTP client.
    pub fn build(&self, http: Client) -> Arc<dyn CompletionProvider> {
        match self.kind {
            ProviderKind::OpenAi => {
                let mut config = OpenAiConfig::default();
                if let Some(model) = &self.model {
                    config.model = model.clone();
                }
                if let Some(endpoint) = &self.endpoint {
                    config = config.endpoint(endpoint.clone());
                }
                if let Some(timeout) = self.timeout {
                    config = config.timeout(timeout);
                }
                config.api_key = self.api_key.clone();
                Arc::new(OpenAiProvider::new(http, config))
            }
            ProviderKind::Ollama => {
                let mut config = OllamaConfig::default();
                if let Some(model) = &self.model {
                    config.model = model.clone();
                }
                if let Some(endpoint) = &self.endpoint {
                    config = config.endpoint(endpoint.clone());
                }
                if let Some(timeout) = self.timeout {
                    config = config.timeout(timeout);
                }
                Arc::new(OllamaProvider::new(http, config))
            }
            ProviderKind::Gemini => {
                let mut config = GeminiConfig::default();
                if let Some(model) = &self.model {
                    config.model = model.clone();
                }
                if let Some(endpoint) = &self.endpoint {
                    config = config.endpoint(endpoint.clone());
                }
                if let Some(timeout) = self.timeout {
                    config = config.timeout(timeout);
                }
                config.api_key = self.api_key.clone();
                Arc::new(GeminiProvider::new(http, config))
            }
        }
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_openai_without_key() {
        let settings = ProviderSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.kind, ProviderKind::OpenAi);
        assert!(settings.api_key.is_none());
        let provider = settings.build(Client::new());
        assert_eq!(provider.name(), "OpenAI");
        assert!(!provider.has_credential());
    }

    #[test]
    fn vendor_key_is_used_for_matching_provider() {
        let settings =
            ProviderSettings::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-1")])).unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("sk-1"));

        let settings = ProviderSettings::from_lookup(lookup(&[
            ("CAPTION_PROVIDER", "gemini"),
            ("OPENAI_API_KEY", "sk-1"),
        ]))
        .unwrap();
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn caption_key_takes_precedence() {
        let settings = ProviderSettings::from_lookup(lookup(&[
            ("CAPTION_API_KEY", "primary"),
            ("OPENAI_API_KEY", "secondary"),
        ]))
        .unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn reads_overrides() {
        let settings = ProviderSettings::from_lookup(lookup(&[
            ("CAPTION_PROVIDER", " Ollama "),
            ("CAPTION_MODEL", "llama3.2-vision"),
            ("CAPTION_ENDPOINT", "http://gpu:11434/"),
            ("CAPTION_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(settings.kind, ProviderKind::Ollama);
        assert_eq!(settings.timeout, Some(Duration::from_secs(15)));
        let provider = settings.build(Client::new());
        assert_eq!(provider.model(), "llama3.2-vision");
        assert!(!provider.requires_credential());
    }

    #[test]
    fn rejects_unknown_provider() {
        let err = ProviderSettings::from_lookup(lookup(&[("CAPTION_PROVIDER", "bard")]))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn rejects_bad_timeout() {
        let err = ProviderSettings::from_lookup(lookup(&[("CAPTION_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_key() {
        let settings = ProviderSettings::new(ProviderKind::Gemini).api_key("secret-value");
        assert!(!format!("{:?}", settings).contains("secret-value"));
    }
}
