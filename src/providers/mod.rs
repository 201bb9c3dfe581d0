//! Completion providers: "submit a prompt (+ optional image), get raw text".
//!
//! Each adapter owns its request shape and its response path. Nothing
//! downstream of [`CompletionProvider::complete`] sees provider JSON.

pub mod gemini;
pub mod ollama;
pub mod openai;

pub use gemini::{GeminiConfig, GeminiProvider};
pub use ollama::{OllamaConfig, OllamaProvider};
pub use openai::{OpenAiConfig, OpenAiProvider};

use crate::error::{GenerationError, Result};
use crate::prompt::Prompt;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// A hosted text (and possibly vision) completion service.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Human-readable provider name used in messages.
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Whether image prompts can be sent to the configured model.
    fn supports_vision(&self) -> bool;

    /// Whether a credential must be configured before calling.
    fn requires_credential(&self) -> bool {
        true
    }

    fn has_credential(&self) -> bool;

    /// Send one request and return the model's raw reply text.
    async fn complete(&self, prompt: &Prompt) -> Result<String>;
}

/// Fail fast on requests this provider cannot serve as configured.
pub fn check_capabilities(provider: &dyn CompletionProvider, prompt: &Prompt) -> Result<()> {
    if provider.requires_credential() && !provider.has_credential() {
        return Err(GenerationError::MissingCredential {
            provider: provider.name().to_string(),
        });
    }
    if prompt.image.is_some() && !provider.supports_vision() {
        return Err(GenerationError::VisionUnsupported {
            provider: provider.name().to_string(),
            model: provider.model().to_string(),
        });
    }
    Ok(())
}

/// POST a JSON body once and decode the JSON reply.
///
/// `prepare` attaches provider-specific auth headers.
pub(crate) async fn post_json(
    client: &Client,
    provider: &str,
    url: &str,
    body: &Value,
    timeout: Duration,
    prepare: impl FnOnce(RequestBuilder) -> RequestBuilder,
) -> Result<Value> {
    debug!(provider, url, "sending completion request");

    let request = prepare(client.post(url).timeout(timeout).json(body));
    let resp = request.send().await.map_err(|e| {
        if e.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::Network {
                context: format!("Cannot connect to {} at {}", provider, url),
                source: e,
            }
        }
    })?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        warn!(provider, status, "provider returned an error status");
        return Err(GenerationError::Http { status, body: text });
    }

    resp.json().await.map_err(|e| {
        if e.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::InvalidResponse(e.to_string())
        }
    })
}

fn normalize(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::EncodedImage;

    fn text_prompt() -> Prompt {
        Prompt {
            text: "hi".into(),
            image: None,
        }
    }

    fn image_prompt() -> Prompt {
        Prompt {
            text: "hi".into(),
            image: Some(EncodedImage {
                mime_type: "image/png".into(),
                data: "AAAA".into(),
            }),
        }
    }

    #[test]
    fn missing_key_is_rejected() {
        let provider = OpenAiProvider::new(Client::new(), OpenAiConfig::default());
        let err = check_capabilities(&provider, &text_prompt()).unwrap_err();
        assert!(matches!(err, GenerationError::MissingCredential { .. }));
    }

    #[test]
    fn ollama_needs_no_key() {
        let provider = OllamaProvider::new(Client::new(), OllamaConfig::default());
        assert!(check_capabilities(&provider, &text_prompt()).is_ok());
    }

    #[test]
    fn image_without_vision_is_rejected() {
        let config = OllamaConfig::with_model("llama3").vision(false);
        let provider = OllamaProvider::new(Client::new(), config);
        let err = check_capabilities(&provider, &image_prompt()).unwrap_err();
        match err {
            GenerationError::VisionUnsupported { model, .. } => assert_eq!(model, "llama3"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn normalize_strips_trailing_slashes() {
        assert_eq!(normalize("http://x/".into()), "http://x");
        assert_eq!(normalize("http://x".into()), "http://x");
    }
}
