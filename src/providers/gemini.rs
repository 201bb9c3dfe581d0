use super::{check_capabilities, normalize, post_json, CompletionProvider};
use crate::error::{GenerationError, Result};
use crate::prompt::Prompt;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Configuration for the Gemini `generateContent` API.
#[derive(Clone)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Model name (default: "gemini-1.5-flash")
    pub model: String,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub vision: bool,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("vision", &self.vision)
            .finish_non_exhaustive()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            timeout: Duration::from_secs(60),
            temperature: 1.0,
            max_output_tokens: 1000,
            vision: true,
        }
    }
}

impl GeminiConfig {
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = normalize(endpoint.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    pub fn vision(mut self, enabled: bool) -> Self {
        self.vision = enabled;
        self
    }
}

/// Gemini `models/{model}:generateContent` adapter.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    http: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn new(http: Client, config: GeminiConfig) -> Self {
        Self { http, config }
    }

    pub fn request_body(&self, prompt: &Prompt) -> Value {
        let mut parts = vec![json!({ "text": prompt.text })];
        if let Some(image) = &prompt.image {
            parts.push(json!({
                "inline_data": { "mime_type": image.mime_type, "data": image.data }
            }));
        }

        json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_output_tokens,
            },
        })
    }

    /// Concatenated text parts of the first candidate.
    pub fn extract_text(response: &Value) -> Option<String> {
        let parts = response
            .get("candidates")?
            .get(0)?
            .get("content")?
            .get("parts")?
            .as_array()?;

        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn supports_vision(&self) -> bool {
        self.config.vision
    }

    fn has_credential(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        check_capabilities(self, prompt)?;
        let key = self.config.api_key.clone().unwrap_or_default();

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint, self.config.model
        );
        let json = post_json(
            &self.http,
            self.name(),
            &url,
            &self.request_body(prompt),
            self.config.timeout,
            |req| req.header("x-goog-api-key", key.trim()),
        )
        .await?;

        Self::extract_text(&json).ok_or_else(|| {
            GenerationError::InvalidResponse("missing candidates[0].content.parts text".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::EncodedImage;

    #[test]
    fn body_carries_inline_image() {
        let provider = GeminiProvider::new(Client::new(), GeminiConfig::default());
        let body = provider.request_body(&Prompt {
            text: "go".into(),
            image: Some(EncodedImage {
                mime_type: "image/webp".into(),
                data: "QUJD".into(),
            }),
        });
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts[0]["text"], "go");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/webp");
        assert_eq!(parts[1]["inline_data"]["data"], "QUJD");
    }

    #[test]
    fn generation_config_follows_setters() {
        let config = GeminiConfig::default().temperature(0.5).max_output_tokens(256);
        let provider = GeminiProvider::new(Client::new(), config);
        let body = provider.request_body(&Prompt {
            text: "go".into(),
            image: None,
        });
        assert_eq!(body["generationConfig"]["temperature"], 0.5);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn extracts_candidate_text() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"caption\":" }, { "text": "\"x\"}" }] } }]
        });
        assert_eq!(
            GeminiProvider::extract_text(&response).as_deref(),
            Some("{\"caption\":\"x\"}")
        );
        assert!(GeminiProvider::extract_text(&json!({ "candidates": [] })).is_none());
    }
}
