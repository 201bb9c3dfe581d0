use super::{check_capabilities, normalize, post_json, CompletionProvider};
use crate::error::{GenerationError, Result};
use crate::prompt::Prompt;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Configuration for the OpenAI chat-completions API.
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API base (e.g., "https://api.openai.com")
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Model name (default: "gpt-4o-mini")
    pub model: String,
    /// Request timeout (default: 60s)
    pub timeout: Duration,
    /// Sampling temperature (default: 1.2)
    pub temperature: f32,
    pub max_tokens: u32,
    /// Whether the model accepts image parts (default: true)
    pub vision: bool,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("vision", &self.vision)
            .finish()
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(60),
            temperature: 1.2,
            max_tokens: 1000,
            vision: true,
        }
    }
}

impl OpenAiConfig {
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

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn vision(mut self, enabled: bool) -> Self {
        self.vision = enabled;
        self
    }
}

/// OpenAI `/v1/chat/completions` adapter.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn new(http: Client, config: OpenAiConfig) -> Self {
        Self { http, config }
    }

    /// Chat-completions body. Images become a multi-part user message.
    pub fn request_body(&self, prompt: &Prompt) -> Value {
        let content = match &prompt.image {
            Some(image) => json!([
                { "type": "text", "text": prompt.text },
                { "type": "image_url", "image_url": { "url": image.data_url() } },
            ]),
            None => json!(prompt.text),
        };

        json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": content }],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        })
    }

    /// `choices[0].message.content`
    pub fn extract_text(response: &Value) -> Option<String> {
        response
            .get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?
            .as_str()
            .map(str::to_string)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "OpenAI"
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

        let url = format!("{}/v1/chat/completions", self.config.endpoint);
        let json = post_json(
            &self.http,
            self.name(),
            &url,
            &self.request_body(prompt),
            self.config.timeout,
            |req| req.bearer_auth(key.trim()),
        )
        .await?;

        Self::extract_text(&json).ok_or_else(|| {
            GenerationError::InvalidResponse("missing choices[0].message.content".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::EncodedImage;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(Client::new(), OpenAiConfig::default().api_key("sk-test"))
    }

    #[test]
    fn text_body_shape() {
        let prompt = Prompt {
            text: "write".into(),
            image: None,
        };
        let body = provider().request_body(&prompt);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "write");
        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn image_body_is_multipart() {
        let prompt = Prompt {
            text: "write".into(),
            image: Some(EncodedImage {
                mime_type: "image/jpeg".into(),
                data: "QUJD".into(),
            }),
        };
        let body = provider().request_body(&prompt);
        let parts = body["messages"][0]["content"].as_array().unwrap();
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/jpeg;base64,QUJD");
    }

    #[test]
    fn extracts_message_content() {
        let response = json!({
            "choices": [{ "message": { "role": "assistant", "content": "{\"caption\":\"x\"}" } }]
        });
        assert_eq!(
            OpenAiProvider::extract_text(&response).as_deref(),
            Some("{\"caption\":\"x\"}")
        );
        assert!(OpenAiProvider::extract_text(&json!({ "choices": [] })).is_none());
    }

    #[test]
    fn blank_key_is_not_a_credential() {
        let p = OpenAiProvider::new(Client::new(), OpenAiConfig::default().api_key("  "));
        assert!(!p.has_credential());
        assert!(provider().has_credential());
    }

    #[test]
    fn debug_redacts_key() {
        let rendered = format!("{:?}", OpenAiConfig::default().api_key("sk-secret"));
        assert!(!rendered.contains("sk-secret"));
    }
}
