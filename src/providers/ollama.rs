use super::{check_capabilities, normalize, post_json, CompletionProvider};
use crate::error::{GenerationError, Result};
use crate::prompt::Prompt;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Configuration for a local or remote Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Ollama API endpoint (e.g., "http://localhost:11434")
    pub endpoint: String,
    /// Model name (e.g., "llava", "llama3.2-vision")
    pub model: String,
    /// Request timeout (default: 120s)
    pub timeout: Duration,
    pub options: GenerateOptions,
    /// Whether the model accepts images (default: true)
    pub vision: bool,
}

/// Ollama generation options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            num_predict: 512,
            temperature: Some(1.0),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llava".to_string(),
            timeout: Duration::from_secs(120),
            options: GenerateOptions::default(),
            vision: true,
        }
    }
}

impl OllamaConfig {
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = normalize(endpoint.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn vision(mut self, enabled: bool) -> Self {
        self.vision = enabled;
        self
    }
}

/// Ollama `/api/generate` adapter.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    http: Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    pub fn new(http: Client, config: OllamaConfig) -> Self {
        Self { http, config }
    }

    pub fn request_body(&self, prompt: &Prompt) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "prompt": prompt.text,
            "stream": false,
            "format": "json",
            "options": self.config.options,
        });

        if let Some(image) = &prompt.image {
            body["images"] = json!([image.data]);
        }

        body
    }

    pub fn extract_text(response: &Value) -> Option<String> {
        response
            .get("response")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    fn name(&self) -> &str {
        "Ollama"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn supports_vision(&self) -> bool {
        self.config.vision
    }

    fn requires_credential(&self) -> bool {
        false
    }

    fn has_credential(&self) -> bool {
        false
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        check_capabilities(self, prompt)?;

        let url = format!("{}/api/generate", self.config.endpoint);
        let json = post_json(
            &self.http,
            self.name(),
            &url,
            &self.request_body(prompt),
            self.config.timeout,
            |req| req,
        )
        .await?;

        Self::extract_text(&json)
            .ok_or_else(|| GenerationError::InvalidResponse("missing response field".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::EncodedImage;

    #[test]
    fn body_without_image() {
        let provider = OllamaProvider::new(Client::new(), OllamaConfig::default());
        let body = provider.request_body(&Prompt {
            text: "go".into(),
            image: None,
        });
        assert_eq!(body["model"], "llava");
        assert_eq!(body["stream"], false);
        assert_eq!(body["format"], "json");
        assert_eq!(body["options"]["num_predict"], 512);
        assert!(body.get("images").is_none());
    }

    #[test]
    fn body_with_raw_base64_image() {
        let provider = OllamaProvider::new(Client::new(), OllamaConfig::default());
        let body = provider.request_body(&Prompt {
            text: "go".into(),
            image: Some(EncodedImage {
                mime_type: "image/png".into(),
                data: "QUJD".into(),
            }),
        });
        assert_eq!(body["images"][0], "QUJD");
    }

    #[test]
    fn extracts_response_field() {
        let text = OllamaProvider::extract_text(&json!({ "response": "hi", "done": true }));
        assert_eq!(text.as_deref(), Some("hi"));
        assert!(OllamaProvider::extract_text(&json!({ "done": true })).is_none());
    }

    #[test]
    fn endpoint_is_normalized() {
        let config = OllamaConfig::default().endpoint("http://gpu-box:11434/");
        assert_eq!(config.endpoint, "http://gpu-box:11434");
    }
}
