use crate::types::{GenerationRequest, ImageInput};
use base64::Engine;
use rand::Rng;

/// A prompt ready for a provider: text plus an optional encoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub image: Option<EncodedImage>,
}

/// Base64-encoded image bytes with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

impl EncodedImage {
    pub fn encode(image: &ImageInput) -> Self {
        Self {
            mime_type: image.mime_type.clone(),
            data: base64::engine::general_purpose::STANDARD.encode(&image.bytes),
        }
    }

    /// `data:` URL form used by chat-completion style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// The request's own variety seed, or a fresh one drawn from `rng`.
pub fn resolve_seed<R: Rng + ?Sized>(request: &GenerationRequest, rng: &mut R) -> String {
    match request.variety_seed.as_deref() {
        Some(seed) if !seed.trim().is_empty() => seed.to_string(),
        _ => rng.random::<u64>().to_string(),
    }
}

/// Assemble the prompt for one attempt.
///
/// Optional fields are interpolated only when non-blank. The model is always
/// told to answer with a bare `{"caption", "hashtags"}` object.
pub fn build_prompt(request: &GenerationRequest, seed: &str) -> Prompt {
    let mut lines = Vec::new();

    match &request.image {
        Some(_) => lines.push(
            "Write a COMPLETELY UNIQUE and CREATIVE Instagram caption for the attached image."
                .to_string(),
        ),
        None => lines.push("Generate a COMPLETELY UNIQUE and CREATIVE Instagram caption".to_string()),
    }
    if let Some(description) = non_blank(&request.description) {
        lines.push(format!("about: {}", description));
    }
    if let Some(niche) = non_blank(&request.niche) {
        lines.push(format!("in the {} niche", niche));
    }
    if let Some(keywords) = non_blank(&request.keywords) {
        lines.push(format!(
            "incorporating these keywords if possible: {}",
            keywords
        ));
    }

    lines.push(String::new());
    lines.push("IMPORTANT REQUIREMENTS:".to_string());
    lines.push(format!(
        "- Make this caption (#{}) COMPLETELY DIFFERENT from previous ones",
        request.attempt
    ));
    lines.push("- Use fresh, original language and structure".to_string());
    lines.push("- Avoid clichés and common social media phrases".to_string());
    lines.push("- Make it engaging and authentic".to_string());
    lines.push(format!(
        "- Include exactly {} relevant and trending hashtags",
        request.hashtag_count
    ));
    lines.push(String::new());
    lines.push(format!("Random seed for variety: {}", seed));
    lines.push(String::new());
    lines.push("Respond with ONLY a JSON object in this format, no other text:".to_string());
    lines.push(r##"{"caption": "your unique caption here", "hashtags": ["#hashtag1", "#hashtag2"]}"##.to_string());

    Prompt {
        text: lines.join("\n"),
        image: request.image.as_ref().map(EncodedImage::encode),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
