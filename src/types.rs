use crate::error::{GenerationError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An uploaded image plus its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Read an image from disk, inferring the MIME type from its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| GenerationError::ImageRead(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(bytes, mime_for_path(path)))
    }
}

fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Whether a request describes a post in words or by an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Text,
    Image,
}

/// Everything the user supplied for one generation click.
///
/// Built fresh per attempt and discarded after it resolves. The attempt
/// ordinal is owned by the caller and should grow by one per click.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub description: Option<String>,
    pub niche: Option<String>,
    /// Comma-separated keywords.
    pub keywords: Option<String>,
    pub hashtag_count: usize,
    pub image: Option<ImageInput>,
    /// Variety seed. When absent a random one is drawn per attempt.
    pub variety_seed: Option<String>,
    /// 1-based attempt counter.
    pub attempt: u32,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            description: None,
            niche: None,
            keywords: None,
            hashtag_count: 10,
            image: None,
            variety_seed: None,
            attempt: 1,
        }
    }
}

impl GenerationRequest {
    /// A text-mode request for a described post in a niche.
    pub fn text(description: impl Into<String>, niche: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            niche: Some(niche.into()),
            ..Default::default()
        }
    }

    /// An image-mode request.
    pub fn image(image: ImageInput) -> Self {
        Self {
            image: Some(image),
            ..Default::default()
        }
    }

    pub fn keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    pub fn niche(mut self, niche: impl Into<String>) -> Self {
        self.niche = Some(niche.into());
        self
    }

    /// Set how many hashtags to ask for (clamped to at least 1).
    pub fn hashtag_count(mut self, count: usize) -> Self {
        self.hashtag_count = count.max(1);
        self
    }

    pub fn variety_seed(mut self, seed: impl Into<String>) -> Self {
        self.variety_seed = Some(seed.into());
        self
    }

    /// Set the attempt ordinal (clamped to at least 1).
    pub fn attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt.max(1);
        self
    }

    pub fn mode(&self) -> GenerationMode {
        if self.image.is_some() {
            GenerationMode::Image
        } else {
            GenerationMode::Text
        }
    }

    /// Keywords split on commas, trimmed, blanks removed.
    pub fn keyword_list(&self) -> Vec<&str> {
        self.keywords
            .as_deref()
            .map(|k| {
                k.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A displayable caption and hashtag set.
///
/// Always renderable: when the remote model was unusable the content comes
/// from the local corpus and `was_fallback` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub caption: String,
    pub hashtags: Vec<String>,
    pub was_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_note: Option<String>,
}

impl GenerationResult {
    /// Hashtags joined by single spaces, ready to paste.
    pub fn hashtag_line(&self) -> String {
        self.hashtags.join(" ")
    }

    /// Caption and hashtags separated by a blank line.
    pub fn clipboard_text(&self) -> String {
        if self.hashtags.is_empty() {
            return self.caption.clone();
        }
        format!("{}\n\n{}", self.caption, self.hashtag_line())
    }

    /// True when the UI should show an advisory next to the result.
    pub fn needs_advisory(&self) -> bool {
        self.was_fallback || self.error_note.is_some()
    }
}
