//! Turns a provider outcome into a displayable [`GenerationResult`].
//!
//! Nothing here fails: transport errors and unusable replies are replaced
//! by fallback synthesis from the [`LocalCorpus`].

use crate::error::GenerationError;
use crate::fallback::LocalCorpus;
use crate::parser::{self, ParseStrategy};
use crate::types::{GenerationRequest, GenerationResult};
use tracing::{debug, warn};

const OFFLINE_SUFFIX: &str = "Showing an offline suggestion instead.";

/// Note attached when the reply had to be shown as plain text.
pub const UNEXPECTED_FORMAT_NOTE: &str =
    "The AI generated a response, but it wasn't in the expected format.";

/// Resolves provider outcomes against a fixed corpus.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseResolver {
    corpus: LocalCorpus,
}

impl ResponseResolver {
    pub fn new(corpus: LocalCorpus) -> Self {
        Self { corpus }
    }

    pub fn corpus(&self) -> &LocalCorpus {
        &self.corpus
    }

    /// Resolve either a raw reply or the error that replaced it.
    pub fn resolve(
        &self,
        outcome: Result<String, GenerationError>,
        request: &GenerationRequest,
    ) -> GenerationResult {
        match outcome {
            Ok(raw) => self.resolve_text(&raw, request),
            Err(err) => {
                warn!(error = %err, attempt = request.attempt, "completion failed, using fallback");
                self.corpus.synthesize(request, &failure_note(&err))
            }
        }
    }

    /// Parse a raw reply, falling back only when nothing can be salvaged.
    pub fn resolve_text(&self, raw: &str, request: &GenerationRequest) -> GenerationResult {
        let Some(parsed) = parser::parse_response(raw) else {
            warn!(attempt = request.attempt, "model returned an empty reply");
            let note = format!("The AI returned an empty response. {}", OFFLINE_SUFFIX);
            return self.corpus.synthesize(request, &note);
        };

        debug!(strategy = ?parsed.strategy, "parsed model reply");

        let mut hashtags = parsed.hashtags;
        hashtags.truncate(request.hashtag_count);

        let error_note = match parsed.strategy {
            ParseStrategy::RawText => Some(UNEXPECTED_FORMAT_NOTE.to_string()),
            ParseStrategy::Json | ParseStrategy::KeyPattern => None,
        };

        GenerationResult {
            caption: parsed.caption,
            hashtags,
            was_fallback: false,
            error_note,
        }
    }
}

/// Human-readable reason for a failed completion.
pub fn failure_note(err: &GenerationError) -> String {
    let reason = match err {
        GenerationError::Http { status: 401, .. } | GenerationError::Http { status: 403, .. } => {
            "Invalid API key. Please check your API key and try again.".to_string()
        }
        GenerationError::Http { status: 429, .. } => {
            "The AI service is rate limiting requests (HTTP 429).".to_string()
        }
        GenerationError::Http { status, .. } => {
            format!("API error: {}. Please check your API key.", status)
        }
        GenerationError::Timeout => "The AI service timed out.".to_string(),
        GenerationError::Network { .. } => "The AI service is unavailable.".to_string(),
        GenerationError::InvalidResponse(_) => {
            "The AI service returned an unreadable response.".to_string()
        }
        other => other.to_string(),
    };
    format!("{} {}", reason, OFFLINE_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest::text("beach", "travel")
            .hashtag_count(5)
            .variety_seed("s1")
            .attempt(1)
    }

    #[test]
    fn parsed_json_is_not_fallback() {
        let result = ResponseResolver::default().resolve(
            Ok(r##"{"caption":"Hello","hashtags":["#a","#b"]}"##.to_string()),
            &request(),
        );
        assert_eq!(result.caption, "Hello");
        assert_eq!(result.hashtags, vec!["#a", "#b"]);
        assert!(!result.was_fallback);
        assert!(result.error_note.is_none());
    }

    #[test]
    fn parsed_hashtags_are_truncated() {
        let raw = r##"{"caption":"c","hashtags":["1","2","3","4","5","6","7"]}"##;
        let result = ResponseResolver::default().resolve_text(raw, &request());
        assert_eq!(result.hashtags.len(), 5);
    }

    #[test]
    fn raw_text_is_annotated() {
        let result = ResponseResolver::default().resolve_text("Nice day out", &request());
        assert_eq!(result.caption, "Nice day out");
        assert!(!result.was_fallback);
        assert_eq!(result.error_note.as_deref(), Some(UNEXPECTED_FORMAT_NOTE));
    }

    #[test]
    fn empty_reply_falls_back() {
        let result = ResponseResolver::default().resolve(Ok("  ".into()), &request());
        assert!(result.was_fallback);
        assert!(!result.caption.is_empty());
        assert!(result.error_note.unwrap().contains("empty response"));
    }

    #[test]
    fn unauthorized_mentions_invalid_key() {
        let err = GenerationError::Http {
            status: 401,
            body: "{}".into(),
        };
        let result = ResponseResolver::default().resolve(Err(err), &request());
        assert!(result.was_fallback);
        assert!(result.error_note.unwrap().contains("Invalid API key"));
        assert!(result.hashtags.len() <= 5);
    }

    #[test]
    fn failure_notes_per_error() {
        assert!(failure_note(&GenerationError::Timeout).contains("timed out"));
        assert!(failure_note(&GenerationError::Http {
            status: 503,
            body: String::new()
        })
        .contains("API error: 503"));
        assert!(failure_note(&GenerationError::Http {
            status: 429,
            body: String::new()
        })
        .contains("rate limiting"));
        assert!(failure_note(&GenerationError::InvalidResponse("x".into()))
            .ends_with(OFFLINE_SUFFIX));
    }
}
