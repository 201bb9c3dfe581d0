//! Deterministic offline captions drawn from a fixed local corpus.

use crate::types::{GenerationRequest, GenerationResult};

/// Caption templates, rotated by attempt ordinal.
pub const CAPTIONS: &[&str] = &[
    "Chasing moments that feel like sunshine on a quiet morning.",
    "Some days are for plans. Today was for wandering.",
    "Proof that the little things are really the big things.",
    "Collecting stories, not things.",
    "Here's to slow coffee, good light, and zero rush.",
    "Not every chapter needs a caption, but this one deserved one.",
    "Made with a little patience and a lot of heart.",
    "Finding magic in the ordinary, one frame at a time.",
];

/// Sentences that splice one user keyword onto a caption.
pub const KEYWORD_TEMPLATES: &[&str] = &[
    "All about that {keyword} energy.",
    "Bringing a little more {keyword} into the feed.",
    "Currently obsessed with {keyword}.",
];

/// Hashtag corpus as bare words; the `#` is added on output.
pub const HASHTAGS: &[&str] = &[
    "instagood",
    "photooftheday",
    "love",
    "beautiful",
    "happy",
    "picoftheday",
    "instadaily",
    "lifestyle",
    "inspiration",
    "nature",
    "travel",
    "motivation",
    "style",
    "goodvibes",
    "explore",
    "creative",
    "weekend",
    "aesthetic",
    "mood",
    "dailyinspo",
    "smile",
    "vibes",
    "moments",
    "memories",
];

/// Immutable caption and hashtag data used for fallback synthesis.
#[derive(Debug, Clone, Copy)]
pub struct LocalCorpus {
    pub captions: &'static [&'static str],
    pub keyword_templates: &'static [&'static str],
    pub hashtags: &'static [&'static str],
}

impl Default for LocalCorpus {
    fn default() -> Self {
        Self {
            captions: CAPTIONS,
            keyword_templates: KEYWORD_TEMPLATES,
            hashtags: HASHTAGS,
        }
    }
}

impl LocalCorpus {
    /// Build a fallback result for `request`, annotated with `reason`.
    ///
    /// Identical `(attempt, variety_seed, keywords, hashtag_count)` always
    /// yield an identical result.
    pub fn synthesize(&self, request: &GenerationRequest, reason: &str) -> GenerationResult {
        GenerationResult {
            caption: self.caption_for(request),
            hashtags: self.hashtags_for(request),
            was_fallback: true,
            error_note: Some(reason.to_string()),
        }
    }

    /// Template chosen by `attempt % len`, with an optional keyword splice.
    pub fn caption_for(&self, request: &GenerationRequest) -> String {
        let attempt = request.attempt as usize;
        let mut caption = pick(self.captions, attempt).unwrap_or_default().to_string();

        let keywords = request.keyword_list();
        if let (Some(keyword), Some(template)) =
            (pick(&keywords, attempt), pick(self.keyword_templates, attempt))
        {
            caption.push(' ');
            caption.push_str(&template.replace("{keyword}", keyword));
        }

        caption
    }

    /// The first `hashtag_count` corpus tags under the seeded ordering.
    pub fn hashtags_for(&self, request: &GenerationRequest) -> Vec<String> {
        let seed = match request.variety_seed.as_deref() {
            Some(seed) if !seed.is_empty() => seed_value(seed),
            _ => seed_value(&request.attempt.to_string()),
        };

        let mut ordered: Vec<&str> = self.hashtags.to_vec();
        ordered.sort_by_key(|tag| ordering_key(tag, seed));
        ordered
            .into_iter()
            .take(request.hashtag_count)
            .map(|tag| format!("#{}", tag))
            .collect()
    }
}

/// Sum of the seed's character code points.
pub fn seed_value(seed: &str) -> u64 {
    seed.chars().map(|c| c as u64).sum()
}

fn ordering_key(tag: &str, seed: u64) -> u64 {
    let first = tag.chars().next().map(|c| c as u64).unwrap_or(0);
    first.wrapping_mul(seed) % 100
}

fn pick<'a, T: ?Sized>(items: &'a [&'a T], ordinal: usize) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        Some(items[ordinal % items.len()])
    }
}
