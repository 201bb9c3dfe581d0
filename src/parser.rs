//! Tolerant extraction of a caption and hashtags from model output.
//!
//! Strategies run in order and the first one that yields a caption wins:
//! 1. JSON object: the span from the first `{` to the last `}`
//! 2. Key patterns: `caption: ...` and `hashtags: [...]` located by regex
//! 3. Raw text: the whole (think-stripped) reply becomes the caption
//!
//! Only an empty reply produces no result at all.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Caption used when a JSON reply has no usable `caption` field.
pub const MISSING_CAPTION: &str = "Failed to generate caption";

static CAPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)["']?\bcaption\b["']?\s*[:=]\s*(.*?)\s*(?:,?\s*["']?\bhashtags\b["']?\s*[:=]|\}|\z)"#,
    )
    .expect("caption pattern is valid")
});

static QUOTED_CAPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)["']caption["']\s*:\s*(.*?)\s*(?:,?\s*["']?\bhashtags\b["']?\s*[:=]|\}|\z)"#,
    )
    .expect("quoted caption pattern is valid")
});

static BRACKETED_HASHTAGS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)["']?\bhashtags\b["']?\s*[:=]\s*\[(.*?)(?:\]|\z)"#)
        .expect("bracketed hashtag pattern is valid")
});

static FREEFORM_HASHTAGS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)["']?\bhashtags\b["']?\s*[:=]\s*(.*)"#)
        .expect("freeform hashtag pattern is valid")
});

/// Which strategy produced a [`ParsedResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    Json,
    KeyPattern,
    RawText,
}

/// A caption plus normalised hashtags, each starting with `#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub caption: String,
    pub hashtags: Vec<String>,
    pub strategy: ParseStrategy,
}

/// Run the strategy chain over a raw model reply.
///
/// Returns `None` only when the reply is empty once `<think>` blocks are
/// removed.
pub fn parse_response(raw: &str) -> Option<ParsedResponse> {
    let cleaned = strip_think_tags(raw);
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return None;
    }

    parse_json_object(cleaned)
        .or_else(|| parse_key_patterns(cleaned))
        .or_else(|| Some(raw_text(cleaned)))
}

/// Remove reasoning blocks (`<think>` up to its matching `</think>`).
///
/// Text after a `<think>` that is never closed is dropped.
pub fn strip_think_tags(text: &str) -> String {
    const OPEN: &str = "<think>";
    const CLOSE: &str = "</think>";

    let mut kept = String::with_capacity(text.len());
    let mut rest = text;
    while let Some((before, inside)) = rest.split_once(OPEN) {
        kept.push_str(before);
        match inside.split_once(CLOSE) {
            Some((_, after)) => rest = after,
            None => return kept,
        }
    }
    kept.push_str(rest);
    kept
}

/// Normalise one hashtag token: trim, drop quotes and brackets, add `#`.
pub fn normalize_hashtag(token: &str) -> Option<String> {
    let bare = token
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '[' | ']' | '{' | '}' | ','))
        .trim()
        .trim_start_matches('#');

    if bare.is_empty() {
        None
    } else {
        Some(format!("#{}", bare))
    }
}

fn parse_json_object(text: &str) -> Option<ParsedResponse> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    let value: Value = serde_json::from_str(&text[start..=end]).ok()?;
    let object = value.as_object()?;

    let caption = object
        .get("caption")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(MISSING_CAPTION)
        .to_string();

    let hashtags = object
        .get("hashtags")
        .and_then(Value::as_array)
        .map(|arr| {
            dedup(
                arr.iter()
                    .filter_map(Value::as_str)
                    .filter_map(normalize_hashtag),
            )
        })
        .unwrap_or_default();

    Some(ParsedResponse {
        caption,
        hashtags,
        strategy: ParseStrategy::Json,
    })
}

fn parse_key_patterns(text: &str) -> Option<ParsedResponse> {
    let caption = extract_caption(text)?;
    Some(ParsedResponse {
        caption,
        hashtags: extract_hashtags(text),
        strategy: ParseStrategy::KeyPattern,
    })
}

fn raw_text(text: &str) -> ParsedResponse {
    ParsedResponse {
        caption: text.to_string(),
        hashtags: extract_hashtags(text),
        strategy: ParseStrategy::RawText,
    }
}

fn extract_caption(text: &str) -> Option<String> {
    // A quoted `"caption"` key wins over the bare word, which may be prose
    // ahead of an embedded object.
    let captured = [&*QUOTED_CAPTION_RE, &*CAPTION_RE]
        .into_iter()
        .filter_map(|re| re.captures(text)?.get(1))
        .map(|m| m.as_str())
        .find(|value| !value.trim_start().starts_with('{'))?;
    let caption = captured
        .trim()
        .trim_end_matches(',')
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim()
        .replace("\\n", "\n")
        .replace("\\\"", "\"");

    if caption.is_empty() {
        None
    } else {
        Some(caption)
    }
}

fn extract_hashtags(text: &str) -> Vec<String> {
    if let Some(list) = BRACKETED_HASHTAGS_RE
        .captures(text)
        .and_then(|c| c.get(1))
    {
        return dedup(list.as_str().split(',').filter_map(normalize_hashtag));
    }

    let Some(run) = FREEFORM_HASHTAGS_RE.captures(text).and_then(|c| c.get(1)) else {
        return Vec::new();
    };
    let mut run = run.as_str();
    // A caption key after the hashtags ends the run.
    if let Some(pos) = run.to_ascii_lowercase().find("caption") {
        run = &run[..pos];
    }
    // So does a line break; anything after it is commentary.
    if let Some(pos) = run.find('\n') {
        run = &run[..pos];
    }

    dedup(
        run.split(|c: char| c.is_whitespace() || c == ',')
            .filter_map(normalize_hashtag),
    )
}

fn dedup(tags: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.filter(|t| seen.insert(t.clone())).collect()
}
